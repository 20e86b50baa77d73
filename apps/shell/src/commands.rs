use crate::fleet::{Car, Wheel};
use amodel::prelude::*;
use amodel::current_config;
use anyhow::{Context, Result, bail};
use serde_json::json;
use tracing::{info, warn};

pub fn demo() -> Result<()> {
    let car = Car::create(json!({
        "chassis": "Porsche",
        "vin": "WP0ZZZ99ZTS392124",
        "wheels": [{ "size": 18 }, null, { "size": 18 }],
    }))?;
    println!("created:   {}", car.to_json_string()?);
    println!("vin:       {}", car.vin().unwrap_or_default());

    if let Err(err) = car.delete("vin") {
        println!("delete:    {err}");
    }
    if let Err(err) = car.set_mileage(-100) {
        println!("mileage:   {err}");
    }

    let spare = Wheel::create(json!({ "size": 16 }))?;
    let mut wheels: Vec<Value> = car.wheels().unwrap_or_default().into_iter().map(Value::from).collect();
    wheels.push(spare.into());
    car.set_wheels(wheels)?;
    println!("wheels:    {}", car.wheels().map_or(0, |w| w.len()));

    let copy = car.deep_clone();
    copy.set("driver", "Petr")?;
    println!("clone:     {}", copy.to_json_string()?);
    println!("original:  {}", car.to_json_string()?);
    Ok(())
}

pub async fn create(data: &str, update: Option<&str>) -> Result<()> {
    let input: serde_json::Value = serde_json::from_str(data).context("Invalid JSON input")?;
    let changes = update
        .map(|raw| serde_json::from_str::<serde_json::Value>(raw).context("Invalid JSON update"))
        .transpose()?;

    let items = match input {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(_) => vec![input],
        other => bail!("Expected a JSON object or array, got `{other}`"),
    };

    let cars = Car::class().async_create_from_collection(std::future::ready(items)).await?;
    info!(count = cars.len(), "Cars created");

    for car in cars {
        if let Some(changes) = &changes {
            car.start_tracking();
            car.fill(changes.clone())?;
        }
        match car.is_touched() {
            Some(touched) => println!("{} touched={touched}", car.to_json_string()?),
            None => println!("{}", car.to_json_string()?),
        }
    }
    Ok(())
}

pub fn config() -> Result<()> {
    let config = current_config();
    if config.tracking.enabled {
        warn!("Tracking is enabled for every model");
    }
    println!("{}", serde_json::to_string_pretty(&*config)?);
    Ok(())
}
