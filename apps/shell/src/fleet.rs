//! Models of the demo fleet.

use amodel::prelude::*;

#[active_model]
pub struct Wheel {
    #[field(fillable)]
    size: i64,
}

#[active_model]
pub struct Car {
    #[field(fillable, attribute = "Ivan")]
    driver: String,
    #[field(fillable, required)]
    chassis: String,
    #[field(fillable, protected, hidden)]
    vin: String,
    #[field(fillable, validator = non_negative)]
    mileage: i64,
    #[field(fillable, factory = Wheel, factory_default = Vec::<Value>::new)]
    wheels: Vec<Wheel>,
}

fn non_negative(_: &Model, prop: &str, value: &Value) -> Result<(), ModelError> {
    match value.as_f64() {
        Some(n) if n < 0.0 => Err(ModelError::validation(prop.to_owned(), "must not be negative")),
        _ => Ok(()),
    }
}
