use amodel_derive::model_error;
use std::borrow::Cow;

#[model_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Rejected {field}{}", format_context(.context))]
    Rejected { field: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), DemoError> {
    Err::<(), _>(std::io::Error::other("disk")).context("reading model snapshot")?;
    Ok(())
}

fn main() {
    let err = read().unwrap_err();
    assert_eq!(err.to_string(), "IO error (reading model snapshot): disk");

    let rejected: Result<(), DemoError> =
        Err(DemoError::Rejected { field: "age".into(), context: None });
    let err = rejected.context("fill").unwrap_err();
    assert_eq!(err.to_string(), "Rejected age (fill)");

    let internal: DemoError = "boom".into();
    assert!(matches!(internal, DemoError::Internal { .. }));
}
