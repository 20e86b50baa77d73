use std::borrow::Cow;

#[amodel_derive::model_error]
#[derive(Debug)]
pub enum OnlyInternal {
    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err = OnlyInternal::from(String::from("lost"));
    assert_eq!(err.to_string(), "Internal error: lost");
}
