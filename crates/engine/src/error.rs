use std::borrow::Cow;

/// Errors raised by the model engine.
///
/// A write rejected by the fillable or readonly policy is not an error: it is
/// reported as `Ok(false)` by the accessor.
#[amodel_derive::model_error]
pub enum ModelError {
    /// A validator refused the value; the write was aborted before any side effect.
    #[error("Validation failed for `{field}`{}: {message}", format_context(.context))]
    Validation {
        field: Cow<'static, str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// Attempted deletion of a protected field.
    #[error("Property `{field}` is protected{}", format_context(.context))]
    ProtectedField { field: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A required field holds no value once construction finished.
    #[error("Property `{field}` is required{}", format_context(.context))]
    RequiredField { field: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A factory-bound field references a class that is not registered.
    #[error("Factory model is missing{}: {message}", format_context(.context))]
    MissingFactoryModel { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A factory-bound field references something that cannot be a model class.
    #[error("Invalid factory model{}: {message}", format_context(.context))]
    InvalidFactoryModel { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No mapping is registered for the requested target.
    #[error("Mapping not found{}: {message}", format_context(.context))]
    MissingMapping { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// JSON encoding or decoding failed.
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// Internal logic errors.
    #[error("Internal model error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ModelError {
    /// Builds a [`ModelError::Validation`] for `field`.
    pub fn validation(
        field: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::Validation { field: field.into(), message: message.into(), context: None }
    }

    /// Returns `true` for validator rejections.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
