#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the active model engine.
//!
//! * [`model_error`] turns an enum into a `thiserror` error with context support.
//! * [`active_model`] declares a model class from a struct, as sugar over the
//!   engine's registration calls.
//!
//! ## Usage
//! Consumers normally go through the `amodel` facade, which re-exports both macros.
//! The examples are `ignore`d here because they need the facade crate to compile.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// Attribute macro for defining error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `...Ext` trait adding `.context()`
///   to `Result`s of this error and of every wrapped source error.
/// * **Source Conversions**: Implements `From<Source>` for variants with a `source` field
///   (or a field marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant with a `message` field exists.
/// * **`format_context`**: a private helper usable in `#[error(...)]` strings that renders
///   ` (context)` or nothing.
///
/// # Requirements
///
/// Variants must use named fields. A `context` field must be `Option<Cow<'static, str>>`,
/// and every variant wrapping a source error must have one.
///
/// # Example
///
/// ```rust,ignore
/// use amodel_derive::model_error;
/// use std::borrow::Cow;
///
/// #[model_error]
/// pub enum StoreError {
///     #[error("Decode error{}: {source}", format_context(.context))]
///     Decode { source: serde_json::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn decode(raw: &str) -> Result<serde_json::Value, StoreError> {
///     Ok(serde_json::from_str(raw).context("Decoding stored record")?)
/// }
/// ```
#[proc_macro_attribute]
pub fn model_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}

/// Attribute macro declaring a model class from a struct.
///
/// The struct's fields become declared model fields; the struct itself is replaced
/// by a thin typed handle around `amodel::Model` that implements `amodel::ActiveModel`.
/// For every field `foo` the handle gets a typed reader `foo()` and a writer
/// `set_foo(value)` that go through the model's enforced accessors.
///
/// # Arguments
///
/// * `name = "..."` - Class name (defaults to the struct name).
/// * `extends = Parent` - Parent model type; the class inherits its metadata.
///
/// # Field options (`#[field(...)]`)
///
/// * Flags: `fillable`, `hidden`, `protected`, `readonly`, `required`.
/// * `attribute = expr` - Default value; `attribute_with = path` - lazy default factory.
/// * `getter = path`, `setter = path`, `validator = path` - field behaviors.
/// * `factory = Type` - Nested model type; `factory_default = path` - value used for null input.
/// * `computed` - Register only the getter, no stored field.
/// * `rename = "key"` - Store the field under a different key.
///
/// # Example
///
/// ```rust,ignore
/// use amodel::prelude::*;
///
/// #[active_model]
/// pub struct Car {
///     #[field(fillable, attribute = "Ivan")]
///     driver: String,
///     #[field(fillable)]
///     chassis: String,
/// }
///
/// let car = Car::create(serde_json::json!({ "chassis": "Porsche" }))?;
/// assert_eq!(car.driver().as_deref(), Some("Ivan"));
/// ```
#[proc_macro_attribute]
pub fn active_model(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::model::expand(args.into(), input).into()
}
