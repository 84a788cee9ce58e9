#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the routing compiler workspace.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! warren-derive = { path = "../infra/derive" }
//! ```

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring the error enums used across the workspace.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait adding `.context(...)`
///   to `Result<T, Name>` and to `Result<T, Source>` for every wrapped source error.
/// * **Conversions**: `From<Source>` for variants with a `source` field, plus
///   `From<&'static str>` / `From<String>` when an `Internal` variant exists.
/// * **`format_context`**: A helper usable inside `#[error(...)]` strings that renders
///   ` (context)` or nothing.
///
/// # Requirements
///
/// 1. Applied to an **enum** with named-field variants only.
/// 2. A `context` field, when present, must be `Option<Cow<'static, str>>`.
/// 3. Variants with a `source` (or `#[source]`/`#[from]`) field must carry a `context` field.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[warren_derive::warren_error]
/// pub enum DeclarationError {
///     #[error("Duplicate operation{}: {message}", format_context(.context))]
///     DuplicateOperation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Internal declaration error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn warren_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
