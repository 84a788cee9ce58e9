//! # Input Validation
//!
//! Checks a request's inputs against an operation's parameter schemas before the
//! operation body runs. Two passes, in order:
//! 1. **Presence**: every required parameter must be present.
//! 2. **Enumeration**: every supplied value of an enumerated parameter must be allowed.
//!
//! All presence checks run before any enumeration check, so a missing field never
//! reports an enumeration error. Type coercion is left to the operation body.

use crate::reply::Inputs;
use warren_domain::param::ParameterSchema;

pub const BAD_REQUEST: u16 = 400;

/// Per-request validation failures. Recoverable: the request stops with `400`.
#[warren_derive::warren_error]
pub enum ValidationError {
    #[error("Required parameter '{name}' not found in [{present}]")]
    RequiredParameterMissing { name: String, present: String },

    #[error("Parameter '{name}' value '{value}' not found in list of allowed values [{allowed}]")]
    InvalidEnumValue { name: String, value: String, allowed: String },
}

impl ValidationError {
    /// HTTP status the failure translates to.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::RequiredParameterMissing { .. } | Self::InvalidEnumValue { .. } => BAD_REQUEST,
        }
    }
}

/// `Ok(())` or the first failure found.
pub type ValidationOutcome = Result<(), ValidationError>;

/// Validates `inputs` against `schemas`.
///
/// # Errors
/// * [`ValidationError::RequiredParameterMissing`] if a required parameter is absent.
/// * [`ValidationError::InvalidEnumValue`] if a supplied value is outside the allowed set.
///
/// # Example
/// ```rust
/// use warren_domain::param::ParameterSchema;
/// use warren_kernel::reply::Inputs;
/// use warren_kernel::validator::validate;
///
/// let schemas = [ParameterSchema::string("id").required(), ParameterSchema::enumeration("arch", [1, 2])];
/// let inputs = Inputs::from([("id".to_owned(), "1".to_owned()), ("arch".to_owned(), "3".to_owned())]);
///
/// let err = validate(&inputs, &schemas).unwrap_err();
/// assert_eq!(err.to_string(), "Parameter 'arch' value '3' not found in list of allowed values [1,2]");
/// ```
pub fn validate(inputs: &Inputs, schemas: &[ParameterSchema]) -> ValidationOutcome {
    if let Some(missing) = schemas.iter().find(|p| p.is_required() && !inputs.contains_key(p.name()))
    {
        return Err(ValidationError::RequiredParameterMissing {
            name: missing.name().to_owned(),
            present: inputs.keys().map(String::as_str).collect::<Vec<_>>().join(","),
        });
    }

    for schema in schemas.iter().filter(|p| p.is_enum()) {
        // Absent optional enumerations are not checked.
        let Some(value) = inputs.get(schema.name()) else { continue };
        if !schema.allows(value) {
            return Err(ValidationError::InvalidEnumValue {
                name: schema.name().to_owned(),
                value: value.clone(),
                allowed: schema.allowed_values().join(","),
            });
        }
    }

    Ok(())
}
