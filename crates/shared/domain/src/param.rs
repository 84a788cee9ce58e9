use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Placeholder used when a parameter is declared without a description.
pub const DEFAULT_DESCRIPTION: &str = "Description not available";

/// Declared type tag of an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Enum,
    /// Unconstrained input.
    Free,
}

impl ParamKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Enum => "enum",
            Self::Free => "free",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one named operation input.
///
/// Schemas are assembled with the consuming builder methods and never change afterwards:
///
/// ```rust
/// use warren_domain::param::ParameterSchema;
///
/// let arch = ParameterSchema::enumeration("arch", [1, 2]).describe("Architecture");
/// assert!(arch.is_enum());
/// assert!(arch.is_optional());
/// assert_eq!(arch.to_string(), "arch:enum:optional");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSchema {
    name: String,
    #[serde(rename = "type")]
    kind: ParamKind,
    required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    allowed_values: Vec<String>,
    description: Cow<'static, str>,
}

impl ParameterSchema {
    /// Creates an optional schema with the placeholder description.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            allowed_values: Vec::new(),
            description: Cow::Borrowed(DEFAULT_DESCRIPTION),
        }
    }

    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String)
    }

    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Number)
    }

    #[must_use]
    pub fn free(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Free)
    }

    /// Creates an enumeration schema restricted to `values`.
    #[must_use]
    pub fn enumeration<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        Self::new(name, ParamKind::Enum).values(values)
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Restricts the accepted values. Duplicates are dropped, declaration order is kept.
    ///
    /// A non-empty list turns the schema into an enumeration whatever its declared type.
    #[must_use]
    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        for value in values {
            let value = value.to_string();
            if !self.allowed_values.contains(&value) {
                self.allowed_values.push(value);
            }
        }
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<Cow<'static, str>>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub const fn is_optional(&self) -> bool {
        !self.required
    }

    #[must_use]
    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn is_enum(&self) -> bool {
        !self.allowed_values.is_empty()
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        self.kind == ParamKind::Number
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind == ParamKind::String
    }

    /// Returns `true` when `value` is acceptable for an enumeration schema.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        !self.is_enum() || self.allowed_values.iter().any(|v| v == value)
    }
}

/// Renders the `name:type:required` descriptor used by `OPTIONS` responses.
impl fmt::Display for ParameterSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let presence = if self.required { "required" } else { "optional" };
        write!(f, "{}:{}:{presence}", self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_string_with_description() {
        let param = ParameterSchema::string("r_string").required().describe("TestParam");

        assert_eq!(param.to_string(), "r_string:string:required");
        assert_eq!(param.description(), "TestParam");
        assert!(param.is_required());
        assert!(param.is_string());
        assert!(!param.is_enum());
        assert!(!param.is_number());
    }

    #[test]
    fn test_name_and_type_only() {
        let param = ParameterSchema::string("free_param");

        assert_eq!(param.description(), DEFAULT_DESCRIPTION);
        assert!(param.is_optional());
        assert!(param.allowed_values().is_empty());
    }

    #[test]
    fn test_values_make_any_schema_an_enumeration() {
        let param = ParameterSchema::string("v1").values(["test1", "test2", "test1"]);

        assert!(param.is_enum());
        assert_eq!(param.kind(), ParamKind::String);
        assert_eq!(param.allowed_values(), ["test1", "test2"]);
        assert!(param.allows("test2"));
        assert!(!param.allows("test3"));
    }

    #[test]
    fn test_number_kind() {
        let param = ParameterSchema::number("o_number");
        assert!(param.is_number());
        assert!(!param.is_string());
        assert!(param.allows("anything"));
    }

    #[test]
    fn test_serializes_type_tag() {
        let json = serde_json::to_value(ParameterSchema::enumeration("arch", [1, 2]).required())
            .expect("schema serializes");

        assert_eq!(json["type"], "enum");
        assert_eq!(json["required"], true);
        assert_eq!(json["allowedValues"], serde_json::json!(["1", "2"]));
    }
}
