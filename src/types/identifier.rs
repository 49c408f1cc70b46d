use std::fmt;

/// Quotes a name as a SQL identifier.
///
/// Embedded double quotes are doubled and every `.` splits the name into
/// separately quoted parts, so `schema.table` becomes `"schema"."table"`.
pub fn escape_identifier(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\"").replace('.', "\".\""))
}

/// A name to be inlined into a query as an escaped identifier.
/// Identifiers never consume a parameter slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    value: String,
}

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// The raw, unescaped name.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The escaped form that is inlined into query text.
    pub fn prepare(&self) -> String {
        escape_identifier(&self.value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prepare())
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
