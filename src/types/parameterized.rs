use serde::{Deserialize, Serialize};

/// A query string with `$n` placeholders and the raw text of each parameter.
///
/// `params[n - 1]` is the value for `$n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterizedQuery {
    pub query: String,
    pub params: Vec<String>,
}

impl ParameterizedQuery {
    pub fn new(query: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }
}
