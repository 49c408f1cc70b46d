use std::fmt::Write;

use crate::error::{PgHttpError, Result};
use crate::query::Query;
use crate::types::{Identifier, SqlValue};

/// A value placed between two literal segments of a [`Template`].
#[derive(Debug, Clone)]
pub enum Arg {
    /// Bound as the next `$n` parameter.
    Value(SqlValue),
    /// Spliced inline; its parameters continue the outer numbering.
    SubQuery(Query),
    /// Inlined as an escaped identifier, without a parameter.
    Identifier(Identifier),
    /// Each query spliced inline, separated by a single space.
    /// An empty list is bound as an empty array parameter.
    Fragments(Vec<Query>),
}

impl Arg {
    pub fn value(value: impl Into<SqlValue>) -> Self {
        Arg::Value(value.into())
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Arg::Value(_) => "a plain value",
            Arg::SubQuery(_) => "a query",
            Arg::Identifier(_) => "an identifier",
            Arg::Fragments(_) => "a fragment list",
        }
    }

    fn write_to(&self, sql: &mut String, params: &mut Vec<String>) {
        match self {
            Arg::SubQuery(query) => query.write_to(sql, params),
            Arg::Identifier(ident) => sql.push_str(&ident.prepare()),
            Arg::Fragments(queries) if !queries.is_empty() => {
                for (i, query) in queries.iter().enumerate() {
                    if i > 0 {
                        sql.push(' ');
                    }
                    query.write_to(sql, params);
                }
            }
            Arg::Fragments(_) => bind(sql, params, SqlValue::Array(Vec::new()).to_param()),
            Arg::Value(value) => bind(sql, params, value.to_param()),
        }
    }
}

/// Appends a parameter and writes its `$n` placeholder.
fn bind(sql: &mut String, params: &mut Vec<String>, param: String) {
    params.push(param);
    // Writing to a String cannot fail.
    let _ = write!(sql, "${}", params.len());
}

impl From<SqlValue> for Arg {
    fn from(value: SqlValue) -> Self {
        Arg::Value(value)
    }
}

impl From<Query> for Arg {
    fn from(query: Query) -> Self {
        Arg::SubQuery(query)
    }
}

impl From<Identifier> for Arg {
    fn from(ident: Identifier) -> Self {
        Arg::Identifier(ident)
    }
}

impl From<Vec<Query>> for Arg {
    fn from(queries: Vec<Query>) -> Self {
        Arg::Fragments(queries)
    }
}

/// Literal SQL segments interleaved with [`Arg`]s.
///
/// There is always exactly one more segment than there are args: the value
/// `args[i]` sits between `strings[i]` and `strings[i + 1]`.
///
/// # Example
/// ```ignore
/// let active = client.query(Template::new("active = ").bind(true));
/// let query = client.query(
///     Template::new("SELECT * FROM ")
///         .ident("public.users")
///         .sql(" WHERE ")
///         .fragment(active)
///         .sql(" AND name = ")
///         .bind("Ann"),
/// );
/// // SELECT * FROM "public"."users" WHERE active = $1 AND name = $2
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    strings: Vec<String>,
    args: Vec<Arg>,
}

impl Template {
    /// Starts a template with its first literal segment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            strings: vec![sql.into()],
            args: Vec::new(),
        }
    }

    /// Assembles a template from already split segments and values.
    pub fn from_parts<S: Into<String>>(
        strings: impl IntoIterator<Item = S>,
        args: Vec<Arg>,
    ) -> Result<Self> {
        let strings: Vec<String> = strings.into_iter().map(Into::into).collect();
        if strings.len() != args.len() + 1 {
            return Err(PgHttpError::InvalidTemplate {
                segments: strings.len(),
                values: args.len(),
            });
        }
        Ok(Self { strings, args })
    }

    /// Appends literal SQL to the current segment.
    #[must_use]
    pub fn sql(mut self, sql: &str) -> Self {
        if let Some(last) = self.strings.last_mut() {
            last.push_str(sql);
        }
        self
    }

    /// Appends an arg and opens a new, empty literal segment after it.
    #[must_use]
    pub fn push(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self.strings.push(String::new());
        self
    }

    /// Binds a value as the next parameter.
    #[must_use]
    pub fn bind(self, value: impl Into<SqlValue>) -> Self {
        self.push(Arg::Value(value.into()))
    }

    /// Inlines an escaped identifier.
    #[must_use]
    pub fn ident(self, ident: impl Into<Identifier>) -> Self {
        self.push(Arg::Identifier(ident.into()))
    }

    /// Splices a sub-query.
    #[must_use]
    pub fn fragment(self, query: Query) -> Self {
        self.push(Arg::SubQuery(query))
    }

    /// Splices a list of sub-queries.
    #[must_use]
    pub fn fragments(self, queries: impl IntoIterator<Item = Query>) -> Self {
        self.push(Arg::Fragments(queries.into_iter().collect()))
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Writes the flattened query text, appending parameters as they are met.
    /// Placeholders are numbered from `params.len() + 1`.
    pub(crate) fn write_to(&self, sql: &mut String, params: &mut Vec<String>) {
        let Some((head, tail)) = self.strings.split_first() else {
            return;
        };
        sql.push_str(head);
        for (arg, segment) in self.args.iter().zip(tail) {
            arg.write_to(sql, params);
            sql.push_str(segment);
        }
    }
}
