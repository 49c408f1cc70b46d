use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::builders::{shift_placeholders, Template};
use crate::error::Result;
use crate::traits::Transport;
use crate::types::{ParameterizedQuery, ResultSet, SqlValue};

#[derive(Debug, Clone)]
enum QueryBody {
    Template(Template),
    /// Caller-written SQL with its own `$n` placeholders.
    Raw { query: String, params: Vec<SqlValue> },
}

/// A query that has been built but not yet sent.
///
/// Building is pure: [`prepare`](Query::prepare) can be called any number of
/// times without I/O. The first call to [`run`](Query::run) sends the query;
/// later calls, including concurrent ones, share that single outcome. A clone
/// starts out unexecuted.
///
/// Awaiting a `Query` by value sends it (or reuses the outcome of an earlier
/// `run`) and yields the owned [`ResultSet`].
pub struct Query {
    body: QueryBody,
    transport: Arc<dyn Transport>,
    array_mode: bool,
    outcome: OnceCell<Result<ResultSet>>,
}

impl Query {
    pub(crate) fn template(
        template: Template,
        transport: Arc<dyn Transport>,
        array_mode: bool,
    ) -> Self {
        Self::with_body(QueryBody::Template(template), transport, array_mode)
    }

    pub(crate) fn raw(
        query: String,
        params: Vec<SqlValue>,
        transport: Arc<dyn Transport>,
        array_mode: bool,
    ) -> Self {
        Self::with_body(QueryBody::Raw { query, params }, transport, array_mode)
    }

    fn with_body(body: QueryBody, transport: Arc<dyn Transport>, array_mode: bool) -> Self {
        Self {
            body,
            transport,
            array_mode,
            outcome: OnceCell::new(),
        }
    }

    /// Flattens the query into its text and parameter list.
    ///
    /// A template query gets `$1..$k` numbered left to right across all
    /// nested fragments. A pre-compiled query keeps its text as written.
    pub fn prepare(&self) -> ParameterizedQuery {
        let mut query = String::new();
        let mut params = Vec::new();
        self.write_to(&mut query, &mut params);
        ParameterizedQuery { query, params }
    }

    /// Writes this query inline, continuing the numbering of `params`.
    pub(crate) fn write_to(&self, sql: &mut String, params: &mut Vec<String>) {
        match &self.body {
            QueryBody::Template(template) => template.write_to(sql, params),
            QueryBody::Raw { query, params: raw } => {
                sql.push_str(&shift_placeholders(query, params.len()));
                params.extend(raw.iter().map(SqlValue::to_param));
            }
        }
    }

    /// Sends the query on first use and returns the shared outcome.
    pub async fn run(&self) -> Result<&ResultSet> {
        self.outcome
            .get_or_init(|| self.handle())
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Consumes the query, returning the outcome of an earlier `run` or
    /// sending it now.
    pub async fn into_result(mut self) -> Result<ResultSet> {
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.handle().await,
        }
    }

    async fn handle(&self) -> Result<ResultSet> {
        let prepared = self.prepare();
        let raw = self.transport.execute(&prepared).await?;
        ResultSet::from_raw(raw, self.array_mode)
    }
}

impl Clone for Query {
    fn clone(&self) -> Self {
        Self::with_body(self.body.clone(), Arc::clone(&self.transport), self.array_mode)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("body", &self.body)
            .field("array_mode", &self.array_mode)
            .field("executed", &self.outcome.initialized())
            .finish()
    }
}

impl IntoFuture for Query {
    type Output = Result<ResultSet>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.into_result())
    }
}
