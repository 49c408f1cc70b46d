use async_trait::async_trait;

use crate::error::Result;
use crate::options::TransactionOptions;
use crate::types::{ParameterizedQuery, RawResult};

/// Trait for the request channel to the SQL service.
/// Transports are responsible for:
/// - Sending prepared queries, alone or as one batch
/// - Reporting non-success responses as errors carrying the response text
/// - Parsing the response body into `RawResult`s
///
/// Each call is one round trip; transports never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a single query whose placeholders are `$1`, `$2`, ...
    async fn execute(&self, query: &ParameterizedQuery) -> Result<RawResult>;

    /// Execute all queries in one request, returning one result per query in
    /// submission order.
    async fn execute_batch(
        &self,
        queries: &[ParameterizedQuery],
        options: &TransactionOptions,
    ) -> Result<Vec<RawResult>>;
}
