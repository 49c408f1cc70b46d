use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::connection_string::ConnectionUrl;
use crate::error::{PgHttpError, Result};
use crate::options::{Options, TransactionOptions};
use crate::traits::Transport;
use crate::types::{ParameterizedQuery, RawResult};

const CONNECTION_STRING: &str = "neon-connection-string";
const RAW_TEXT_OUTPUT: &str = "neon-raw-text-output";
const ARRAY_MODE: &str = "neon-array-mode";
const BATCH_ISOLATION_LEVEL: &str = "neon-batch-isolation-level";
const BATCH_READ_ONLY: &str = "neon-batch-read-only";
const BATCH_DEFERRABLE: &str = "neon-batch-deferrable";

#[derive(Serialize)]
struct BatchRequest<'a> {
    queries: &'a [ParameterizedQuery],
}

#[derive(Deserialize)]
struct BatchResponse {
    results: Vec<RawResult>,
}

/// Transport that POSTs queries to the service's `/sql` endpoint.
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: String,
    connection_string: String,
    options: Options,
}

impl HttpTransport {
    /// Create a transport for the host named in the connection string.
    /// No request is made until a query is executed.
    pub fn new(connection_string: &str, options: Options) -> Result<Self> {
        let parsed = ConnectionUrl::parse(connection_string)?;
        Ok(Self {
            http_client: reqwest::Client::new(),
            endpoint: format!("https://{}/sql", parsed.hostname),
            connection_string: connection_string.to_string(),
            options,
        })
    }

    /// Send requests to a different URL, e.g. a local proxy.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Use a preconfigured reqwest client (timeouts, proxies, TLS).
    #[must_use]
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<B: Serialize + ?Sized + Sync>(&self, headers: HeaderMap, body: &B) -> Result<String> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .headers(headers)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "response received");

        let text = response.text().await?;
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = status.as_u16(), "query rejected");
            return Err(PgHttpError::QueryFailed {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, query: &ParameterizedQuery) -> Result<RawResult> {
        debug!(
            endpoint = %self.endpoint,
            query_len = query.query.len(),
            params = query.params.len(),
            "sending query"
        );
        let headers = request_headers(&self.connection_string, self.options, None)?;
        let body = self.post(headers, query).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn execute_batch(
        &self,
        queries: &[ParameterizedQuery],
        options: &TransactionOptions,
    ) -> Result<Vec<RawResult>> {
        debug!(endpoint = %self.endpoint, queries = queries.len(), "sending batch");
        let headers = request_headers(&self.connection_string, self.options, Some(options))?;
        let body = self.post(headers, &BatchRequest { queries }).await?;
        let response: BatchResponse = serde_json::from_str(&body)?;
        Ok(response.results)
    }
}

/// Headers for one request. Batch directives are only present when set.
pub fn request_headers(
    connection_string: &str,
    options: Options,
    batch: Option<&TransactionOptions>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let connection = HeaderValue::from_str(connection_string).map_err(|_| {
        PgHttpError::InvalidConnectionString("not valid as a header value".to_string())
    })?;
    headers.insert(HeaderName::from_static(CONNECTION_STRING), connection);
    headers.insert(
        HeaderName::from_static(RAW_TEXT_OUTPUT),
        HeaderValue::from_static("true"),
    );
    headers.insert(
        HeaderName::from_static(ARRAY_MODE),
        bool_header(options.array_mode),
    );

    if let Some(batch) = batch {
        if let Some(level) = batch.isolation_level {
            headers.insert(
                HeaderName::from_static(BATCH_ISOLATION_LEVEL),
                HeaderValue::from_static(level.as_str()),
            );
        }
        if let Some(read_only) = batch.read_only {
            headers.insert(HeaderName::from_static(BATCH_READ_ONLY), bool_header(read_only));
        }
        if let Some(deferrable) = batch.deferrable {
            headers.insert(HeaderName::from_static(BATCH_DEFERRABLE), bool_header(deferrable));
        }
    }
    Ok(headers)
}

fn bool_header(value: bool) -> HeaderValue {
    HeaderValue::from_static(if value { "true" } else { "false" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::IsolationLevel;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const URL: &str = "postgres://u:p@ep-test.example.com/db";

    /// Answers one request on a local port with `status` and `body`, and
    /// yields the raw request text once it has been served.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/sql", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8(request).unwrap().to_ascii_lowercase()
        });
        (endpoint, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= end + 4 + length
    }

    #[test]
    fn test_endpoint_from_hostname() {
        let transport = HttpTransport::new(URL, Options::default()).unwrap();
        assert_eq!(transport.endpoint(), "https://ep-test.example.com/sql");

        let transport = transport.with_endpoint("http://localhost:4444/sql");
        assert_eq!(transport.endpoint(), "http://localhost:4444/sql");
    }

    #[test]
    fn test_query_headers() {
        let headers =
            request_headers(URL, Options::default().with_array_mode(true), None).unwrap();
        assert_eq!(headers["neon-connection-string"], URL);
        assert_eq!(headers["neon-raw-text-output"], "true");
        assert_eq!(headers["neon-array-mode"], "true");
        assert!(!headers.contains_key("neon-batch-isolation-level"));
    }

    #[test]
    fn test_batch_headers_only_when_set() {
        let unset = TransactionOptions::default();
        let headers = request_headers(URL, Options::default(), Some(&unset)).unwrap();
        assert_eq!(headers["neon-array-mode"], "false");
        assert!(!headers.contains_key("neon-batch-isolation-level"));
        assert!(!headers.contains_key("neon-batch-read-only"));
        assert!(!headers.contains_key("neon-batch-deferrable"));

        let set = TransactionOptions::default()
            .with_isolation_level(IsolationLevel::RepeatableRead)
            .with_read_only(false)
            .with_deferrable(true);
        let headers = request_headers(URL, Options::default(), Some(&set)).unwrap();
        assert_eq!(headers["neon-batch-isolation-level"], "RepeatableRead");
        assert_eq!(headers["neon-batch-read-only"], "false");
        assert_eq!(headers["neon-batch-deferrable"], "true");
    }

    #[test]
    fn test_batch_body_shape() {
        let queries = vec![ParameterizedQuery::new("SELECT $1", vec!["1".to_string()])];
        let body = serde_json::to_value(BatchRequest { queries: &queries }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"queries": [{"query": "SELECT $1", "params": ["1"]}]})
        );
    }

    #[test]
    fn test_batch_response_parses() {
        let body = r#"{"results": [{"command": "SELECT", "rowCount": 0, "rows": [], "fields": []}]}"#;
        let response: BatchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].command, "SELECT");
    }

    #[tokio::test]
    async fn test_rejected_request_carries_body() {
        let body = r#"{"message":"syntax error at or near \"SELEC\"","code":"42601"}"#;
        let (endpoint, server) = serve_once("400 Bad Request", body).await;
        let transport = HttpTransport::new(URL, Options::default())
            .unwrap()
            .with_endpoint(endpoint);

        let err = transport
            .execute(&ParameterizedQuery::new("SELEC 1", vec![]))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PgHttpError::QueryFailed {
                status: 400,
                message: body.to_string(),
            }
        );
        assert_eq!(err.to_string(), body);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_execute_parses_response() {
        let body = r#"{"command":"SELECT","rowCount":1,"rows":[["42",null]],
            "fields":[{"name":"n","dataTypeID":23},{"name":"note","dataTypeID":25}]}"#;
        let (endpoint, server) = serve_once("200 OK", body).await;
        let transport = HttpTransport::new(URL, Options::default().with_array_mode(true))
            .unwrap()
            .with_endpoint(endpoint);

        let raw = transport
            .execute(&ParameterizedQuery::new("SELECT $1::int AS n", vec!["42".to_string()]))
            .await
            .unwrap();

        assert_eq!(raw.command, "SELECT");
        assert_eq!(raw.row_count, Some(1));
        assert_eq!(raw.rows, vec![vec![Some("42".to_string()), None]]);
        assert_eq!(raw.fields[1].name, "note");

        let request = server.await.unwrap();
        assert!(request.starts_with("post /sql "));
        assert!(request.contains("neon-array-mode: true"));
        assert!(request.contains("neon-raw-text-output: true"));
        assert!(request.contains(r#"{"query":"select $1::int as n","params":["42"]}"#));
    }

    #[tokio::test]
    async fn test_execute_batch_parses_results() {
        let body = r#"{"results":[
            {"command":"INSERT","rowCount":1,"rows":[],"fields":[]},
            {"command":"SELECT","rowCount":1,"rows":[["1"]],"fields":[{"name":"n","dataTypeID":23}]}
        ]}"#;
        let (endpoint, server) = serve_once("200 OK", body).await;
        let transport = HttpTransport::new(URL, Options::default())
            .unwrap()
            .with_endpoint(endpoint);

        let queries = vec![
            ParameterizedQuery::new("INSERT INTO t VALUES ($1)", vec!["1".to_string()]),
            ParameterizedQuery::new("SELECT count(*) AS n FROM t", vec![]),
        ];
        let options = TransactionOptions::default().with_isolation_level(IsolationLevel::Serializable);
        let results = transport.execute_batch(&queries, &options).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].command, "INSERT");
        assert_eq!(results[1].rows, vec![vec![Some("1".to_string())]]);

        let request = server.await.unwrap();
        assert!(request.contains("neon-batch-isolation-level: serializable"));
        assert!(!request.contains("neon-batch-read-only"));
        assert!(request.contains(r#"{"queries":[{"query":"insert into t values ($1)""#));
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_invalid_response() {
        let (endpoint, server) = serve_once("200 OK", "not json").await;
        let transport = HttpTransport::new(URL, Options::default())
            .unwrap()
            .with_endpoint(endpoint);

        let err = transport
            .execute(&ParameterizedQuery::new("SELECT 1", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, PgHttpError::InvalidResponse(_)));
        server.await.unwrap();
    }
}
