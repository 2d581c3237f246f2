use crate::config::Config;
use crate::db::schema::{self, TURSO_EMPRESAS_INIT};
use crate::error::DiagError;
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an error body is worth keeping in the error message.
const BODY_SNIPPET_LEN: usize = 200;

/// Rows and columns returned by a Turso `execute` call.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
pub struct ResultSet {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    results: ResultSet,
}

/// The service answers either `{"results": {...}}` or the bare result set
/// depending on the deployment; accept both.
fn parse_result_set(body: &[u8]) -> Result<ResultSet, serde_json::Error> {
    match serde_json::from_slice::<ResultEnvelope>(body) {
        Ok(envelope) => Ok(envelope.results),
        Err(_) => serde_json::from_slice::<ResultSet>(body),
    }
}

/// Rewrite a `libsql://` deployment URL to its HTTPS endpoint. Any other
/// scheme passes through untouched.
pub fn http_endpoint(url: &Url) -> Result<Url, DiagError> {
    if url.scheme() == "libsql" {
        let https = url.as_str().replacen("libsql://", "https://", 1);
        return Ok(Url::parse(&https)?);
    }
    Ok(url.clone())
}

fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut snippet: String = text.chars().take(BODY_SNIPPET_LEN).collect();
    if text.chars().count() > BODY_SNIPPET_LEN {
        snippet.push_str("...");
    }
    snippet
}

/// Minimal client for the Turso HTTP API: one statement per
/// `POST /v1/execute`, bearer-token auth.
#[derive(Clone)]
pub struct TursoClient {
    http: reqwest::Client,
    execute_url: Url,
    token: String,
}

impl TursoClient {
    pub fn new(
        http: reqwest::Client,
        database_url: &Url,
        token: impl Into<String>,
    ) -> Result<Self, DiagError> {
        let base = http_endpoint(database_url)?;
        let execute_url = base.join("v1/execute")?;
        Ok(Self {
            http,
            execute_url,
            token: token.into(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, DiagError> {
        let (url, token) = cfg.turso()?;
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Self::new(http, url, token)
    }

    /// Execute one SQL statement. 5xx answers are retried with backoff;
    /// everything sent through here is idempotent.
    pub async fn execute(&self, sql: &str) -> Result<ResultSet, DiagError> {
        debug!(sql = %sql, "executing statement on Turso");
        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3))
            .with_max_times(3)
            .with_jitter();

        let resp = (|| async {
            let resp = self
                .http
                .post(self.execute_url.clone())
                .bearer_auth(&self.token)
                .json(&json!({ "stmt": sql }))
                .send()
                .await?;
            if resp.status().is_server_error() {
                let status = resp.status();
                let err = resp.error_for_status().unwrap_err();
                error!("Turso server error (will retry): {}", status);
                return Err(err);
            }
            Ok(resp)
        })
        .retry(retry_policy)
        .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(DiagError::TursoApi {
                status: status.as_u16(),
                message: body_snippet(&body),
            });
        }
        parse_result_set(&body).map_err(DiagError::Json)
    }

    /// Create the empresas table and its indexes, one statement per call.
    pub async fn init_schema(&self) -> Result<(), DiagError> {
        for stmt in schema::statements(TURSO_EMPRESAS_INIT) {
            self.execute(stmt).await?;
        }
        Ok(())
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, DiagError> {
        let set = self
            .execute("SELECT name FROM sqlite_master WHERE type='table'")
            .await?;
        Ok(set
            .rows
            .iter()
            .filter_map(|row| row.first().and_then(Value::as_str).map(str::to_owned))
            .collect())
    }

    pub async fn count_empresas(&self) -> Result<i64, DiagError> {
        let set = self.execute("SELECT COUNT(*) FROM empresas").await?;
        set.rows
            .first()
            .and_then(|row| row.first())
            .and_then(Value::as_i64)
            .ok_or_else(|| DiagError::UnexpectedResponse("COUNT(*) returned no rows".to_string()))
    }

    /// Seed row used to verify writes; `OR IGNORE` keeps reruns clean.
    pub async fn insert_probe_row(&self) -> Result<(), DiagError> {
        self.execute(
            "INSERT OR IGNORE INTO empresas (ruc, razon_social, fuente_datos) \
             VALUES ('12345678901', 'EMPRESA DE PRUEBA S.A.C.', 'TEST')",
        )
        .await?;
        Ok(())
    }
}
