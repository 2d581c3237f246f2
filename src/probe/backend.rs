use crate::error::DiagError;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct EmpresasListResponse {
    data: EmpresasListData,
}

#[derive(Debug, Deserialize)]
struct EmpresasListData {
    total: i64,
}

#[derive(Debug, Deserialize)]
struct DebugConnectionResponse {
    #[serde(default)]
    data: Option<DebugConnectionData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DebugConnectionData {
    #[serde(default)]
    connection_string: Option<String>,
}

/// Classification of the connection string the backend reports. The broken
/// deploys truncated the Neon hostname right after `.aw`, so the tail is
/// the whole diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStringState {
    Complete,
    Truncated,
    Unknown,
}

impl ConnectionStringState {
    pub fn classify(conn_str: &str) -> Self {
        if conn_str.ends_with(".aw") {
            ConnectionStringState::Truncated
        } else if conn_str.ends_with(".neon.tech") {
            ConnectionStringState::Complete
        } else {
            ConnectionStringState::Unknown
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ConnectionStringState::Complete => "connection string looks complete",
            ConnectionStringState::Truncated => "CONNECTION STRING IS TRUNCATED",
            ConnectionStringState::Unknown => "connection string has an unexpected shape",
        }
    }
}

/// What `/api/empresas/debug/connection` told us.
#[derive(Debug)]
pub struct ConnectionDiagnosis {
    pub status: u16,
    pub connection_string: Option<String>,
    pub state: Option<ConnectionStringState>,
    pub error: Option<String>,
}

/// Smoke-tester for an already-deployed backend instance.
pub struct BackendProbe {
    client: reqwest::Client,
    base: Url,
}

impl BackendProbe {
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, DiagError> {
        let url = self.base.join(path)?;
        Ok(self.client.get(url).send().await?)
    }

    pub async fn health(&self) -> Result<u16, DiagError> {
        let resp = self.get("/health").await?;
        Ok(resp.status().as_u16())
    }

    /// Row total as the list endpoint reports it; `None` when the endpoint
    /// answered with a non-success status.
    pub async fn empresas_total(&self) -> Result<(u16, Option<i64>), DiagError> {
        let resp = self.get("/api/empresas/").await?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            return Ok((status, None));
        }
        let parsed: EmpresasListResponse = resp.json().await?;
        Ok((status, Some(parsed.data.total)))
    }

    pub async fn connection_diagnosis(&self) -> Result<ConnectionDiagnosis, DiagError> {
        let resp = self.get("/api/empresas/debug/connection").await?;
        let status = resp.status().as_u16();
        let parsed: DebugConnectionResponse = resp.json().await?;

        let connection_string = parsed.data.and_then(|d| d.connection_string);
        let state = connection_string
            .as_deref()
            .map(ConnectionStringState::classify);
        Ok(ConnectionDiagnosis {
            status,
            connection_string,
            state,
            error: parsed.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neon_tail_classifies_as_complete() {
        let state = ConnectionStringState::classify(
            "ep-fancy-river-acd46jxk-pooler.sa-east-1.aws.neon.tech",
        );
        assert_eq!(state, ConnectionStringState::Complete);
    }

    #[test]
    fn aw_tail_classifies_as_truncated() {
        let state = ConnectionStringState::classify("ep-fancy-river-acd46jxk-pooler.sa-east-1.aw");
        assert_eq!(state, ConnectionStringState::Truncated);
    }

    #[test]
    fn anything_else_is_unknown() {
        assert_eq!(
            ConnectionStringState::classify("postgresql://localhost/neondb"),
            ConnectionStringState::Unknown
        );
    }
}
