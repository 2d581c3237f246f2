use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Portals the scraper depends on, plus two control sites that are
/// reachable from any region. A blocked portal with healthy controls
/// means the hosting provider's egress is being filtered.
pub const PROBE_SITES: &[&str] = &[
    "https://e-consultaruc.sunat.gob.pe/cl-ti-itmrconsruc/FrameCriterioBusquedaWeb.jsp",
    "https://apps.osce.gob.pe/perfilprov-ui/",
    "https://ofi5.mef.gob.pe/invierte/consultapublica/consultainversiones",
    "https://www.google.com",
    "https://www.github.com",
];

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of probing one URL. `success` means a response arrived, whatever
/// its status code; transport failures carry the error text instead.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProbeResult {
    pub url: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub content_length: usize,
    pub error: Option<String>,
}

/// Client shared by all probes: generous timeout, redirects followed.
pub fn probe_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}

/// A failed request is a result, not an error: the caller is measuring
/// reachability.
pub async fn probe_url(client: &reqwest::Client, url: &str) -> ProbeResult {
    match fetch(client, url).await {
        Ok((status_code, content_length)) => ProbeResult {
            url: url.to_owned(),
            success: true,
            status_code: Some(status_code),
            content_length,
            error: None,
        },
        Err(e) => ProbeResult {
            url: url.to_owned(),
            success: false,
            status_code: None,
            content_length: 0,
            error: Some(e.to_string()),
        },
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<(u16, usize), reqwest::Error> {
    let resp = client.get(url).send().await?;
    let status = resp.status().as_u16();
    let body = resp.bytes().await?;
    Ok((status, body.len()))
}

/// Probe the fixed site list sequentially, one outstanding request at a
/// time, so per-site results are not skewed by local contention.
pub async fn probe_sites(client: &reqwest::Client) -> Vec<ProbeResult> {
    let mut results = Vec::with_capacity(PROBE_SITES.len());
    for url in PROBE_SITES {
        info!(url = %url, "probing");
        results.push(probe_url(client, url).await);
    }
    results
}
