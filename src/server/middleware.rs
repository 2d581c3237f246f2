use crate::config::CONFIG;
use axum::{
    extract::Request,
    http::{HeaderValue, Uri},
    middleware::Next,
    response::Response,
};

/// Scheme the fronting proxy reported for the original request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedScheme {
    Http,
    Https,
}

impl ForwardedScheme {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "http" => Some(ForwardedScheme::Http),
            "https" => Some(ForwardedScheme::Https),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ForwardedScheme::Http => "http",
            ForwardedScheme::Https => "https",
        }
    }

    fn default_port(self) -> &'static str {
        match self {
            ForwardedScheme::Http => "80",
            ForwardedScheme::Https => "443",
        }
    }
}

/// Scheme detected for the current request, `None` when no proxy header was
/// present. Inserted unconditionally so handlers can extract it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectedScheme(pub Option<ForwardedScheme>);

/// Normalize `X-Forwarded-*` headers from the platform's edge proxy.
/// Without this the app sees plain-HTTP request URLs and generated
/// redirects bounce between schemes.
pub async fn proxy_headers(mut req: Request, next: Next) -> Response {
    let proto = header_value(&req, "x-forwarded-proto").map(|v| v.to_ascii_lowercase());
    let scheme = proto.as_deref().and_then(ForwardedScheme::parse);
    let host = header_value(&req, "x-forwarded-host");
    let port = header_value(&req, "x-forwarded-port");

    if let Some(scheme) = scheme
        && let Some(host) = host.as_deref()
        && let Some(uri) = rewrite_uri(req.uri(), scheme, host, port.as_deref())
    {
        *req.uri_mut() = uri;
    }
    req.extensions_mut().insert(DetectedScheme(scheme));

    let mut response = next.run(req).await;
    if !CONFIG.production {
        response
            .headers_mut()
            .insert("x-proxy-handled", HeaderValue::from_static("true"));
    }
    response
}

fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn rewrite_uri(
    uri: &Uri,
    scheme: ForwardedScheme,
    host: &str,
    port: Option<&str>,
) -> Option<Uri> {
    let authority = match port {
        Some(p) if p != scheme.default_port() => format!("{host}:{p}"),
        _ => host.to_owned(),
    };
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    Uri::builder()
        .scheme(scheme.as_str())
        .authority(authority.as_str())
        .path_and_query(path_and_query)
        .build()
        .ok()
}
