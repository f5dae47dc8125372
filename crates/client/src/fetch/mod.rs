//! HTTP fetch pipeline for sitemap documents.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Safety Gates
//! - Deny private ranges (RFC1918, link-local, localhost, etc.) unless disabled
//! - Resolve DNS and validate all A/AAAA answers are public.
//! - Max redirects: 5, followed manually so every hop passes the same checks
//! - Max body bytes: 50MB (configurable)

pub mod ssrf;
pub mod url;

use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header, header::HeaderValue};
use std::time::{Duration, Instant};

pub use ssrf::{SsrfError, guard_host, validate_ip};
pub use self::url::{UrlError, canonicalize, site_origin, strip_to_homepage};

use sitemap_core::{AppConfig, Error};

const SITEMAP_ACCEPT: &str = "application/xml,text/xml;q=0.9,application/x-gzip;q=0.8,text/plain;q=0.8,*/*;q=0.5";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "mcp-sitemap/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Whether to refuse private and reserved addresses (default: true)
    pub block_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "mcp-sitemap/0.1".to_string(),
            max_bytes: 50 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            block_private_hosts: true,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            block_private_hosts: config.block_private_hosts,
            ..Default::default()
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// HTTP fetch client with safety checks.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Performs the SSRF check and respects redirect/byte limits. Bodies are
    /// returned as served: `.xml.gz` files stay gzip-compressed here.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let mut current = url.clone();
        let mut redirects = 0;
        let response = loop {
            if self.config.block_private_hosts {
                guard_host(&current).await.map_err(|e| Error::SsrfBlocked(e.to_string()))?;
            }

            let response = self
                .http
                .get(current.as_str())
                .header(header::ACCEPT, SITEMAP_ACCEPT)
                .send()
                .await
                .map_err(|e| request_error(&current, e))?;

            let Some(next) = redirect_location(&current, response.status(), response.headers().get(header::LOCATION))?
            else {
                break response;
            };
            if redirects == self.config.max_redirects {
                return Err(Error::HttpError(format!(
                    "too many redirects for {url} (limit {})",
                    self.config.max_redirects
                )));
            }
            redirects += 1;
            tracing::debug!("redirect {} -> {}", current, next);
            current = next;
        };

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("status {} for {url}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| request_error(&url, e))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", url, final_url, fetch_ms, bytes.len());

        Ok(FetchResponse { url, final_url, status, content_type, bytes, fetch_ms })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

/// Target of a redirect response, resolved against `current`. `None` when
/// the response is not a redirect.
fn redirect_location(current: &Url, status: StatusCode, location: Option<&HeaderValue>) -> Result<Option<Url>, Error> {
    if !matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308) {
        return Ok(None);
    }
    let location = location
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::HttpError(format!("status {} without a usable Location for {current}", status.as_u16())))?;
    let next = current
        .join(location)
        .map_err(|e| Error::InvalidUrl(format!("redirect from {current} to '{location}': {e}")))?;
    match next.scheme() {
        "http" | "https" => Ok(Some(next)),
        other => Err(Error::InvalidUrl(format!("redirect from {current} to unsupported scheme {other}"))),
    }
}

fn request_error(url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::HttpError(format!("network error for {url}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "mcp-sitemap/0.1");
        assert_eq!(config.max_bytes, 50 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
        assert!(config.block_private_hosts);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig {
            user_agent: "custom/2.0".into(),
            timeout_ms: 1500,
            max_bytes: 1024,
            block_private_hosts: false,
            ..Default::default()
        };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "custom/2.0");
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_bytes, 1024);
        assert!(!config.block_private_hosts);
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let result = client.fetch("ftp://example.com/sitemap.xml").await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_blocks_loopback() {
        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let result = client.fetch("http://127.0.0.1:9/sitemap.xml").await;
        assert!(matches!(result, Err(Error::SsrfBlocked(_))));
    }

    fn location(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn test_redirect_location() {
        let base = Url::parse("https://example.com/sitemaps/index.xml").unwrap();

        let next = redirect_location(&base, StatusCode::FOUND, Some(&location("posts.xml"))).unwrap();
        assert_eq!(next.unwrap().as_str(), "https://example.com/sitemaps/posts.xml");

        let next = redirect_location(&base, StatusCode::PERMANENT_REDIRECT, Some(&location("http://cdn.example.com/s.xml")));
        assert_eq!(next.unwrap().unwrap().as_str(), "http://cdn.example.com/s.xml");

        assert!(redirect_location(&base, StatusCode::OK, None).unwrap().is_none());
        assert!(redirect_location(&base, StatusCode::NOT_MODIFIED, None).unwrap().is_none());
        assert!(matches!(redirect_location(&base, StatusCode::FOUND, None), Err(Error::HttpError(_))));
        assert!(matches!(
            redirect_location(&base, StatusCode::FOUND, Some(&location("file:///etc/passwd"))),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_redirect_to_private_host_is_guarded() {
        let base = Url::parse("https://93.184.216.34/sitemap.xml").unwrap();
        assert!(guard_host(&base).await.is_ok());

        for target in ["http://127.0.0.1/", "http://169.254.169.254/latest/meta-data/", "http://[::1]/"] {
            let next = redirect_location(&base, StatusCode::FOUND, Some(&location(target))).unwrap().unwrap();
            assert!(matches!(guard_host(&next).await, Err(SsrfError::BlockedIp(_))), "{target} should be blocked");
        }
    }

    /// Serve canned responses on a loopback port: `/start` redirects to
    /// `/end`, `/loop` redirects to itself.
    async fn redirect_server() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else { return };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let response = match path.as_str() {
                        "/start" => "HTTP/1.1 302 Found\r\nLocation: /end\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
                        "/loop" => "HTTP/1.1 302 Found\r\nLocation: /loop\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
                        "/end" => "HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\n<urlset>".to_string(),
                        _ => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
                    };
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn open_client() -> FetchClient {
        FetchClient::new(FetchConfig { block_private_hosts: false, ..Default::default() }).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let base = redirect_server().await;
        let response = open_client().fetch(&format!("{base}/start")).await.unwrap();
        assert_eq!(response.final_url.as_str(), format!("{base}/end"));
        assert_eq!(response.bytes.as_ref(), b"<urlset>");
    }

    #[tokio::test]
    async fn test_fetch_redirect_limit() {
        let base = redirect_server().await;
        let result = open_client().fetch(&format!("{base}/loop")).await;
        assert!(matches!(result, Err(Error::HttpError(msg)) if msg.contains("too many redirects")));
    }
}
