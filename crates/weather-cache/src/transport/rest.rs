//! REST transport.
//!
//! Talks to the server's REST v2 API, which listens on the same port as the
//! binary protocol. Requests are spread round-robin over the configured
//! servers with a single attempt each, which is how BASIC client
//! intelligence routes traffic.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;

use super::RemoteCacheTransport;
use crate::admin::{AdminFlag, DefaultTemplate};
use crate::config::{ClientIntelligence, ConnectionConfig};
use crate::error::{CacheError, Result};

/// Header carrying admin flags on cache creation
const FLAGS_HEADER: &str = "flags";

/// REST v2 client for a remote cache server
#[derive(Debug)]
pub struct RestTransport {
    client: Client,
    base_urls: Vec<Url>,
    next: AtomicUsize,
    username: Option<String>,
    password: Option<String>,
    closed: AtomicBool,
}

impl RestTransport {
    /// Build the transport. No request is sent until the first call.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        if config.client_intelligence != ClientIntelligence::Basic {
            return Err(CacheError::InvalidConfig(format!(
                "the REST transport only supports {} client intelligence, got {}",
                ClientIntelligence::Basic,
                config.client_intelligence
            )));
        }
        if config.servers.is_empty() {
            return Err(CacheError::InvalidConfig("no servers configured".to_string()));
        }

        let base_urls = config
            .servers
            .iter()
            .map(|server| {
                Url::parse(&format!("http://{server}/rest/v2/")).map_err(
                    |e| CacheError::InvalidConfig(format!("invalid server address {server}: {e}")),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_urls,
            next: AtomicUsize::new(0),
            username: config.username.clone(),
            password: config.password.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// Base URL for the next request
    fn base_url(&self) -> &Url {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.base_urls.len();
        &self.base_urls[i]
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Stopped);
        }
        let url = endpoint_url(self.base_url(), segments)?;
        let builder = self.client.request(method, url);
        Ok(match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        })
    }
}

/// Append path segments to a base URL, escaping each one
pub(crate) fn endpoint_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| CacheError::InvalidConfig(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Pass successful responses through, turn the rest into `CacheError::Server`
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body
    };
    Err(CacheError::Server {
        status: status.as_u16(),
        message,
    })
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    hit: Value,
}

/// Extract hit values from a search response body
pub(crate) fn parse_search_hits(body: &str) -> Result<Vec<String>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    response
        .hits
        .into_iter()
        .map(|h| serde_json::to_string(&h.hit).map_err(CacheError::from))
        .collect()
}

/// The schema endpoint answers 200 even when the proto file has errors;
/// those are reported in an `error` object.
pub(crate) fn check_schema_response(name: &str, body: &str) -> Result<()> {
    if body.trim().is_empty() {
        return Ok(());
    }
    let value: Value = serde_json::from_str(body)?;
    match value.get("error") {
        None | Some(Value::Null) => Ok(()),
        Some(error) => {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| error.to_string(), str::to_string);
            Err(CacheError::Schema {
                name: name.to_string(),
                message,
            })
        }
    }
}

#[async_trait]
impl RemoteCacheTransport for RestTransport {
    async fn ping(&self) -> Result<()> {
        let response = self.request(Method::GET, &["server"])?.send().await?;
        check(response).await?;
        Ok(())
    }

    async fn cache_exists(&self, name: &str) -> Result<bool> {
        let response = self.request(Method::HEAD, &["caches", name])?.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            _ => check(response).await.map(|_| true),
        }
    }

    async fn create_cache(
        &self,
        name: &str,
        template: DefaultTemplate,
        flags: &[AdminFlag],
    ) -> Result<bool> {
        let mut request = self
            .request(Method::POST, &["caches", name])?
            .query(&[("template", template.template_name())]);
        if let Some(flags) = AdminFlag::header_value(flags) {
            request = request.header(FLAGS_HEADER, flags);
        }

        let response = request.send().await?;
        match response.status() {
            // someone else created it between our existence check and now
            StatusCode::CONFLICT => Ok(false),
            _ => check(response).await.map(|_| true),
        }
    }

    async fn register_schema(&self, name: &str, content: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, &["schemas", name])?
            .header(CONTENT_TYPE, "text/plain")
            .body(content.to_string())
            .send()
            .await?;
        let body = check(response).await?.text().await?;
        check_schema_response(name, &body)
    }

    async fn put(&self, cache: &str, key: &str, payload: String, media_type: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, &["caches", cache, key])?
            .header(CONTENT_TYPE, media_type)
            .body(payload)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn get(&self, cache: &str, key: &str, media_type: &str) -> Result<Option<String>> {
        let response = self
            .request(Method::GET, &["caches", cache, key])?
            .header(ACCEPT, media_type)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response).await?.text().await?))
    }

    async fn remove(&self, cache: &str, key: &str) -> Result<bool> {
        let response = self
            .request(Method::DELETE, &["caches", cache, key])?
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            _ => check(response).await.map(|_| true),
        }
    }

    async fn size(&self, cache: &str) -> Result<u64> {
        let response = self
            .request(Method::GET, &["caches", cache])?
            .query(&[("action", "size")])
            .send()
            .await?;
        let body = check(response).await?.text().await?;
        body.trim()
            .parse()
            .map_err(|_| CacheError::Serialization(format!("unexpected size response: {body}")))
    }

    async fn clear(&self, cache: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &["caches", cache])?
            .query(&[("action", "clear")])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn query(&self, cache: &str, query: &str) -> Result<Vec<String>> {
        let response = self
            .request(Method::GET, &["caches", cache])?
            .query(&[("action", "search"), ("query", query)])
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body = check(response).await?.text().await?;
        parse_search_hits(&body)
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
