//! Typed HTTP client for the pizarra API
//!
//! Thin request/response mapping only. Transport failures surface on the
//! first attempt; chunked transfers are cheap to rerun, so nothing here
//! retries behind the caller's back.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;

use crate::store::Category;

use super::{ClientError, ClientResult};

/// Receipt for a stored entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredEntry {
    pub key: String,
    pub category: Category,
    pub ttl: u64,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A fetched message-shaped entry. `category` is `None` for entries whose
/// metadata sidecar was lost.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedMessage {
    pub key: String,
    pub content: String,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerStatus {
    pub ack: String,
    pub version: String,
    #[serde(default)]
    pub client: Option<PeerInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeerInfo {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize)]
struct FlushResponse {
    flushed: usize,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct ApiClient {
    base_url: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url =
            Url::parse(base_url).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }
        let client = Client::builder()
            .user_agent(concat!("pizarra/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self
            .base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        Ok(self.client.request(method, url))
    }

    async fn send(&self, request: RequestBuilder, key: Option<&str>) -> ClientResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Transport { source })?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let detail = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body),
            Err(_) => String::new(),
        };
        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound {
                key: key.unwrap_or_default().to_string(),
            },
            StatusCode::FORBIDDEN => ClientError::Forbidden { detail },
            _ => ClientError::Server { status, detail },
        })
    }

    pub async fn store_message(
        &self,
        content: &str,
        category: Category,
        ttl: Option<u64>,
    ) -> ClientResult<StoredEntry> {
        let body = serde_json::json!({
            "content": content,
            "category": category.as_str(),
            "ttl": ttl,
        });
        let request = self.request(Method::POST, "api/v1/messages")?.json(&body);
        let response = self.send(request, None).await?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport { source })
    }

    pub async fn fetch_message(&self, key: &str) -> ClientResult<FetchedMessage> {
        let request = self.request(Method::GET, &format!("api/v1/messages/{key}"))?;
        let response = self.send(request, Some(key)).await?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport { source })
    }

    pub async fn delete_message(&self, key: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, &format!("api/v1/messages/{key}"))?;
        self.send(request, Some(key)).await?;
        Ok(())
    }

    pub async fn touch_message(&self, key: &str, ttl: Option<u64>) -> ClientResult<StoredEntry> {
        let body = serde_json::json!({ "ttl": ttl });
        let request = self
            .request(Method::PUT, &format!("api/v1/messages/{key}/ttl"))?
            .json(&body);
        let response = self.send(request, Some(key)).await?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport { source })
    }

    pub async fn store_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        ttl: Option<u64>,
    ) -> ClientResult<StoredEntry> {
        let mut request = self
            .request(Method::POST, "api/v1/files")?
            .header("X-Filename", urlencoding::encode(filename).into_owned())
            .body(bytes);
        if let Some(ttl) = ttl {
            request = request.header("X-TTL", ttl.to_string());
        }
        let response = self.send(request, None).await?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport { source })
    }

    /// Fetch file bytes. The second element is the stored file name, when
    /// the server still knows it.
    pub async fn fetch_file(&self, key: &str) -> ClientResult<(Vec<u8>, Option<String>)> {
        let request = self.request(Method::GET, &format!("api/v1/files/{key}"))?;
        let response = self.send(request, Some(key)).await?;

        let filename = response
            .headers()
            .get("X-Filename")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| urlencoding::decode(v).ok())
            .map(|v| v.into_owned());
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { source })?;
        Ok((bytes.to_vec(), filename))
    }

    pub async fn delete_file(&self, key: &str) -> ClientResult<()> {
        let request = self.request(Method::DELETE, &format!("api/v1/files/{key}"))?;
        self.send(request, Some(key)).await?;
        Ok(())
    }

    pub async fn touch_file(&self, key: &str, ttl: Option<u64>) -> ClientResult<StoredEntry> {
        let body = serde_json::json!({ "ttl": ttl });
        let request = self
            .request(Method::PUT, &format!("api/v1/files/{key}/ttl"))?
            .json(&body);
        let response = self.send(request, Some(key)).await?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport { source })
    }

    pub async fn status(&self) -> ClientResult<ServerStatus> {
        let request = self.request(Method::GET, "api/v1/clipboard")?;
        let response = self.send(request, None).await?;
        response
            .json()
            .await
            .map_err(|source| ClientError::Transport { source })
    }

    /// Drop every entry on the server. Returns the flushed record count.
    pub async fn flush(&self) -> ClientResult<usize> {
        let request = self.request(Method::DELETE, "api/v1/clipboard")?;
        let response = self.send(request, None).await?;
        let flushed: FlushResponse = response
            .json()
            .await
            .map_err(|source| ClientError::Transport { source })?;
        Ok(flushed.flushed)
    }
}
