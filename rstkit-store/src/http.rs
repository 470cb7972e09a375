//! HTTP object store speaking plain `HEAD`/`PUT` on `{endpoint}/{bucket}/{key}`.

use async_trait::async_trait;
use reqwest::{header, StatusCode, Url};
use tracing::debug;

use crate::store::{ObjectStore, StoreError};

#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: Url,
    bucket: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, bucket: &str, token: Option<String>) -> Result<Self, StoreError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| StoreError::InvalidEndpoint(endpoint.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::InvalidEndpoint(endpoint.to_string()));
        }
        if bucket.is_empty() {
            return Err(StoreError::InvalidEndpoint(format!("{endpoint} (empty bucket)")));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            bucket: bucket.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// URL for `key`. Segments are percent-encoded, so a key never adds path levels.
    pub fn object_url(&self, key: &str) -> Result<Url, StoreError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(&self.bucket)
            .push(key);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let url = self.object_url(key)?;
        let response = self.request(reqwest::Method::HEAD, url.clone()).send().await?;
        debug!(%url, status = %response.status(), "store HEAD");
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::Unavailable(format!("HEAD {url}: {status}"))),
        }
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<(), StoreError> {
        let url = self.object_url(key)?;
        let response = self
            .request(reqwest::Method::PUT, url.clone())
            // Conditional create: stores that honor it refuse to replace the key.
            .header(header::IF_NONE_MATCH, "*")
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await?;
        debug!(%url, status = %response.status(), bytes = content.len(), "store PUT");
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::PRECONDITION_FAILED | StatusCode::CONFLICT => {
                Err(StoreError::AlreadyExists(key.to_string()))
            }
            status => Err(StoreError::Unavailable(format!("PUT {url}: {status}"))),
        }
    }

    fn describe(&self) -> String {
        format!("http:{}/{}", self.endpoint.as_str().trim_end_matches('/'), self.bucket)
    }
}
