//! HTTP client for `wordbook-server`.
//!
//! Endpoints used:
//! - `GET  /accounts/{id}/documents/{kind}` (404 means the document is absent)
//! - `PUT  /accounts/{id}/documents/{kind}`
//! - `POST /accounts/{id}/batch`
//! - `GET  /health`

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Serialize;

use super::{DocKind, RemoteDocument, RemoteStore};
use crate::error::RemoteError;
use crate::models::{FavoritesDocument, HistoryDocument};

/// Body of a batch commit request.
#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    documents: &'a [RemoteDocument],
}

/// Remote store backed by a `wordbook-server` instance.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    server_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRemoteStore {
    /// Creates a new client with explicit parameters.
    pub fn new(server_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Returns true if the server answers its health check.
    pub async fn check_server(&self) -> bool {
        let url = match self.build_url(&["health"]) {
            Ok(url) => url,
            Err(_) => return false,
        };
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Builds an HTTP URL from the server URL and path segments.
    ///
    /// Bare hosts get `http://`; websocket schemes are mapped to their HTTP
    /// counterparts.
    fn build_url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let base = if let Some(rest) = self.server_url.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if !self.server_url.starts_with("http://")
            && !self.server_url.starts_with("https://")
        {
            format!("http://{}", self.server_url)
        } else {
            self.server_url.clone()
        };

        let mut url = Url::parse(&base)
            .map_err(|e| RemoteError::Http(format!("invalid server URL '{}': {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Http(format!("server URL cannot be a base: {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn document_url(&self, account_id: &str, kind: DocKind) -> Result<Url, RemoteError> {
        self.build_url(&["accounts", account_id, "documents", kind.name()])
    }

    fn check_status(status: StatusCode) -> Result<(), RemoteError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(RemoteError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get(
        &self,
        account_id: &str,
        kind: DocKind,
    ) -> Result<Option<RemoteDocument>, RemoteError> {
        let response = self
            .client
            .get(self.document_url(account_id, kind)?)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check_status(response.status())?;

        let doc = match kind {
            DocKind::Favorites => RemoteDocument::Favorites(
                response
                    .json::<FavoritesDocument>()
                    .await
                    .map_err(|e| RemoteError::Decode(e.to_string()))?,
            ),
            DocKind::History => RemoteDocument::History(
                response
                    .json::<HistoryDocument>()
                    .await
                    .map_err(|e| RemoteError::Decode(e.to_string()))?,
            ),
        };
        Ok(Some(doc))
    }

    async fn set(&self, account_id: &str, doc: RemoteDocument) -> Result<(), RemoteError> {
        let request = self
            .client
            .put(self.document_url(account_id, doc.kind())?)
            .bearer_auth(&self.api_key);
        let request = match &doc {
            RemoteDocument::Favorites(d) => request.json(d),
            RemoteDocument::History(d) => request.json(d),
        };

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        Self::check_status(response.status())
    }

    async fn commit_batch(
        &self,
        account_id: &str,
        docs: Vec<RemoteDocument>,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .post(self.build_url(&["accounts", account_id, "batch"])?)
            .bearer_auth(&self.api_key)
            .json(&BatchRequest { documents: &docs })
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                Err(RemoteError::BatchRejected(body))
            }
            s => Err(RemoteError::Status(s.as_u16())),
        }
    }
}
