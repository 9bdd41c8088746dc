use crate::connection::config::{StoreConfig, TokenKind};
use crate::core::{Result, StoreError, StorePath, child_count};
use crate::interface::StoreClient;
use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Realtime-database backend speaking the hosted store's REST protocol.
///
/// Every node is addressable as `{database_url}/{path}.json`; `GET` reads a
/// subtree (`null` when absent), `DELETE` removes it and `PATCH` merges the
/// request body into it.
pub struct RestStore {
    http: reqwest::Client,
    base: Url,
    auth: Option<(TokenKind, String)>,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        config.validate().map_err(StoreError::Config)?;

        let base = Url::parse(&config.database_url)
            .map_err(|e| StoreError::Config(format!("invalid database url: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(StoreError::Config(format!(
                "database url '{}' cannot hold paths",
                config.redacted_url()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| StoreError::Connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            auth: config.token.clone().map(|token| (config.token_kind, token)),
        })
    }

    /// REST endpoint for `path`.
    pub fn endpoint(&self, path: &StorePath) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                StoreError::Config("database url cannot hold paths".to_string())
            })?;
            segments.pop_if_empty();
            match path.segments().split_last() {
                None => {
                    segments.push(".json");
                }
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{last}.json"));
                }
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        path: &StorePath,
        query: &[(&str, &str)],
        body: Option<&Map<String, Value>>,
    ) -> std::result::Result<reqwest::Response, RequestFailure> {
        let url = self.endpoint(path).map_err(RequestFailure::Local)?;
        debug!(%method, path = %path, "store request");

        let mut request = self.http.request(method, url).query(query);
        if let Some((kind, token)) = &self.auth {
            request = request.query(&[(kind.query_param(), token.as_str())]);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(RequestFailure::Status(status, error_detail(&detail)))
    }
}

/// Why a single request did not succeed, before it is mapped onto the
/// store error taxonomy for the operation at hand.
enum RequestFailure {
    Local(StoreError),
    Transport(String),
    Status(StatusCode, String),
}

impl RequestFailure {
    fn into_store_error(self, path: &StorePath, on_write: bool) -> StoreError {
        match self {
            RequestFailure::Local(err) => err,
            RequestFailure::Status(StatusCode::NOT_FOUND, _) => {
                StoreError::NotFound(path.to_string())
            }
            RequestFailure::Status(status, detail) => {
                let message = format!("HTTP {status}: {detail}");
                if on_write {
                    StoreError::write(path, message)
                } else {
                    StoreError::read(path, message)
                }
            }
            RequestFailure::Transport(message) => {
                if on_write {
                    StoreError::write(path, message)
                } else {
                    StoreError::read(path, message)
                }
            }
        }
    }
}

/// The hosted store reports failures as `{"error": "..."}`.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl StoreClient for RestStore {
    #[instrument(skip_all, fields(path = %path))]
    async fn fetch_subtree(&self, path: &StorePath) -> Result<Option<Value>> {
        let response = self
            .send(Method::GET, path, &[], None)
            .await
            .map_err(|f| f.into_store_error(path, false))?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| StoreError::decode(path, e.to_string()))?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn delete_subtree(&self, path: &StorePath) -> Result<()> {
        self.send(Method::DELETE, path, &[], None)
            .await
            .map_err(|f| f.into_store_error(path, true))?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn patch_record(&self, path: &StorePath, fields: Map<String, Value>) -> Result<()> {
        self.send(Method::PATCH, path, &[("print", "silent")], Some(&fields))
            .await
            .map_err(|f| f.into_store_error(path, true))?;
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn count_children(&self, path: &StorePath) -> Result<usize> {
        let response = self
            .send(Method::GET, path, &[("shallow", "true")], None)
            .await
            .map_err(|f| f.into_store_error(path, false))?;
        let listing: Value = response
            .json()
            .await
            .map_err(|e| StoreError::decode(path, e.to_string()))?;
        Ok(child_count(&listing))
    }

    async fn ping(&self) -> Result<()> {
        let root = StorePath::root();
        match self.send(Method::GET, &root, &[("shallow", "true")], None).await {
            Ok(_) => Ok(()),
            Err(RequestFailure::Local(err)) => Err(err),
            Err(RequestFailure::Transport(message)) => Err(StoreError::Connection(message)),
            Err(RequestFailure::Status(status, detail)) => Err(StoreError::Connection(format!(
                "HTTP {status}: {detail}"
            ))),
        }
    }
}
