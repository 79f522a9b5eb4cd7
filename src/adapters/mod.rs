// Adapters layer: HTTP implementations of the domain ports.

pub mod auth;
pub mod generator;
pub mod store;

pub use auth::RestAuthProvider;
pub use generator::HttpQuestionGenerator;
pub use store::RestQuizStore;

use crate::utils::error::{QuizError, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// 非 2xx 時把回應內容轉成錯誤
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(&body);
    tracing::debug!("Request failed with status {}: {}", status, body);
    Err(QuizError::HttpStatus {
        status: status.as_u16(),
        message,
    })
}

pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    body.trim().to_string()
}

/// Backend-as-a-service connection shared by the store and auth adapters.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url: String = base_url.into();
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// 帶上 apikey 與 Bearer；沒有使用者 token 時以 anon key 代替
    pub(crate) fn request(&self, method: Method, url: &str, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token
            .filter(|token| !token.is_empty())
            .unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}
