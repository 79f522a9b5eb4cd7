use crate::adapters::{ensure_success, BackendClient};
use crate::core::AuthProvider;
use crate::domain::model::{AuthIdentity, Role};
use crate::utils::error::{QuizError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// `token` 與 `signup` 的回應；註冊需要信箱確認時只會回傳 user 本身
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Session { access_token: String, user: AuthUser },
    UserOnly(AuthUser),
}

impl AuthResponse {
    fn into_identity(self, fallback_email: &str) -> AuthIdentity {
        let (user, access_token) = match self {
            AuthResponse::Session { access_token, user } => (user, Some(access_token)),
            AuthResponse::UserOnly(user) => (user, None),
        };
        AuthIdentity {
            id: user.id,
            email: user.email.unwrap_or_else(|| fallback_email.to_string()),
            access_token,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    role: Option<String>,
}

/// 帳號與 `profiles` 資料表
#[derive(Debug, Clone)]
pub struct RestAuthProvider {
    backend: BackendClient,
}

impl RestAuthProvider {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    async fn post_credentials(&self, url: &str, query: &[(&str, &str)], email: &str, password: &str) -> Result<AuthIdentity> {
        let mut request = self.backend.request(Method::POST, url, None);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body = ensure_success(response).await?.text().await?;

        let parsed: AuthResponse = serde_json::from_str(&body).map_err(|e| QuizError::MalformedResponse {
            message: format!("auth response: {}", e),
        })?;
        Ok(parsed.into_identity(email))
    }
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity> {
        tracing::debug!("Signing in {}", email);
        let identity = self
            .post_credentials(&self.backend.auth_url("token"), &[("grant_type", "password")], email, password)
            .await?;

        if identity.access_token.is_none() {
            return Err(QuizError::MalformedResponse {
                message: "sign-in response has no access token".to_string(),
            });
        }
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity> {
        tracing::debug!("Registering {}", email);
        self.post_credentials(&self.backend.auth_url("signup"), &[], email, password)
            .await
    }

    async fn fetch_role(&self, identity: &AuthIdentity) -> Result<Option<Role>> {
        let filter = format!("eq.{}", identity.id);
        let response = self
            .backend
            .request(Method::GET, &self.backend.rest_url("profiles"), identity.access_token.as_deref())
            .query(&[("id", filter.as_str()), ("select", "role")])
            .send()
            .await?;
        let rows: Vec<ProfileRow> = ensure_success(response).await?.json().await?;

        let role = rows
            .into_iter()
            .next()
            .and_then(|row| row.role)
            .and_then(|role| match role.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    tracing::warn!("⚠️ Ignoring unknown profile role: {}", e);
                    None
                }
            });
        Ok(role)
    }

    async fn insert_profile(&self, identity: &AuthIdentity, role: Role) -> Result<()> {
        let response = self
            .backend
            .request(Method::POST, &self.backend.rest_url("profiles"), identity.access_token.as_deref())
            .header("Prefer", "return=minimal")
            .json(&json!({ "id": identity.id, "email": identity.email, "role": role }))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .backend
            .request(Method::POST, &self.backend.auth_url("logout"), Some(access_token))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
