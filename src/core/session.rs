use crate::core::AuthProvider;
use crate::domain::model::{AuthIdentity, Role, User, UserSession};
use crate::utils::error::Result;
use crate::utils::validation::validate_non_empty_string;
use std::sync::{Arc, RwLock};

/// 登入狀態，由呼叫端建立後注入各控制器
#[derive(Debug, Default)]
pub struct SessionContext {
    current: RwLock<Option<UserSession>>,
}

impl SessionContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn init(&self, session: UserSession) {
        tracing::info!("🔐 Session started for {} ({})", session.user.email, session.user.role);
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
    }

    pub fn teardown(&self) -> Option<UserSession> {
        let previous = self.current.write().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(session) = &previous {
            tracing::info!("🔐 Session ended for {}", session.user.email);
        }
        previous
    }

    pub fn current(&self) -> Option<UserSession> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn user(&self) -> Option<User> {
        self.current().map(|session| session.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

pub struct AuthService<A: AuthProvider> {
    provider: A,
    session: Arc<SessionContext>,
    loading: bool,
    error: Option<String>,
}

impl<A: AuthProvider> AuthService<A> {
    pub fn new(provider: A, session: Arc<SessionContext>) -> Self {
        Self {
            provider,
            session,
            loading: false,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// 登入並從 profiles 讀取角色；找不到時視為學生
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<User> {
        self.begin();
        let outcome = self.sign_in_inner(email, password).await;
        self.finish(outcome)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str, role: Role) -> Result<User> {
        self.begin();
        let outcome = self.sign_up_inner(email, password, role).await;
        self.finish(outcome)
    }

    /// Remote logout is best effort; the local session is always torn down.
    pub async fn sign_out(&mut self) {
        if let Some(session) = self.session.teardown() {
            if let Err(e) = self.provider.sign_out(&session.access_token).await {
                tracing::warn!("⚠️ Remote sign-out failed: {}", e);
            }
        }
    }

    async fn sign_in_inner(&self, email: &str, password: &str) -> Result<User> {
        validate_credentials(email, password)?;
        let identity = self.provider.sign_in(email, password).await?;
        let role = self.provider.fetch_role(&identity).await?.unwrap_or_else(|| {
            tracing::warn!("No profile found for {}, defaulting to student", identity.email);
            Role::Student
        });
        Ok(self.start_session(identity, role))
    }

    async fn sign_up_inner(&self, email: &str, password: &str, role: Role) -> Result<User> {
        validate_credentials(email, password)?;
        let identity = self.provider.sign_up(email, password).await?;
        self.provider.insert_profile(&identity, role).await?;
        Ok(self.start_session(identity, role))
    }

    fn start_session(&self, identity: AuthIdentity, role: Role) -> User {
        let user = User {
            id: identity.id,
            email: identity.email,
            role,
        };
        self.session.init(UserSession {
            user: user.clone(),
            access_token: identity.access_token.unwrap_or_default(),
        });
        user
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    fn finish(&mut self, outcome: Result<User>) -> Result<User> {
        self.loading = false;
        if let Err(e) = &outcome {
            tracing::error!("❌ Authentication failed: {}", e);
            self.error = Some(e.user_friendly_message());
        }
        outcome
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    validate_non_empty_string("email", email)?;
    validate_non_empty_string("password", password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::QuizError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockAuth {
        profile_role: Option<Role>,
        inserted: Mutex<Vec<(String, Role)>>,
        signed_out: Mutex<Vec<String>>,
        reject: bool,
    }

    #[async_trait::async_trait]
    impl AuthProvider for MockAuth {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthIdentity> {
            if self.reject {
                return Err(QuizError::HttpStatus {
                    status: 400,
                    message: "Invalid login credentials".into(),
                });
            }
            Ok(AuthIdentity {
                id: "user-1".into(),
                email: email.into(),
                access_token: Some("token-1".into()),
            })
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<AuthIdentity> {
            Ok(AuthIdentity {
                id: "user-2".into(),
                email: email.into(),
                access_token: None,
            })
        }

        async fn fetch_role(&self, _identity: &AuthIdentity) -> Result<Option<Role>> {
            Ok(self.profile_role)
        }

        async fn insert_profile(&self, identity: &AuthIdentity, role: Role) -> Result<()> {
            self.inserted.lock().unwrap().push((identity.id.clone(), role));
            Ok(())
        }

        async fn sign_out(&self, access_token: &str) -> Result<()> {
            self.signed_out.lock().unwrap().push(access_token.into());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_sign_in_uses_profile_role() {
        let session = SessionContext::new();
        let mut auth = AuthService::new(
            MockAuth {
                profile_role: Some(Role::Teacher),
                ..MockAuth::default()
            },
            session.clone(),
        );

        let user = auth.sign_in("t@school.edu", "secret").await.unwrap();
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(session.current().unwrap().access_token, "token-1");
        assert!(!auth.is_loading());
    }

    #[tokio::test]
    async fn test_sign_in_without_profile_defaults_to_student() {
        let session = SessionContext::new();
        let mut auth = AuthService::new(MockAuth::default(), session.clone());

        let user = auth.sign_in("s@school.edu", "secret").await.unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(session.user().unwrap().id, "user-1");
    }

    #[tokio::test]
    async fn test_failed_sign_in_sets_error_and_no_session() {
        let session = SessionContext::new();
        let mut auth = AuthService::new(
            MockAuth {
                reject: true,
                ..MockAuth::default()
            },
            session.clone(),
        );

        assert!(auth.sign_in("t@school.edu", "wrong").await.is_err());
        assert_eq!(auth.error(), Some("Invalid login credentials"));
        assert!(!session.is_signed_in());

        assert!(matches!(
            auth.sign_in("", "x").await,
            Err(QuizError::MissingField { .. })
        ));
    }

    #[tokio::test]
    async fn test_sign_up_inserts_profile_then_sign_out() {
        let session = SessionContext::new();
        let mut auth = AuthService::new(MockAuth::default(), session.clone());

        let user = auth
            .sign_up("new@school.edu", "secret", Role::Teacher)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(
            auth.provider.inserted.lock().unwrap().as_slice(),
            &[("user-2".to_string(), Role::Teacher)]
        );

        auth.sign_out().await;
        assert!(!session.is_signed_in());
        assert_eq!(auth.provider.signed_out.lock().unwrap().len(), 1);
    }
}
