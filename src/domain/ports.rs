use crate::domain::model::{
    AuthIdentity, GenerationRequest, NewQuizRecord, Question, QuestionRow, Role, UserSession,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 外部 AI 出題服務
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>>;
}

/// 外部資料儲存：建立測驗、批次寫入題目
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Returns the identifier of the created quiz.
    async fn create_quiz(&self, session: &UserSession, quiz: &NewQuizRecord) -> Result<String>;
    async fn insert_questions(&self, session: &UserSession, rows: &[QuestionRow]) -> Result<()>;
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity>;
    /// `None` when no profile row exists.
    async fn fetch_role(&self, identity: &AuthIdentity) -> Result<Option<Role>>;
    async fn insert_profile(&self, identity: &AuthIdentity, role: Role) -> Result<()>;
    async fn sign_out(&self, access_token: &str) -> Result<()>;
}
