use crate::adapters::{ensure_success, BackendClient};
use crate::core::QuizStore;
use crate::domain::model::{NewQuizRecord, QuestionRow, UserSession};
use crate::utils::error::{QuizError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value as JsonValue;

/// REST 資料表：`quizzes` 與 `questions`
#[derive(Debug, Clone)]
pub struct RestQuizStore {
    backend: BackendClient,
}

impl RestQuizStore {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

/// 回傳可能是陣列或單一物件，取第一列的 id
fn created_id(body: &JsonValue) -> Option<String> {
    let row = match body {
        JsonValue::Array(rows) => rows.first()?,
        other => other,
    };
    match row.get("id")? {
        JsonValue::String(id) => Some(id.clone()),
        JsonValue::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[async_trait]
impl QuizStore for RestQuizStore {
    async fn create_quiz(&self, session: &UserSession, quiz: &NewQuizRecord) -> Result<String> {
        let url = self.backend.rest_url("quizzes");
        tracing::debug!("Creating quiz '{}' at {}", quiz.title, url);

        let response = self
            .backend
            .request(Method::POST, &url, Some(&session.access_token))
            .header("Prefer", "return=representation")
            .json(quiz)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let status = response.status();
        let body = response.text().await?;

        // 請求已成功，測驗可能已經建立；讀不到 id 時至少留下紀錄
        let quiz_id = serde_json::from_str::<JsonValue>(&body)
            .ok()
            .and_then(|value| created_id(&value));
        quiz_id.ok_or_else(|| {
            tracing::warn!(
                "⚠️ Quiz '{}' may have been created (status {}) but the response carried no id: {}",
                quiz.title,
                status,
                body
            );
            QuizError::MalformedResponse {
                message: format!("created quiz has no id (status {})", status),
            }
        })
    }

    async fn insert_questions(&self, session: &UserSession, rows: &[QuestionRow]) -> Result<()> {
        let url = self.backend.rest_url("questions");
        tracing::debug!("Inserting {} question rows at {}", rows.len(), url);

        let response = self
            .backend
            .request(Method::POST, &url, Some(&session.access_token))
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
