use crate::adapters::{build_client, ensure_success};
use crate::core::{GenerationRequest, Question, QuestionGenerator};
use crate::utils::error::{QuizError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    questions: Vec<Question>,
}

/// 以 multipart 表單呼叫出題服務
#[derive(Debug, Clone)]
pub struct HttpQuestionGenerator {
    client: Client,
    endpoint: String,
}

impl HttpQuestionGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    fn build_form(request: &GenerationRequest) -> Result<Form> {
        let settings = serde_json::to_string(&request.settings)?;
        let mut form = Form::new().text("settings", settings);

        if let Some(file) = &request.file {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)?;
            form = form.part("file", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl QuestionGenerator for HttpQuestionGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>> {
        let form = Self::build_form(request)?;

        tracing::debug!("Making generation request to: {}", self.endpoint);
        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        tracing::debug!("Generation response status: {}", response.status());

        let body = ensure_success(response).await?.text().await?;
        let parsed: GenerationResponse =
            serde_json::from_str(&body).map_err(|e| QuizError::MalformedResponse {
                message: e.to_string(),
            })?;

        Ok(parsed.questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Attachment, CorrectAnswer, QuizSettings};
    use httpmock::prelude::*;

    fn request(exclusions: &[String]) -> GenerationRequest {
        let settings = QuizSettings {
            title: "Algebra".into(),
            ..QuizSettings::default()
        };
        GenerationRequest::new(&settings, exclusions)
    }

    #[tokio::test]
    async fn test_generate_parses_questions() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/generate-questions")
                .body_contains(r#""title":"Algebra""#)
                .body_contains(r#""excludedQuestions":["What is x?"]"#);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "questions": [
                        {
                            "id": "g-1",
                            "content": "Solve 2x = 4",
                            "options": ["1", "2", "3", "4"],
                            "correctAnswer": "2",
                            "explanation": "Divide both sides by 2"
                        },
                        {
                            "content": "Solve x + 1 = 3",
                            "options": ["2", "3"],
                            "correctAnswer": ["2"]
                        }
                    ]
                }));
        });

        let generator =
            HttpQuestionGenerator::new(server.url("/api/generate-questions"), Duration::from_secs(5)).unwrap();
        let questions = generator
            .generate(&request(&["What is x?".to_string()]))
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id.as_str(), "g-1");
        assert_eq!(questions[0].correct_answer, CorrectAnswer::Single("2".into()));
        assert_eq!(questions[1].correct_answer.primary(), "2");
        assert_ne!(questions[0].id, questions[1].id);
    }

    #[tokio::test]
    async fn test_generate_sends_attachment() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/generate")
                .body_contains(r#"name="file"; filename="chapter.txt""#)
                .body_contains("Linear equations have one unknown");
            then.status(200).json_body(serde_json::json!({ "questions": [] }));
        });

        let mut request = request(&[]);
        request.file = Some(
            Attachment::new("chapter.txt", b"Linear equations have one unknown".to_vec()).unwrap(),
        );

        let generator = HttpQuestionGenerator::new(server.url("/generate"), Duration::from_secs(5)).unwrap();
        let questions = generator.generate(&request).await.unwrap();

        api_mock.assert();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn test_generate_non_success_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/generate");
            then.status(500).json_body(serde_json::json!({ "message": "model unavailable" }));
        });

        let generator = HttpQuestionGenerator::new(server.url("/generate"), Duration::from_secs(5)).unwrap();
        let err = generator.generate(&request(&[])).await.unwrap_err();

        assert!(matches!(err, QuizError::HttpStatus { status: 500, .. }));
        assert_eq!(err.user_friendly_message(), "model unavailable");
    }

    #[tokio::test]
    async fn test_generate_malformed_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/generate");
            then.status(200).json_body(serde_json::json!({ "items": [] }));
        });

        let generator = HttpQuestionGenerator::new(server.url("/generate"), Duration::from_secs(5)).unwrap();
        let err = generator.generate(&request(&[])).await.unwrap_err();

        assert!(matches!(err, QuizError::MalformedResponse { .. }));
    }
}
