use crate::core::{GenerationRequest, Question, QuestionGenerator, QuizSettings};

/// 呼叫出題服務並記錄 loading / error 狀態
///
/// Failures never propagate: the caller gets an empty list and the message is
/// kept in [`GenerationOrchestrator::error`]. There is no retry.
pub struct GenerationOrchestrator<G: QuestionGenerator> {
    generator: G,
    loading: bool,
    error: Option<String>,
}

impl<G: QuestionGenerator> GenerationOrchestrator<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
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

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn generate(&mut self, settings: &QuizSettings, exclusions: &[String]) -> Vec<Question> {
        self.loading = true;
        self.error = None;

        let request = GenerationRequest::new(settings, exclusions);
        tracing::info!(
            "🤖 Requesting {} {} questions for '{}' ({} excluded{})",
            request.settings.num_questions,
            request.settings.difficulty,
            request.settings.title,
            request.settings.excluded_questions.len(),
            if request.file.is_some() { ", with attachment" } else { "" }
        );

        let outcome = self.generator.generate(&request).await;
        self.loading = false;

        match outcome {
            Ok(questions) => {
                tracing::info!("🤖 Received {} generated questions", questions.len());
                questions
            }
            Err(e) => {
                tracing::error!(
                    "❌ Question generation failed: {} (Category: {:?})",
                    e,
                    e.category()
                );
                self.error = Some(e.user_friendly_message());
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CorrectAnswer;
    use crate::utils::error::{QuizError, Result};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockGenerator {
        requests: Arc<Mutex<Vec<GenerationRequest>>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl QuestionGenerator for MockGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(QuizError::HttpStatus {
                    status: 503,
                    message: "model overloaded".to_string(),
                });
            }
            Ok((0..request.settings.num_questions)
                .map(|i| Question {
                    content: format!("Generated {}", i),
                    options: vec!["yes".into(), "no".into()],
                    correct_answer: CorrectAnswer::Single("yes".into()),
                    ..Question::blank()
                })
                .collect())
        }
    }

    fn algebra() -> QuizSettings {
        QuizSettings {
            title: "Algebra".into(),
            ..QuizSettings::default()
        }
    }

    #[tokio::test]
    async fn test_generate_passes_settings_and_exclusions() {
        let generator = MockGenerator::default();
        let mut orchestrator = GenerationOrchestrator::new(generator.clone());

        let questions = orchestrator
            .generate(&algebra(), &["Removed earlier".to_string()])
            .await;

        assert_eq!(questions.len(), 5);
        assert!(!orchestrator.is_loading());
        assert!(orchestrator.error().is_none());

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].settings.title, "Algebra");
        assert_eq!(requests[0].settings.excluded_questions, vec!["Removed earlier"]);
        assert!(requests[0].file.is_none());
    }

    #[tokio::test]
    async fn test_generate_failure_returns_empty_with_message() {
        let generator = MockGenerator {
            fail: true,
            ..MockGenerator::default()
        };
        let mut orchestrator = GenerationOrchestrator::new(generator);

        let questions = orchestrator.generate(&algebra(), &[]).await;

        assert!(questions.is_empty());
        assert!(!orchestrator.is_loading());
        assert_eq!(orchestrator.error(), Some("model overloaded"));
    }

    #[tokio::test]
    async fn test_next_request_clears_previous_error() {
        let mut orchestrator = GenerationOrchestrator::new(MockGenerator {
            fail: true,
            ..MockGenerator::default()
        });
        orchestrator.generate(&algebra(), &[]).await;
        assert!(orchestrator.error().is_some());

        orchestrator.generator.fail = false;
        let questions = orchestrator.generate(&algebra(), &[]).await;
        assert_eq!(questions.len(), 5);
        assert!(orchestrator.error().is_none());
    }
}
