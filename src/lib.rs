pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{BackendClient, HttpQuestionGenerator, RestAuthProvider, RestQuizStore};
pub use app::{GenerateOutcome, QuestionInput, SettingsOverrides, Workflow};
pub use config::{AppConfig, LocalStorage};
#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};
pub use crate::core::draft::{DraftPhase, DraftStatus, QuizDraft};
pub use crate::core::editor::QuestionEditor;
pub use crate::core::form::QuestionForm;
pub use crate::core::generation::GenerationOrchestrator;
pub use crate::core::session::{AuthService, SessionContext};
pub use domain::model::{CorrectAnswer, Question, QuestionType, QuizRef, QuizSettings};
pub use utils::error::{QuizError, Result};
