pub mod draft;
pub mod editor;
pub mod form;
pub mod generation;
pub mod session;

pub use crate::domain::model::{GenerationRequest, Question, QuizSettings};
pub use crate::domain::ports::{AuthProvider, QuestionGenerator, QuizStore, Storage};
pub use crate::utils::error::Result;
