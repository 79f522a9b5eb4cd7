pub mod workflow;

pub use workflow::{render_draft, GenerateOutcome, HttpDraft, QuestionInput, SettingsOverrides, Workflow};
