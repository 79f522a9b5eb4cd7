use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Index {index} is out of range (length {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Correct answer '{answer}' is not one of the options")]
    AnswerNotInOptions { answer: String },

    #[error("A quiz needs at least one question")]
    NoQuestions,

    #[error("You must be logged in to create a quiz")]
    NotSignedIn,

    #[error("Invalid draft state: {message}")]
    InvalidState { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Quiz {quiz_id} was created but its questions were not saved: {message}")]
    PartialFailure { quiz_id: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Network,
    PartialFailure,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QuizError {
    pub fn invalid_value(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        QuizError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QuizError::OutOfRange { .. }
            | QuizError::MissingField { .. }
            | QuizError::InvalidValue { .. }
            | QuizError::AnswerNotInOptions { .. }
            | QuizError::NoQuestions
            | QuizError::NotSignedIn
            | QuizError::InvalidState { .. } => ErrorCategory::Validation,
            QuizError::ApiError(_)
            | QuizError::HttpStatus { .. }
            | QuizError::MalformedResponse { .. } => ErrorCategory::Network,
            QuizError::PartialFailure { .. } => ErrorCategory::PartialFailure,
            QuizError::ConfigError { .. } | QuizError::ConfigValidationError { .. } => {
                ErrorCategory::Configuration
            }
            QuizError::IoError(_) | QuizError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::PartialFailure | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的單行訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            QuizError::ApiError(e) if e.is_timeout() => {
                "The request timed out before the service answered".to_string()
            }
            QuizError::ApiError(e) if e.is_connect() => {
                "Could not reach the service, check your connection".to_string()
            }
            QuizError::ApiError(_) => "The request to the service failed".to_string(),
            QuizError::HttpStatus { status, message } if message.is_empty() => {
                format!("The service answered with status {}", status)
            }
            QuizError::HttpStatus { message, .. } => message.clone(),
            QuizError::MalformedResponse { .. } => {
                "The service returned a response that could not be read".to_string()
            }
            QuizError::PartialFailure { .. } => {
                "The quiz was created but its questions could not be saved".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            QuizError::OutOfRange { .. } => "Pick a question number from the current list",
            QuizError::MissingField { .. } | QuizError::InvalidValue { .. } => {
                "Fill in the highlighted field and try again"
            }
            QuizError::AnswerNotInOptions { .. } => {
                "Choose the correct answer from the listed options"
            }
            QuizError::NoQuestions => "Generate or add at least one question before publishing",
            QuizError::NotSignedIn => "Sign in with a teacher account and retry",
            QuizError::InvalidState { .. } => "Start a new draft",
            QuizError::ApiError(_) | QuizError::HttpStatus { .. } => {
                "Check the service URL and your network, then retry"
            }
            QuizError::MalformedResponse { .. } => {
                "Retry; if it keeps failing the service may be misconfigured"
            }
            QuizError::PartialFailure { .. } => {
                "Publish again to save the questions into the same quiz"
            }
            QuizError::ConfigError { .. } | QuizError::ConfigValidationError { .. } => {
                "Fix the configuration file and run again"
            }
            QuizError::IoError(_) => "Check the file path and permissions",
            QuizError::SerializationError(_) => "The draft file may be corrupted",
        }
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
