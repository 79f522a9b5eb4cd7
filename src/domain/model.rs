use crate::utils::error::{QuizError, Result};
use crate::utils::validation::{
    validate_file_extension, validate_non_empty_string, validate_positive_number, Validate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 為字串型列舉產生 `as_str`、`Display` 與 `FromStr`
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = QuizError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(QuizError::invalid_value(
                        stringify!($name),
                        other,
                        format!("expected one of: {}", [$($text),+].join(", ")),
                    )),
                }
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    TrueFalse,
    OpenEnded,
}

str_enum!(QuestionType {
    MultipleChoice => "multiple_choice",
    TrueFalse => "true_false",
    OpenEnded => "open_ended",
});

/// 正確答案：單一值或多個值，在反序列化時就決定好
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    Single(String),
    Multiple(Vec<String>),
}

impl Default for CorrectAnswer {
    fn default() -> Self {
        CorrectAnswer::Single(String::new())
    }
}

impl CorrectAnswer {
    /// 存檔時只保留第一個值
    pub fn primary(&self) -> &str {
        match self {
            CorrectAnswer::Single(value) => value,
            CorrectAnswer::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            CorrectAnswer::Single(value) => vec![value.as_str()],
            CorrectAnswer::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default = "QuestionId::generate")]
    pub id: QuestionId,
    pub content: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_answer: CorrectAnswer,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// 手動新增用的空白題目：四個空選項
    pub fn blank() -> Self {
        Self {
            id: QuestionId::generate(),
            content: String::new(),
            question_type: QuestionType::MultipleChoice,
            options: vec![String::new(); 4],
            correct_answer: CorrectAnswer::default(),
            points: 1,
            explanation: None,
        }
    }

    /// Publishing additionally requires the question text, and for multiple
    /// choice every option and the answer filled in.
    pub fn validate_for_publish(&self) -> Result<()> {
        validate_non_empty_string("content", &self.content)?;
        self.validate()?;

        if self.question_type == QuestionType::MultipleChoice {
            for (index, option) in self.options.iter().enumerate() {
                validate_non_empty_string(&format!("options[{}]", index), option)?;
            }
            for answer in self.correct_answer.values() {
                validate_non_empty_string("correctAnswer", answer)?;
            }
        }
        Ok(())
    }
}

impl Validate for Question {
    fn validate(&self) -> Result<()> {
        validate_positive_number("points", u64::from(self.points), 1)?;

        if self.question_type == QuestionType::MultipleChoice {
            if self.options.is_empty() {
                return Err(QuizError::invalid_value(
                    "options",
                    "[]",
                    "multiple choice questions need at least one option",
                ));
            }
            let answers = self.correct_answer.values();
            if answers.is_empty() {
                return Err(QuizError::MissingField {
                    field: "correctAnswer".to_string(),
                });
            }
            for answer in answers {
                if !self.options.iter().any(|option| option == answer) {
                    return Err(QuizError::AnswerNotInOptions {
                        answer: answer.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

str_enum!(Difficulty {
    Easy => "easy",
    Medium => "medium",
    Hard => "hard",
});

/// 題目偏重理論、應用或混合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFocus {
    Theory,
    Application,
    #[default]
    Mixed,
}

str_enum!(QuestionFocus {
    Theory => "theory",
    Application => "application",
    Mixed => "mixed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFormat {
    #[default]
    MultipleChoice,
    TrueFalse,
}

str_enum!(QuestionFormat {
    MultipleChoice => "multiple_choice",
    TrueFalse => "true_false",
});

pub const ALLOWED_ATTACHMENT_EXTENSIONS: [&str; 4] = ["pdf", "txt", "doc", "docx"];

/// Source document sent along with a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let extension = validate_file_extension("file", &file_name, &ALLOWED_ATTACHMENT_EXTENSIONS)?;
        let mime_type = match extension.as_str() {
            "pdf" => "application/pdf",
            "txt" => "text/plain",
            "doc" => "application/msword",
            _ => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        };

        Ok(Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSettings {
    pub title: String,
    pub num_questions: u32,
    pub difficulty: Difficulty,
    pub question_type: QuestionFocus,
    pub format: QuestionFormat,
    pub time_limit: u32,
    #[serde(skip)]
    pub file: Option<Attachment>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            num_questions: 5,
            difficulty: Difficulty::Medium,
            question_type: QuestionFocus::Mixed,
            format: QuestionFormat::MultipleChoice,
            time_limit: 30,
            file: None,
        }
    }
}

impl Validate for QuizSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("title", &self.title)?;
        validate_positive_number("numQuestions", u64::from(self.num_questions), 1)?;
        validate_positive_number("timeLimit", u64::from(self.time_limit), 1)?;
        Ok(())
    }
}

/// 送給出題服務的 `settings` 欄位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub title: String,
    pub num_questions: u32,
    pub difficulty: Difficulty,
    pub question_type: QuestionFocus,
    pub format: QuestionFormat,
    pub time_limit: u32,
    pub excluded_questions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub settings: GenerationSettings,
    pub file: Option<Attachment>,
}

impl GenerationRequest {
    pub fn new(settings: &QuizSettings, exclusions: &[String]) -> Self {
        Self {
            settings: GenerationSettings {
                title: settings.title.clone(),
                num_questions: settings.num_questions,
                difficulty: settings.difficulty,
                question_type: settings.question_type,
                format: settings.format,
                time_limit: settings.time_limit,
                excluded_questions: exclusions.to_vec(),
            },
            file: settings.file.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    #[default]
    Student,
}

str_enum!(Role {
    Teacher => "teacher",
    Student => "student",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user: User,
    pub access_token: String,
}

/// Identity returned by the auth provider before the role is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub id: String,
    pub email: String,
    pub access_token: Option<String>,
}

/// 發佈後可分享的測驗
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRef {
    pub id: String,
    pub share_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuizRecord {
    pub title: String,
    pub description: String,
    pub time_limit: u32,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub quiz_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub points: u32,
}

impl QuestionRow {
    pub fn from_question(quiz_id: &str, question: &Question) -> Self {
        let options = match question.question_type {
            QuestionType::MultipleChoice => Some(question.options.clone()),
            _ => None,
        };

        Self {
            quiz_id: quiz_id.to_string(),
            content: question.content.clone(),
            question_type: question.question_type,
            options,
            correct_answer: question.correct_answer.primary().to_string(),
            points: question.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    pub settings: QuizSettings,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub excluded_questions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_quiz_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<QuizRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_question_shape() {
        let blank = Question::blank();
        assert_eq!(blank.content, "");
        assert_eq!(blank.options, vec!["", "", "", ""]);
        assert_eq!(blank.correct_answer, CorrectAnswer::Single(String::new()));
        assert_eq!(blank.question_type, QuestionType::MultipleChoice);
        assert!(blank.validate().is_ok());
        assert!(blank.validate_for_publish().is_err());
    }

    #[test]
    fn test_correct_answer_accepts_string_or_list() {
        let single: Question = serde_json::from_value(json!({
            "content": "2 + 2?",
            "options": ["3", "4"],
            "correctAnswer": "4"
        }))
        .unwrap();
        assert_eq!(single.correct_answer, CorrectAnswer::Single("4".to_string()));
        assert_eq!(single.points, 1);
        assert_eq!(single.question_type, QuestionType::MultipleChoice);
        assert!(!single.id.as_str().is_empty());

        let multiple: Question = serde_json::from_value(json!({
            "id": "q-7",
            "content": "Pick primes",
            "type": "multiple_choice",
            "options": ["2", "3", "4"],
            "correctAnswer": ["2", "3"],
            "points": 2,
            "explanation": "4 is composite"
        }))
        .unwrap();
        assert_eq!(multiple.id.as_str(), "q-7");
        assert_eq!(multiple.correct_answer.primary(), "2");
        assert_eq!(multiple.explanation.as_deref(), Some("4 is composite"));
    }

    #[test]
    fn test_multiple_choice_answer_must_be_an_option() {
        let mut question = Question::blank();
        question.content = "Capital of France?".to_string();
        question.options = vec!["Paris".into(), "Rome".into()];
        question.correct_answer = CorrectAnswer::Single("Berlin".into());
        assert!(matches!(
            question.validate(),
            Err(QuizError::AnswerNotInOptions { .. })
        ));

        question.correct_answer = CorrectAnswer::Multiple(vec!["Paris".into(), "Oslo".into()]);
        assert!(question.validate().is_err());

        question.correct_answer = CorrectAnswer::Single("Paris".into());
        assert!(question.validate().is_ok());

        question.points = 0;
        assert!(question.validate().is_err());
    }

    #[test]
    fn test_multiple_choice_needs_an_answer() {
        let question = Question {
            content: "Capital of France?".into(),
            options: vec!["Paris".into(), "Rome".into()],
            correct_answer: CorrectAnswer::Multiple(vec![]),
            ..Question::blank()
        };
        assert!(matches!(
            question.validate(),
            Err(QuizError::MissingField { ref field }) if field == "correctAnswer"
        ));
        assert!(question.validate_for_publish().is_err());

        let generated: Question = serde_json::from_value(json!({
            "content": "Capital of Italy?",
            "options": ["Paris", "Rome"],
            "correctAnswer": []
        }))
        .unwrap();
        assert!(generated.validate().is_err());
    }

    #[test]
    fn test_half_filled_skeleton_is_not_publishable() {
        let mut question = Question::blank();
        question.content = "Capital of France?".into();
        assert!(question.validate().is_ok());
        assert!(matches!(
            question.validate_for_publish(),
            Err(QuizError::MissingField { ref field }) if field == "options[0]"
        ));

        question.options = vec!["Paris".into(), "Rome".into()];
        assert!(matches!(
            question.validate_for_publish(),
            Err(QuizError::AnswerNotInOptions { .. })
        ));

        question.correct_answer = CorrectAnswer::Single("Paris".into());
        assert!(question.validate_for_publish().is_ok());
    }

    #[test]
    fn test_open_ended_answer_is_free_text() {
        let question = Question {
            question_type: QuestionType::OpenEnded,
            options: vec![],
            correct_answer: CorrectAnswer::Single("photosynthesis".into()),
            content: "How do plants make food?".into(),
            ..Question::blank()
        };
        assert!(question.validate_for_publish().is_ok());
    }

    #[test]
    fn test_question_row_collapses_answers() {
        let question = Question {
            content: "Pick primes".into(),
            options: vec!["2".into(), "3".into()],
            correct_answer: CorrectAnswer::Multiple(vec!["3".into(), "2".into()]),
            points: 3,
            ..Question::blank()
        };
        let row = QuestionRow::from_question("quiz-1", &question);
        assert_eq!(row.correct_answer, "3");
        assert_eq!(row.options, Some(vec!["2".to_string(), "3".to_string()]));

        let tf = Question {
            question_type: QuestionType::TrueFalse,
            correct_answer: CorrectAnswer::Multiple(vec![]),
            ..question
        };
        let row = QuestionRow::from_question("quiz-1", &tf);
        assert_eq!(row.options, None);
        assert_eq!(row.correct_answer, "");
        assert_eq!(serde_json::to_value(&row).unwrap()["type"], "true_false");
    }

    #[test]
    fn test_generation_settings_wire_format() {
        let settings = QuizSettings {
            title: "Algebra".into(),
            ..QuizSettings::default()
        };
        let request = GenerationRequest::new(&settings, &["Old question".to_string()]);
        let value = serde_json::to_value(&request.settings).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Algebra",
                "numQuestions": 5,
                "difficulty": "medium",
                "questionType": "mixed",
                "format": "multiple_choice",
                "timeLimit": 30,
                "excludedQuestions": ["Old question"]
            })
        );
    }

    #[test]
    fn test_settings_validation_requires_title() {
        let mut settings = QuizSettings::default();
        assert!(settings.validate().is_err());
        settings.title = "Algebra".into();
        assert!(settings.validate().is_ok());
        settings.time_limit = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_attachment_mime_types() {
        let pdf = Attachment::new("notes.pdf", vec![1, 2, 3]).unwrap();
        assert_eq!(pdf.mime_type, "application/pdf");
        let docx = Attachment::new("Chapter 1.DOCX", vec![]).unwrap();
        assert_eq!(
            docx.mime_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert!(Attachment::new("image.png", vec![]).is_err());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!(
            "true_false".parse::<QuestionFormat>().unwrap(),
            QuestionFormat::TrueFalse
        );
        assert!("extreme".parse::<Difficulty>().is_err());
        assert_eq!(QuestionFocus::Application.to_string(), "application");
    }
}
