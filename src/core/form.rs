use crate::core::Question;
use crate::domain::model::{CorrectAnswer, QuestionId, QuestionType};
use crate::utils::error::{QuizError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number};

const MIN_OPTIONS: usize = 2;

/// 手動出題表單
///
/// Holds one question being composed; `submit` validates it, hands back the
/// finished [`Question`] and resets the form for the next one.
#[derive(Debug, Clone)]
pub struct QuestionForm {
    editing: Option<QuestionId>,
    content: String,
    question_type: QuestionType,
    options: Vec<String>,
    correct_answer: String,
    points: u32,
    explanation: Option<String>,
}

impl Default for QuestionForm {
    fn default() -> Self {
        Self {
            editing: None,
            content: String::new(),
            question_type: QuestionType::MultipleChoice,
            options: vec![String::new(); MIN_OPTIONS],
            correct_answer: String::new(),
            points: 1,
            explanation: None,
        }
    }
}

impl QuestionForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以既有題目填入表單，送出時保留原本的 id
    pub fn from_question(question: &Question) -> Self {
        let mut options = question.options.clone();
        if options.len() < MIN_OPTIONS {
            options.resize(MIN_OPTIONS, String::new());
        }

        Self {
            editing: Some(question.id.clone()),
            content: question.content.clone(),
            question_type: question.question_type,
            options,
            correct_answer: question.correct_answer.primary().to_string(),
            points: question.points,
            explanation: question.explanation.clone(),
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn question_type(&self) -> QuestionType {
        self.question_type
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = content.into();
        self
    }

    pub fn set_type(&mut self, question_type: QuestionType) -> &mut Self {
        self.question_type = question_type;
        self
    }

    pub fn set_correct_answer(&mut self, answer: impl Into<String>) -> &mut Self {
        self.correct_answer = answer.into();
        self
    }

    pub fn set_points(&mut self, points: u32) -> &mut Self {
        self.points = points;
        self
    }

    pub fn set_explanation(&mut self, explanation: Option<String>) -> &mut Self {
        self.explanation = explanation;
        self
    }

    pub fn add_option(&mut self) -> &mut Self {
        self.options.push(String::new());
        self
    }

    pub fn set_option(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
        let len = self.options.len();
        let slot = self
            .options
            .get_mut(index)
            .ok_or(QuizError::OutOfRange { index, len })?;
        *slot = value.into();
        Ok(())
    }

    /// 整批取代選項，同樣至少兩個
    pub fn set_options(&mut self, options: Vec<String>) -> Result<()> {
        if options.len() < MIN_OPTIONS {
            return Err(QuizError::invalid_value(
                "options",
                options.len(),
                format!("a question keeps at least {} options", MIN_OPTIONS),
            ));
        }
        self.options = options;
        Ok(())
    }

    /// 至少保留兩個選項
    pub fn remove_option(&mut self, index: usize) -> Result<String> {
        let len = self.options.len();
        if index >= len {
            return Err(QuizError::OutOfRange { index, len });
        }
        if len <= MIN_OPTIONS {
            return Err(QuizError::invalid_value(
                "options",
                len,
                format!("a question keeps at least {} options", MIN_OPTIONS),
            ));
        }
        Ok(self.options.remove(index))
    }

    pub fn submit(&mut self) -> Result<Question> {
        let question = self.build()?;
        *self = Self::default();
        Ok(question)
    }

    fn build(&self) -> Result<Question> {
        validate_non_empty_string("content", &self.content)?;
        validate_positive_number("points", u64::from(self.points), 1)?;

        let (options, correct_answer) = match self.question_type {
            QuestionType::MultipleChoice => {
                for (index, option) in self.options.iter().enumerate() {
                    validate_non_empty_string(&format!("options[{}]", index), option)?;
                }
                validate_non_empty_string("correctAnswer", &self.correct_answer)?;
                if !self.options.contains(&self.correct_answer) {
                    return Err(QuizError::AnswerNotInOptions {
                        answer: self.correct_answer.clone(),
                    });
                }
                (
                    self.options.clone(),
                    CorrectAnswer::Multiple(vec![self.correct_answer.clone()]),
                )
            }
            QuestionType::TrueFalse => {
                if self.correct_answer != "true" && self.correct_answer != "false" {
                    return Err(QuizError::invalid_value(
                        "correctAnswer",
                        &self.correct_answer,
                        "expected 'true' or 'false'",
                    ));
                }
                (Vec::new(), CorrectAnswer::Single(self.correct_answer.clone()))
            }
            QuestionType::OpenEnded => {
                validate_non_empty_string("correctAnswer", &self.correct_answer)?;
                (Vec::new(), CorrectAnswer::Single(self.correct_answer.clone()))
            }
        };

        Ok(Question {
            id: self.editing.clone().unwrap_or_else(QuestionId::generate),
            content: self.content.trim().to_string(),
            question_type: self.question_type,
            options,
            correct_answer,
            points: self.points,
            explanation: self.explanation.clone(),
        })
    }
}
