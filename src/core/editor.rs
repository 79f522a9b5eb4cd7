use crate::core::Question;
use crate::utils::error::{QuizError, Result};
use crate::utils::validation::Validate;

/// 草稿中的題目清單與排除清單
#[derive(Debug, Clone, Default)]
pub struct QuestionEditor {
    questions: Vec<Question>,
    exclusions: Vec<String>,
}

impl QuestionEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds an editor from saved state.
    pub fn from_parts(questions: Vec<Question>, exclusions: Vec<String>) -> Self {
        Self {
            questions,
            exclusions,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 直接附加，不檢查重複
    pub fn add(&mut self, question: Question) {
        self.questions.push(question);
    }

    pub fn extend(&mut self, questions: impl IntoIterator<Item = Question>) {
        self.questions.extend(questions);
    }

    pub fn add_blank(&mut self) -> &Question {
        self.questions.push(Question::blank());
        &self.questions[self.questions.len() - 1]
    }

    /// 移除題目並把內容記進排除清單，之後出題時會一併送出
    pub fn remove_at(&mut self, index: usize) -> Result<Question> {
        self.check_index(index)?;
        let removed = self.questions.remove(index);
        self.exclusions.push(removed.content.clone());
        tracing::debug!(
            "Removed question {} ({} excluded so far)",
            removed.id,
            self.exclusions.len()
        );
        Ok(removed)
    }

    /// Replaces the question at `index` wholesale.
    pub fn edit(&mut self, index: usize, question: Question) -> Result<()> {
        self.check_index(index)?;
        question.validate()?;
        self.questions[index] = question;
        Ok(())
    }

    pub fn into_parts(self) -> (Vec<Question>, Vec<String>) {
        (self.questions, self.exclusions)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.questions.len() {
            return Err(QuizError::OutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        Ok(())
    }
}
