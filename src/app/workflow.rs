use crate::adapters::{BackendClient, HttpQuestionGenerator, RestAuthProvider, RestQuizStore};
use crate::config::AppConfig;
use crate::core::draft::{DraftPhase, QuizDraft};
use crate::core::form::QuestionForm;
use crate::core::session::{AuthService, SessionContext};
use crate::core::Storage;
use crate::domain::model::{
    Attachment, Difficulty, DraftSnapshot, Question, QuestionFocus, QuestionFormat, QuestionType, QuizRef, Role,
    User,
};
use crate::utils::error::{QuizError, Result};
use crate::utils::validation::validate_range;
use std::path::Path;
use std::sync::Arc;

pub type HttpDraft = QuizDraft<HttpQuestionGenerator, RestQuizStore>;

/// 命令列覆寫的出題設定；`None` 表示沿用草稿原值
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub title: Option<String>,
    pub num_questions: Option<u32>,
    pub difficulty: Option<Difficulty>,
    pub question_type: Option<QuestionFocus>,
    pub format: Option<QuestionFormat>,
    pub time_limit: Option<u32>,
}

/// 手動新增或編輯題目的欄位；未給的欄位保留表單原值
#[derive(Debug, Clone, Default)]
pub struct QuestionInput {
    pub content: Option<String>,
    pub question_type: Option<QuestionType>,
    /// Replaces the whole option list when non-empty.
    pub options: Vec<String>,
    pub answer: Option<String>,
    pub points: Option<u32>,
    pub explanation: Option<String>,
}

impl QuestionInput {
    fn apply(&self, form: &mut QuestionForm) -> Result<()> {
        if let Some(content) = &self.content {
            form.set_content(content.clone());
        }
        if let Some(question_type) = self.question_type {
            form.set_type(question_type);
        }
        if !self.options.is_empty() {
            form.set_options(self.options.clone())?;
        }
        if let Some(answer) = &self.answer {
            form.set_correct_answer(answer.clone());
        }
        if let Some(points) = self.points {
            form.set_points(points);
        }
        if let Some(explanation) = &self.explanation {
            form.set_explanation(Some(explanation.clone()));
        }
        Ok(())
    }
}

/// Result of one generation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOutcome {
    pub added: usize,
    pub total: usize,
    pub error: Option<String>,
}

/// Wires configuration, storage and the HTTP adapters into draft operations.
///
/// Every command loads the draft file, applies one operation and writes it back.
pub struct Workflow<S: Storage> {
    config: AppConfig,
    storage: S,
    session: Arc<SessionContext>,
}

impl<S: Storage> Workflow<S> {
    pub fn new(config: AppConfig, storage: S) -> Self {
        Self {
            config,
            storage,
            session: SessionContext::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn backend(&self) -> Result<BackendClient> {
        BackendClient::new(&self.config.backend.url, &self.config.backend.anon_key, self.config.backend_timeout())
    }

    /// 讀取草稿檔，不存在時以設定檔的預設值建立新草稿
    pub async fn load_draft(&self, path: &str) -> Result<HttpDraft> {
        let generator = HttpQuestionGenerator::new(&self.config.generator.endpoint, self.config.generator_timeout())?;
        let store = RestQuizStore::new(self.backend()?);

        let draft = match self.read_snapshot(path).await? {
            Some(snapshot) => QuizDraft::from_snapshot(generator, store, Arc::clone(&self.session), snapshot),
            None => {
                tracing::info!("🆕 Starting a new draft at {}", path);
                QuizDraft::new(generator, store, Arc::clone(&self.session), self.config.default_settings())
            }
        };
        Ok(draft.with_share_base_url(self.config.share_base_url()))
    }

    async fn read_snapshot(&self, path: &str) -> Result<Option<DraftSnapshot>> {
        match self.storage.read_file(path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(QuizError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn save_draft(&self, path: &str, draft: &HttpDraft) -> Result<()> {
        let data = serde_json::to_vec_pretty(&draft.snapshot())?;
        self.storage.write_file(path, &data).await?;
        tracing::debug!("Draft saved to {}", path);
        Ok(())
    }

    pub async fn generate(
        &self,
        path: &str,
        overrides: &SettingsOverrides,
        file: Option<&str>,
    ) -> Result<GenerateOutcome> {
        if let Some(num_questions) = overrides.num_questions {
            validate_range("numQuestions", num_questions, 1, self.config.max_questions())?;
        }
        let attachment = match file {
            Some(file) => Some(self.load_attachment(file).await?),
            None => None,
        };

        let mut draft = self.load_draft(path).await?;
        draft.update_settings(|settings| {
            if let Some(title) = &overrides.title {
                settings.title = title.clone();
            }
            if let Some(num_questions) = overrides.num_questions {
                settings.num_questions = num_questions;
            }
            if let Some(difficulty) = overrides.difficulty {
                settings.difficulty = difficulty;
            }
            if let Some(question_type) = overrides.question_type {
                settings.question_type = question_type;
            }
            if let Some(format) = overrides.format {
                settings.format = format;
            }
            if let Some(time_limit) = overrides.time_limit {
                settings.time_limit = time_limit;
            }
        })?;
        if let Some(attachment) = attachment {
            tracing::info!("📎 Attaching {} ({} bytes)", attachment.file_name, attachment.bytes.len());
            draft.attach(attachment)?;
        }

        let added = draft.generate().await?;
        self.save_draft(path, &draft).await?;

        Ok(GenerateOutcome {
            added,
            total: draft.questions().len(),
            error: draft.error().map(str::to_string),
        })
    }

    async fn load_attachment(&self, file: &str) -> Result<Attachment> {
        let file_name = Path::new(file)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| QuizError::invalid_value("file", file, "Not a file path"))?;
        // 副檔名先檢查，避免讀取不支援的檔案
        crate::utils::validation::validate_file_extension(
            "file",
            file_name,
            &crate::domain::model::ALLOWED_ATTACHMENT_EXTENSIONS,
        )?;
        let bytes = self.storage.read_file(file).await?;
        Attachment::new(file_name, bytes)
    }

    /// 回傳新增後的題數
    pub async fn add_blank(&self, path: &str) -> Result<usize> {
        let mut draft = self.load_draft(path).await?;
        draft.add_blank()?;
        self.save_draft(path, &draft).await?;
        Ok(draft.questions().len())
    }

    /// 以表單建立新題目，回傳新增後的題數
    pub async fn add_question(&self, path: &str, input: &QuestionInput) -> Result<usize> {
        let mut form = QuestionForm::new();
        input.apply(&mut form)?;
        let question = form.submit()?;

        let mut draft = self.load_draft(path).await?;
        draft.add_question(question)?;
        self.save_draft(path, &draft).await?;
        Ok(draft.questions().len())
    }

    /// 以既有題目填入表單、套用修改後整題取代
    pub async fn edit_question(&self, path: &str, index: usize, input: &QuestionInput) -> Result<Question> {
        let mut draft = self.load_draft(path).await?;
        let current = draft.questions().get(index).ok_or(QuizError::OutOfRange {
            index,
            len: draft.questions().len(),
        })?;

        let mut form = QuestionForm::from_question(current);
        input.apply(&mut form)?;
        let question = form.submit()?;

        draft.edit_question(index, question.clone())?;
        self.save_draft(path, &draft).await?;
        Ok(question)
    }

    /// `index` is zero-based.
    pub async fn remove(&self, path: &str, index: usize) -> Result<Question> {
        let mut draft = self.load_draft(path).await?;
        let removed = draft.remove_question(index)?;
        self.save_draft(path, &draft).await?;
        Ok(removed)
    }

    pub async fn show(&self, path: &str) -> Result<String> {
        let snapshot = self.read_snapshot(path).await?.ok_or_else(|| QuizError::InvalidState {
            message: format!("No draft at {}", path),
        })?;
        Ok(render_draft(&snapshot))
    }

    /// 登入後發佈；不論成敗都會寫回草稿，部分失敗時保留測驗 id 供重試
    pub async fn publish(&self, path: &str, email: &str, password: &str) -> Result<QuizRef> {
        let mut draft = self.load_draft(path).await?;
        if let DraftPhase::Published(quiz) = draft.phase() {
            return Err(QuizError::InvalidState {
                message: format!("Draft is already published at {}", quiz.share_url),
            });
        }

        let mut auth = AuthService::new(RestAuthProvider::new(self.backend()?), Arc::clone(&self.session));
        let user = auth.sign_in(email, password).await?;
        tracing::info!("🔐 Signed in as {} ({})", user.email, user.role);

        let outcome = draft.publish().await;
        let saved = self.save_draft(path, &draft).await;
        auth.sign_out().await;
        saved?;
        outcome
    }

    pub async fn register(&self, email: &str, password: &str, role: Role) -> Result<User> {
        let mut auth = AuthService::new(RestAuthProvider::new(self.backend()?), Arc::clone(&self.session));
        let user = auth.sign_up(email, password, role).await?;
        tracing::info!("✅ Registered {} as {}", user.email, user.role);
        Ok(user)
    }
}

/// 草稿的文字呈現，供 `show` 使用
pub fn render_draft(snapshot: &DraftSnapshot) -> String {
    let settings = &snapshot.settings;
    let title = if settings.title.is_empty() { "(untitled)" } else { settings.title.as_str() };
    let mut out = format!(
        "{} [{} / {} / {}] {} min\n",
        title, settings.difficulty, settings.question_type, settings.format, settings.time_limit
    );

    if let Some(quiz) = &snapshot.published {
        out.push_str(&format!("Published: {}\n", quiz.share_url));
    } else if let Some(quiz_id) = &snapshot.pending_quiz_id {
        out.push_str(&format!("Pending quiz {} (questions not saved yet)\n", quiz_id));
    }
    if !snapshot.description.is_empty() {
        out.push_str(&format!("{}\n", snapshot.description));
    }

    if snapshot.questions.is_empty() {
        out.push_str("No questions yet\n");
    }
    for (index, question) in snapshot.questions.iter().enumerate() {
        let content = if question.content.is_empty() { "(empty)" } else { question.content.as_str() };
        out.push_str(&format!(
            "{}. {} [{}, {} pt]\n",
            index, content, question.question_type, question.points
        ));
        let answers = question.correct_answer.values();
        for option in &question.options {
            let marker = if !option.is_empty() && answers.contains(&option.as_str()) { "*" } else { "-" };
            out.push_str(&format!("   {} {}\n", marker, option));
        }
        if question.options.is_empty() && !question.correct_answer.primary().is_empty() {
            out.push_str(&format!("   * {}\n", question.correct_answer.primary()));
        }
    }

    if !snapshot.excluded_questions.is_empty() {
        out.push_str(&format!("Excluded from generation: {}\n", snapshot.excluded_questions.len()));
    }
    out
}
