use crate::core::editor::QuestionEditor;
use crate::core::generation::GenerationOrchestrator;
use crate::core::session::SessionContext;
use crate::core::{Question, QuestionGenerator, QuizSettings, QuizStore};
use crate::domain::model::{
    Attachment, DraftSnapshot, NewQuizRecord, QuestionRow, QuizRef, UserSession,
};
use crate::utils::error::{QuizError, Result};
use crate::utils::validation::Validate;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

pub const DEFAULT_SHARE_BASE_URL: &str = "https://quizai.app/quiz";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftPhase {
    Editing,
    Publishing,
    Published(QuizRef),
}

/// 草稿狀態快照，透過 watch channel 通知觀察者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStatus {
    pub phase: DraftPhase,
    pub busy: bool,
    pub question_count: usize,
    pub exclusion_count: usize,
    pub error: Option<String>,
}

/// Quiz draft controller: settings, questions and the publish state machine.
///
/// `generate` and `publish` take `&mut self`, so at most one request per draft
/// is ever outstanding. Observers follow progress through [`QuizDraft::subscribe`].
pub struct QuizDraft<G: QuestionGenerator, S: QuizStore> {
    settings: QuizSettings,
    description: String,
    editor: QuestionEditor,
    orchestrator: GenerationOrchestrator<G>,
    store: S,
    session: Arc<SessionContext>,
    share_base_url: String,
    phase: DraftPhase,
    busy: bool,
    error: Option<String>,
    pending_quiz_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status_tx: watch::Sender<DraftStatus>,
}

impl<G: QuestionGenerator, S: QuizStore> QuizDraft<G, S> {
    pub fn new(generator: G, store: S, session: Arc<SessionContext>, settings: QuizSettings) -> Self {
        let now = Utc::now();
        let (status_tx, _) = watch::channel(DraftStatus {
            phase: DraftPhase::Editing,
            busy: false,
            question_count: 0,
            exclusion_count: 0,
            error: None,
        });

        Self {
            settings,
            description: String::new(),
            editor: QuestionEditor::new(),
            orchestrator: GenerationOrchestrator::new(generator),
            store,
            session,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            phase: DraftPhase::Editing,
            busy: false,
            error: None,
            pending_quiz_id: None,
            created_at: now,
            updated_at: now,
            status_tx,
        }
    }

    /// 從存檔還原草稿（附件不會被保存）
    pub fn from_snapshot(
        generator: G,
        store: S,
        session: Arc<SessionContext>,
        snapshot: DraftSnapshot,
    ) -> Self {
        let mut draft = Self::new(generator, store, session, snapshot.settings);
        draft.description = snapshot.description;
        draft.editor = QuestionEditor::from_parts(snapshot.questions, snapshot.excluded_questions);
        draft.pending_quiz_id = snapshot.pending_quiz_id;
        if let Some(quiz) = snapshot.published {
            draft.phase = DraftPhase::Published(quiz);
        }
        draft.created_at = snapshot.created_at;
        draft.updated_at = snapshot.updated_at;
        draft.notify();
        draft
    }

    pub fn with_share_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.share_base_url = base_url.into();
        self
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            settings: self.settings.clone(),
            description: self.description.clone(),
            questions: self.editor.questions().to_vec(),
            excluded_questions: self.editor.exclusions().to_vec(),
            pending_quiz_id: self.pending_quiz_id.clone(),
            published: self.published().cloned(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DraftStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> DraftStatus {
        DraftStatus {
            phase: self.phase.clone(),
            busy: self.busy,
            question_count: self.editor.len(),
            exclusion_count: self.editor.exclusions().len(),
            error: self.error.clone(),
        }
    }

    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn questions(&self) -> &[Question] {
        self.editor.questions()
    }

    pub fn exclusions(&self) -> &[String] {
        self.editor.exclusions()
    }

    pub fn phase(&self) -> &DraftPhase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn published(&self) -> Option<&QuizRef> {
        match &self.phase {
            DraftPhase::Published(quiz) => Some(quiz),
            _ => None,
        }
    }

    /// 部分失敗後留下的測驗 id，重試發佈時沿用
    pub fn pending_quiz_id(&self) -> Option<&str> {
        self.pending_quiz_id.as_deref()
    }

    /// Title and time limit are frozen while a created quiz awaits its
    /// questions, since a retried publish reuses that record as is.
    pub fn update_settings(&mut self, update: impl FnOnce(&mut QuizSettings)) -> Result<()> {
        self.ensure_editable()?;
        let mut updated = self.settings.clone();
        update(&mut updated);

        let record_changed =
            updated.title != self.settings.title || updated.time_limit != self.settings.time_limit;
        if record_changed {
            self.ensure_record_unlocked()?;
        }

        self.settings = updated;
        self.touch();
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<()> {
        self.ensure_editable()?;
        let description = description.into();
        if description != self.description {
            self.ensure_record_unlocked()?;
        }
        self.description = description;
        self.touch();
        Ok(())
    }

    pub fn attach(&mut self, attachment: Attachment) -> Result<()> {
        self.update_settings(|settings| settings.file = Some(attachment))
    }

    pub fn add_question(&mut self, question: Question) -> Result<()> {
        self.ensure_editable()?;
        self.editor.add(question);
        self.touch();
        Ok(())
    }

    pub fn add_blank(&mut self) -> Result<()> {
        self.ensure_editable()?;
        self.editor.add_blank();
        self.touch();
        Ok(())
    }

    pub fn remove_question(&mut self, index: usize) -> Result<Question> {
        self.ensure_editable()?;
        let removed = self.editor.remove_at(index)?;
        self.touch();
        Ok(removed)
    }

    pub fn edit_question(&mut self, index: usize, question: Question) -> Result<()> {
        self.ensure_editable()?;
        self.editor.edit(index, question)?;
        self.touch();
        Ok(())
    }

    /// 產生新題目並附加到清單後面，回傳新增數量
    ///
    /// A failed request is not an `Err`: the list stays as it was, `error()`
    /// holds the message and `Ok(0)` is returned. `Err` means the request was
    /// never sent (missing title or a draft that is no longer editable).
    pub async fn generate(&mut self) -> Result<usize> {
        self.ensure_editable()?;
        if let Err(e) = self.settings.validate() {
            return self.reject(e);
        }

        self.busy = true;
        self.error = None;
        self.notify();

        let generated = self
            .orchestrator
            .generate(&self.settings, self.editor.exclusions())
            .await;

        self.busy = false;
        self.error = self.orchestrator.error().map(str::to_string);
        let added = generated.len();
        self.editor.extend(generated);
        self.touch();

        tracing::info!("📝 Draft now holds {} questions (+{})", self.editor.len(), added);
        Ok(added)
    }

    pub async fn publish(&mut self) -> Result<QuizRef> {
        self.ensure_editable()?;
        if self.editor.is_empty() {
            return self.reject(QuizError::NoQuestions);
        }
        let session = match self.session.current() {
            Some(session) => session,
            None => return self.reject(QuizError::NotSignedIn),
        };
        let not_ready = self
            .editor
            .questions()
            .iter()
            .enumerate()
            .find_map(|(index, q)| q.validate_for_publish().err().map(|e| (index, e)));
        if let Some((index, e)) = not_ready {
            tracing::warn!("Question {} is not ready to publish: {}", index + 1, e);
            return self.reject(e);
        }

        self.phase = DraftPhase::Publishing;
        self.busy = true;
        self.error = None;
        self.notify();

        let outcome = self.persist(&session).await;
        self.busy = false;

        match outcome {
            Ok(quiz_id) => {
                let quiz = QuizRef {
                    share_url: format!("{}/{}", self.share_base_url.trim_end_matches('/'), quiz_id),
                    id: quiz_id,
                };
                tracing::info!("✅ Quiz published: {}", quiz.share_url);
                self.pending_quiz_id = None;
                self.phase = DraftPhase::Published(quiz.clone());
                self.touch();
                Ok(quiz)
            }
            Err(e) => {
                if let QuizError::PartialFailure { quiz_id, .. } = &e {
                    tracing::warn!("⚠️ Quiz {} has no questions yet, a retry will reuse it", quiz_id);
                    self.pending_quiz_id = Some(quiz_id.clone());
                }
                tracing::error!("❌ Publish failed: {} (Category: {:?})", e, e.category());
                self.phase = DraftPhase::Editing;
                self.error = Some(e.user_friendly_message());
                self.touch();
                Err(e)
            }
        }
    }

    async fn persist(&self, session: &UserSession) -> Result<String> {
        let quiz_id = match &self.pending_quiz_id {
            Some(quiz_id) => {
                tracing::info!("♻️ Reusing quiz {} from the previous attempt", quiz_id);
                quiz_id.clone()
            }
            None => {
                let record = NewQuizRecord {
                    title: self.settings.title.clone(),
                    description: self.description.clone(),
                    time_limit: self.settings.time_limit,
                    created_by: session.user.id.clone(),
                };
                self.store.create_quiz(session, &record).await?
            }
        };

        let rows: Vec<QuestionRow> = self
            .editor
            .questions()
            .iter()
            .map(|question| QuestionRow::from_question(&quiz_id, question))
            .collect();
        tracing::debug!("Inserting {} questions into quiz {}", rows.len(), quiz_id);

        self.store
            .insert_questions(session, &rows)
            .await
            .map_err(|e| QuizError::PartialFailure {
                quiz_id: quiz_id.clone(),
                message: e.user_friendly_message(),
            })?;

        Ok(quiz_id)
    }

    fn ensure_editable(&self) -> Result<()> {
        match &self.phase {
            DraftPhase::Editing => Ok(()),
            DraftPhase::Publishing => Err(QuizError::InvalidState {
                message: "a publish is in progress".to_string(),
            }),
            DraftPhase::Published(quiz) => Err(QuizError::InvalidState {
                message: format!("quiz {} is already published", quiz.id),
            }),
        }
    }

    fn ensure_record_unlocked(&mut self) -> Result<()> {
        let quiz_id = match &self.pending_quiz_id {
            Some(quiz_id) => quiz_id.clone(),
            None => return Ok(()),
        };
        tracing::warn!("⚠️ Quiz {} already exists, its title, description and time limit are fixed", quiz_id);
        self.reject(QuizError::InvalidState {
            message: format!(
                "quiz {} was already created; publish again before changing its title, description or time limit",
                quiz_id
            ),
        })
    }

    fn reject<T>(&mut self, err: QuizError) -> Result<T> {
        self.error = Some(err.user_friendly_message());
        self.notify();
        Err(err)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.notify();
    }

    fn notify(&self) {
        self.status_tx.send_replace(self.status());
    }
}
