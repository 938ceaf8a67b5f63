//! DI "Interfaces"

use crate::core::chat::{ChatMessage, ChatTurn};
use crate::error::{AssistantError, StoreError, TimetableError};
use crate::infrastructure::entities::LectureRecord;
use async_trait::async_trait;
use log::{error, warn};
use uuid::Uuid;

/// Reply used whenever the remote assistant could not produce one.
pub const ASSISTANT_FALLBACK: &str = "Sorry, something went wrong.";

/// The remote AI backend: text in, text out.
#[async_trait]
pub trait RemoteAssistant: Send + Sync {
    /// Performs one request/response exchange.
    async fn ask(&self, text: &str) -> Result<String, AssistantError>;

    /// Like [`RemoteAssistant::ask`], but any failure becomes
    /// [`ASSISTANT_FALLBACK`].
    async fn ask_or_fallback(&self, text: &str) -> String {
        match self.ask(text).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("remote assistant failed: {e}");
                ASSISTANT_FALLBACK.to_owned()
            }
        }
    }
}

/// Speech synthesis side effect.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str);
}

#[async_trait]
pub trait TimetableService: Send + Sync {
    /// Loads the stored timetable.
    ///
    /// Returns `Ok(None)` if the student never stored one or reset it.
    async fn load(&self, student_id: Uuid) -> Result<Option<Vec<LectureRecord>>, StoreError>;

    /// Replaces the whole stored timetable.
    async fn try_replace_all(
        &self,
        student_id: Uuid,
        records: &[LectureRecord],
    ) -> Result<(), StoreError>;

    /// Validates and appends one lecture, returning the new timetable.
    ///
    /// Returns `Err(TimetableError::MissingFields)` if any field is blank. A
    /// stored timetable that cannot be read is left as it is.
    async fn add_lecture(
        &self,
        student_id: Uuid,
        record: LectureRecord,
    ) -> Result<Vec<LectureRecord>, TimetableError>;

    /// Forgets the stored timetable entirely.
    async fn reset(&self, student_id: Uuid) -> Result<(), StoreError>;

    /// All lectures in storage order, or an empty list if nothing is stored
    /// or the store failed.
    async fn get_all(&self, student_id: Uuid) -> Vec<LectureRecord> {
        self.load(student_id)
            .await
            .map_err(|e| error!("failed to load timetable: {e}"))
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Replaces the stored timetable, logging failures instead of returning
    /// them.
    async fn replace_all(&self, student_id: Uuid, records: &[LectureRecord]) {
        if let Err(e) = self.try_replace_all(student_id, records).await {
            error!("failed to save timetable: {e}");
        }
    }
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Answers an already rendered user message. Never fails: storage and
    /// remote errors degrade to the default reply paths.
    async fn reply_to(
        &self,
        student_id: Uuid,
        user_message: ChatMessage,
        voice_mode: bool,
    ) -> ChatTurn;

    /// Answers one chat submission.
    async fn respond(&self, student_id: Uuid, text: &str, voice_mode: bool) -> ChatTurn {
        self.reply_to(student_id, ChatMessage::user(text.trim()), voice_mode)
            .await
    }

    /// Delay between two reveal frames of a reply.
    fn reveal_tick(&self) -> std::time::Duration;
}

/// Reply to a legacy command, plus the timetable after running it.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub reply: String,
    pub lectures: Vec<LectureRecord>,
}

#[async_trait]
pub trait CommandService: Send + Sync {
    /// Parses and runs an `add lecture ...` style command. Unknown input
    /// yields the help text rather than an error. If the timetable cannot be
    /// read, nothing is written and the reply says so.
    async fn execute(&self, student_id: Uuid, text: &str) -> CommandOutcome;
}
