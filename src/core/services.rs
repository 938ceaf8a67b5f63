//! Implementations for the service the app needs.
//!

use crate::config::Settings;
use crate::core::chat::{ChatMessage, ChatTurn};
use crate::core::command::{self, Command, HELP, STORE_UNAVAILABLE};
use crate::core::router;
use crate::core::traits::{
    ChatService, CommandOutcome, CommandService, RemoteAssistant, Speaker, TimetableService,
};
use crate::error::{StoreError, TimetableError};
use crate::infrastructure::entities::LectureRecord;
use crate::infrastructure::traits::KeyValueRepository;
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{debug, error, info};
use std::time::Duration;
use uuid::Uuid;

/// Storage key of the timetable in the key-value store.
pub const TIMETABLE_KEY: &str = "timetable";

#[injectable(TimetableService)]
pub struct MyTimetableService {
    repo: Ref<dyn KeyValueRepository>,
}

impl MyTimetableService {
    pub fn new(repo: Ref<dyn KeyValueRepository>) -> Self {
        MyTimetableService { repo }
    }
}

#[async_trait]
impl TimetableService for MyTimetableService {
    async fn load(&self, student_id: Uuid) -> Result<Option<Vec<LectureRecord>>, StoreError> {
        match self.repo.get(student_id, TIMETABLE_KEY).await? {
            None => Ok(None),
            Some(stored) => Ok(Some(serde_json::from_str(&stored.value)?)),
        }
    }

    async fn try_replace_all(
        &self,
        student_id: Uuid,
        records: &[LectureRecord],
    ) -> Result<(), StoreError> {
        let value = serde_json::to_string(records)?;
        self.repo.set(student_id, TIMETABLE_KEY, value).await
    }

    async fn add_lecture(
        &self,
        student_id: Uuid,
        record: LectureRecord,
    ) -> Result<Vec<LectureRecord>, TimetableError> {
        let record = record.normalized().ok_or(TimetableError::MissingFields)?;

        let append = |current: Option<&str>| -> Result<String, StoreError> {
            let mut timetable: Vec<LectureRecord> = match current {
                Some(value) => serde_json::from_str(value)?,
                None => Vec::new(),
            };
            timetable.push(record.clone());
            Ok(serde_json::to_string(&timetable)?)
        };
        let value = self.repo.update(student_id, TIMETABLE_KEY, &append).await?;
        let timetable: Vec<LectureRecord> =
            serde_json::from_str(&value).map_err(StoreError::from)?;

        info!("student {student_id} now has {} lectures", timetable.len());
        Ok(timetable)
    }

    async fn reset(&self, student_id: Uuid) -> Result<(), StoreError> {
        self.repo.remove(student_id, TIMETABLE_KEY).await
    }
}

#[injectable(ChatService)]
pub struct MyChatService {
    timetable: Ref<dyn TimetableService>,
    assistant: Ref<dyn RemoteAssistant>,
    speaker: Ref<dyn Speaker>,
    settings: Ref<Settings>,
}

impl MyChatService {
    pub fn new(
        timetable: Ref<dyn TimetableService>,
        assistant: Ref<dyn RemoteAssistant>,
        speaker: Ref<dyn Speaker>,
        settings: Ref<Settings>,
    ) -> Self {
        MyChatService {
            timetable,
            assistant,
            speaker,
            settings,
        }
    }
}

#[async_trait]
impl ChatService for MyChatService {
    async fn reply_to(
        &self,
        student_id: Uuid,
        user_message: ChatMessage,
        voice_mode: bool,
    ) -> ChatTurn {
        let text = user_message.text.trim();

        let snapshot = self
            .timetable
            .load(student_id)
            .await
            .map_err(|e| error!("failed to load timetable, answering without it: {e}"))
            .ok()
            .flatten();

        let routed = router::route(text, snapshot.as_deref(), &*self.assistant, voice_mode).await;
        debug!("answered via {:?}", routed.strategy);

        if routed.speak {
            self.speaker.speak(&routed.response_text).await;
        }

        ChatTurn {
            user_message,
            reply: ChatMessage::remi(routed.response_text),
            strategy: routed.strategy,
            speak: routed.speak,
        }
    }

    fn reveal_tick(&self) -> Duration {
        self.settings.reveal_tick
    }
}

#[injectable(CommandService)]
pub struct MyCommandService {
    timetable: Ref<dyn TimetableService>,
    speaker: Ref<dyn Speaker>,
}

impl MyCommandService {
    pub fn new(timetable: Ref<dyn TimetableService>, speaker: Ref<dyn Speaker>) -> Self {
        MyCommandService { timetable, speaker }
    }

    /// Runs a parsed command, returning the timetable afterwards.
    async fn run(
        &self,
        student_id: Uuid,
        command: &Command,
    ) -> Result<Vec<LectureRecord>, TimetableError> {
        match command {
            Command::AddLecture(lecture) => {
                self.timetable.add_lecture(student_id, lecture.clone()).await
            }
            Command::NextLecture | Command::ShowLectures => {
                Ok(self.timetable.load(student_id).await?.unwrap_or_default())
            }
        }
    }
}

#[async_trait]
impl CommandService for MyCommandService {
    async fn execute(&self, student_id: Uuid, text: &str) -> CommandOutcome {
        let (reply, lectures) = match command::parse(text) {
            Ok(command) => match self.run(student_id, &command).await {
                Ok(lectures) => (command.reply(&lectures), lectures),
                Err(e) => {
                    error!("{command:?} failed, timetable left as it was: {e}");
                    (STORE_UNAVAILABLE.to_owned(), Vec::new())
                }
            },
            Err(e) => {
                debug!("{e}");
                (HELP.to_owned(), self.timetable.get_all(student_id).await)
            }
        };

        self.speaker.speak(&reply).await;

        CommandOutcome { reply, lectures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat::{Sender, Strategy};
    use crate::core::router::{GREETING, NO_CLASSES};
    use crate::core::traits::ASSISTANT_FALLBACK;
    use crate::error::AssistantError;
    use crate::infrastructure::entities::KeyValue;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryKeyValues {
        values: Mutex<HashMap<(Uuid, String), String>>,
        broken: bool,
    }

    impl MemoryKeyValues {
        fn broken() -> Self {
            MemoryKeyValues {
                broken: true,
                ..Default::default()
            }
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.broken {
                Err(StoreError::Database(sqlx::Error::PoolClosed))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl KeyValueRepository for MemoryKeyValues {
        async fn get(&self, owner: Uuid, key: &str) -> Result<Option<KeyValue>, StoreError> {
            self.check()?;
            let values = self.values.lock().unwrap();
            Ok(values.get(&(owner, key.to_owned())).map(|value| KeyValue {
                owner,
                key: key.to_owned(),
                value: value.clone(),
                updated_at: Utc::now(),
            }))
        }

        async fn set(&self, owner: Uuid, key: &str, value: String) -> Result<(), StoreError> {
            self.check()?;
            self.values
                .lock()
                .unwrap()
                .insert((owner, key.to_owned()), value);
            Ok(())
        }

        async fn remove(&self, owner: Uuid, key: &str) -> Result<(), StoreError> {
            self.check()?;
            self.values.lock().unwrap().remove(&(owner, key.to_owned()));
            Ok(())
        }

        async fn update(
            &self,
            owner: Uuid,
            key: &str,
            apply: &(dyn for<'v> Fn(Option<&'v str>) -> Result<String, StoreError> + Send + Sync),
        ) -> Result<String, StoreError> {
            self.check()?;
            let mut values = self.values.lock().unwrap();
            let slot = (owner, key.to_owned());
            let value = apply(values.get(&slot).map(String::as_str))?;
            values.insert(slot, value.clone());
            Ok(value)
        }
    }

    struct CannedAssistant(Result<&'static str, ()>);

    #[async_trait]
    impl RemoteAssistant for CannedAssistant {
        async fn ask(&self, _text: &str) -> Result<String, AssistantError> {
            self.0
                .map(str::to_owned)
                .map_err(|_| AssistantError::EmptyReply)
        }
    }

    #[derive(Default)]
    struct RecordingSpeaker {
        spoken: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Speaker for RecordingSpeaker {
        async fn speak(&self, text: &str) {
            self.spoken.lock().unwrap().push(text.to_owned());
        }
    }

    fn maths() -> LectureRecord {
        LectureRecord::new("Maths", "Dr Lee", "B12", "10am")
    }

    fn chat_service(
        timetable: Ref<dyn TimetableService>,
        assistant: CannedAssistant,
        speaker: Ref<RecordingSpeaker>,
    ) -> MyChatService {
        MyChatService::new(
            timetable,
            Ref::new(assistant),
            speaker,
            Ref::new(Settings::default()),
        )
    }

    #[tokio::test]
    async fn test_replace_all_then_get_all_round_trip() {
        let service = MyTimetableService::new(Ref::new(MemoryKeyValues::default()));
        let student = Uuid::new_v4();
        let records = vec![
            LectureRecord::new("Physics", "Prof Okafor", "Lab 3", "9am"),
            maths(),
            maths(),
        ];

        service.replace_all(student, &records).await;

        assert_eq!(service.get_all(student).await, records);
    }

    #[tokio::test]
    async fn test_get_all_is_empty_when_never_written() {
        let service = MyTimetableService::new(Ref::new(MemoryKeyValues::default()));
        let student = Uuid::new_v4();

        assert!(service.get_all(student).await.is_empty());
        assert!(service.load(student).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let service = MyTimetableService::new(Ref::new(MemoryKeyValues::broken()));
        let student = Uuid::new_v4();

        service.replace_all(student, &[maths()]).await;
        assert!(service.get_all(student).await.is_empty());
        assert!(matches!(
            service.load(student).await,
            Err(StoreError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_timetable_is_reported() {
        let repo = MemoryKeyValues::default();
        let student = Uuid::new_v4();
        repo.set(student, TIMETABLE_KEY, "not json".to_owned())
            .await
            .unwrap();
        let service = MyTimetableService::new(Ref::new(repo));

        assert!(matches!(
            service.load(student).await,
            Err(StoreError::Malformed(_))
        ));
        assert!(service.get_all(student).await.is_empty());
    }

    #[tokio::test]
    async fn test_add_lecture_validates_and_appends() {
        let service = MyTimetableService::new(Ref::new(MemoryKeyValues::default()));
        let student = Uuid::new_v4();

        let missing = LectureRecord::new("Maths", "", "B12", "10am");
        assert!(matches!(
            service.add_lecture(student, missing).await,
            Err(TimetableError::MissingFields)
        ));

        let first = service.add_lecture(student, maths()).await.unwrap();
        let second = service
            .add_lecture(student, LectureRecord::new(" Law ", "Ms Ade", "A1", "1pm"))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second[1], LectureRecord::new("Law", "Ms Ade", "A1", "1pm"));
        assert_eq!(service.get_all(student).await, second);
    }

    #[tokio::test]
    async fn test_reset_makes_timetable_absent() {
        let service = MyTimetableService::new(Ref::new(MemoryKeyValues::default()));
        let student = Uuid::new_v4();
        service.replace_all(student, &[]).await;
        assert_eq!(service.load(student).await.unwrap(), Some(vec![]));

        service.reset(student).await.unwrap();
        assert_eq!(service.load(student).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_timetables_are_scoped_per_student() {
        let service = MyTimetableService::new(Ref::new(MemoryKeyValues::default()));
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        service.replace_all(alice, &[maths()]).await;

        assert!(service.get_all(bob).await.is_empty());
    }

    #[tokio::test]
    async fn test_chat_answers_from_timetable() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::default())));
        let student = Uuid::new_v4();
        timetable.replace_all(student, &[maths()]).await;
        let speaker = Ref::new(RecordingSpeaker::default());
        let chat = chat_service(timetable, CannedAssistant(Ok("unused")), speaker.clone());

        let turn = chat.respond(student, "  when is my maths class ", false).await;

        assert_eq!(turn.user_message.sender, Sender::User);
        assert_eq!(turn.user_message.text, "when is my maths class");
        assert_eq!(turn.reply.sender, Sender::Remi);
        assert_eq!(turn.reply.text, "Maths is taught by Dr Lee in B12 at 10am.");
        assert_eq!(turn.strategy, Strategy::Timetable);
        assert!(!turn.speak);
        assert!(speaker.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_speaks_in_voice_mode() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::default())));
        let speaker = Ref::new(RecordingSpeaker::default());
        let chat = chat_service(timetable, CannedAssistant(Ok("unused")), speaker.clone());

        let turn = chat.respond(Uuid::new_v4(), "Hello Remi", true).await;

        assert_eq!(turn.reply.text, GREETING);
        assert!(turn.speak);
        assert_eq!(*speaker.spoken.lock().unwrap(), vec![GREETING.to_owned()]);
    }

    #[tokio::test]
    async fn test_chat_empty_timetable_time_question() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::default())));
        let student = Uuid::new_v4();
        timetable.replace_all(student, &[]).await;
        let chat = chat_service(
            timetable,
            CannedAssistant(Ok("unused")),
            Ref::new(RecordingSpeaker::default()),
        );

        let turn = chat.respond(student, "when is my next class", false).await;

        assert_eq!(turn.reply.text, NO_CLASSES);
    }

    #[tokio::test]
    async fn test_chat_forwards_to_remote() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::default())));
        let chat = chat_service(
            timetable,
            CannedAssistant(Ok("Amara is pursuing Law in Year 2.")),
            Ref::new(RecordingSpeaker::default()),
        );

        let turn = chat.respond(Uuid::new_v4(), "tell me about Amara", false).await;

        assert_eq!(turn.reply.text, "Amara is pursuing Law in Year 2.");
        assert_eq!(turn.strategy, Strategy::Remote);
    }

    #[tokio::test]
    async fn test_chat_survives_store_and_remote_failures() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::broken())));
        let chat = chat_service(
            timetable,
            CannedAssistant(Err(())),
            Ref::new(RecordingSpeaker::default()),
        );

        let turn = chat.respond(Uuid::new_v4(), "when is my next class", false).await;

        assert_eq!(turn.reply.text, ASSISTANT_FALLBACK);
        assert_eq!(turn.strategy, Strategy::Remote);
    }

    #[tokio::test]
    async fn test_command_add_then_query() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::default())));
        let speaker = Ref::new(RecordingSpeaker::default());
        let commands = MyCommandService::new(timetable.clone(), speaker.clone());
        let student = Uuid::new_v4();

        let added = commands.execute(student, "add lecture maths 10am b12").await;
        assert_eq!(added.reply, "Added maths lecture at 10am in room b12");
        assert_eq!(added.lectures.len(), 1);

        let next = commands.execute(student, "next lecture").await;
        assert_eq!(next.reply, "Your next lecture is maths at 10am in room b12");

        let shown = commands.execute(student, "show lectures").await;
        assert_eq!(shown.reply, "You have 1 lectures.");

        assert_eq!(timetable.get_all(student).await, added.lectures);
        assert_eq!(speaker.spoken.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_command_help_on_unknown_input() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::default())));
        let speaker = Ref::new(RecordingSpeaker::default());
        let commands = MyCommandService::new(timetable, speaker.clone());

        let outcome = commands.execute(Uuid::new_v4(), "add lecture maths").await;

        assert_eq!(outcome.reply, HELP);
        assert!(outcome.lectures.is_empty());
        assert_eq!(*speaker.spoken.lock().unwrap(), vec![HELP.to_owned()]);
    }

    #[tokio::test]
    async fn test_command_keeps_legacy_records() {
        let repo = Ref::new(MemoryKeyValues::default());
        let student = Uuid::new_v4();
        repo.set(
            student,
            TIMETABLE_KEY,
            r#"[{"course":"Maths","lecturer":"Dr Lee","room":"B12","time":"10am"},{"subject":"chem","room":"unknown"}]"#
                .to_owned(),
        )
        .await
        .unwrap();
        let timetable = Ref::new(MyTimetableService::new(repo.clone()));
        let commands = MyCommandService::new(timetable.clone(), Ref::new(RecordingSpeaker::default()));

        let outcome = commands.execute(student, "add lecture physics 9am").await;

        assert_eq!(outcome.reply, "Added physics lecture at 9am in room unknown");
        assert_eq!(
            outcome.lectures,
            vec![
                maths(),
                LectureRecord::new("chem", "", "unknown", ""),
                LectureRecord::new("physics", "unknown", "unknown", "9am"),
            ]
        );
        assert_eq!(timetable.get_all(student).await, outcome.lectures);
    }

    #[tokio::test]
    async fn test_command_leaves_unreadable_timetable_alone() {
        let repo = Ref::new(MemoryKeyValues::default());
        let student = Uuid::new_v4();
        repo.set(student, TIMETABLE_KEY, "not json".to_owned())
            .await
            .unwrap();
        let speaker = Ref::new(RecordingSpeaker::default());
        let commands = MyCommandService::new(
            Ref::new(MyTimetableService::new(repo.clone())),
            speaker.clone(),
        );

        let added = commands.execute(student, "add lecture physics 9am").await;
        let next = commands.execute(student, "next lecture").await;

        assert_eq!(added.reply, STORE_UNAVAILABLE);
        assert!(added.lectures.is_empty());
        assert_eq!(next.reply, STORE_UNAVAILABLE);
        assert_eq!(
            repo.get(student, TIMETABLE_KEY).await.unwrap().unwrap().value,
            "not json"
        );
        assert_eq!(speaker.spoken.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_command_with_broken_store() {
        let timetable = Ref::new(MyTimetableService::new(Ref::new(MemoryKeyValues::broken())));
        let commands = MyCommandService::new(timetable, Ref::new(RecordingSpeaker::default()));

        let outcome = commands.execute(Uuid::new_v4(), "add lecture maths 10am").await;

        assert_eq!(outcome.reply, STORE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_add_lecture_keeps_corrupt_value() {
        let repo = Ref::new(MemoryKeyValues::default());
        let student = Uuid::new_v4();
        repo.set(student, TIMETABLE_KEY, "{".to_owned()).await.unwrap();
        let service = MyTimetableService::new(repo.clone());

        assert!(matches!(
            service.add_lecture(student, maths()).await,
            Err(TimetableError::Store(StoreError::Malformed(_)))
        ));
        assert_eq!(repo.get(student, TIMETABLE_KEY).await.unwrap().unwrap().value, "{");
    }
}
