//! Database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One stored value of the per-student key-value store.
#[derive(Debug, FromRow)]
pub struct KeyValue {
    pub owner: Uuid,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// One lecture of a student's timetable.
///
/// Older clients stored `{subject, time, room}`; `subject` is read as the
/// course and any missing field decodes as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureRecord {
    #[serde(alias = "subject", default)]
    pub course: String,
    #[serde(default)]
    pub lecturer: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub time: String,
}

impl LectureRecord {
    pub fn new(
        course: impl Into<String>,
        lecturer: impl Into<String>,
        room: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        LectureRecord {
            course: course.into(),
            lecturer: lecturer.into(),
            room: room.into(),
            time: time.into(),
        }
    }

    /// Trims every field. Returns `None` if any field ends up empty.
    pub fn normalized(&self) -> Option<LectureRecord> {
        let record = LectureRecord::new(
            self.course.trim(),
            self.lecturer.trim(),
            self.room.trim(),
            self.time.trim(),
        );

        let complete = [
            &record.course,
            &record.lecturer,
            &record.room,
            &record.time,
        ]
        .iter()
        .all(|field| !field.is_empty());

        complete.then_some(record)
    }
}
