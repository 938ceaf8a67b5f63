//! Query routing: decides how Remi answers a free-text submission.
//!
//! Rules are tried in order and the first match wins:
//!
//! 1. greetings get a canned introduction,
//! 2. time or class questions are answered from the student's timetable,
//!    provided one has been stored,
//! 3. everything else goes to the remote assistant.
//!
//! All keyword checks are substring checks on the lower-cased input, so
//! "hi" also fires inside "this" or "which".

use crate::core::chat::Strategy;
use crate::core::traits::RemoteAssistant;
use crate::infrastructure::entities::LectureRecord;
use log::debug;

pub const GREETING: &str =
    "👋 Hello! I’m Remi — your academic assistant. Ask me about your classes or other students.";
pub const NO_CLASSES: &str = "You don't have any classes added yet.";
pub const CLASS_NOT_FOUND: &str = "I couldn't find that class. Please add it in your timetable.";

const GREETING_WORDS: [&str; 2] = ["hello", "hi"];
const TIME_WORDS: [&str; 2] = ["when", "next"];
const CLASS_WORDS: [&str; 3] = ["class", "lecture", "course"];

/// Outcome of the local decision step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer locally with this text.
    Reply { text: String, strategy: Strategy },
    /// Hand the input to the remote assistant.
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub response_text: String,
    pub speak: bool,
    pub strategy: Strategy,
}

/// Picks a response strategy without doing any I/O.
///
/// `timetable` is `None` when the student has never stored one; in that case
/// timetable questions fall through to the remote assistant.
pub fn decide(input: &str, timetable: Option<&[LectureRecord]>) -> Decision {
    let lower = input.trim().to_lowercase();

    if contains_any(&lower, &GREETING_WORDS) {
        return Decision::Reply {
            text: GREETING.to_owned(),
            strategy: Strategy::Greeting,
        };
    }

    let Some(timetable) = timetable else {
        return Decision::Forward;
    };

    let time_intent = contains_any(&lower, &TIME_WORDS);
    let class_intent = contains_any(&lower, &CLASS_WORDS);
    if !time_intent && !class_intent {
        return Decision::Forward;
    }

    let text = if let Some(lecture) = find_lecture(&lower, timetable) {
        format!(
            "{} is taught by {} in {} at {}.",
            lecture.course, lecture.lecturer, lecture.room, lecture.time
        )
    } else if time_intent {
        match timetable.first() {
            Some(next) => format!(
                "Your next lecture is {} at {} in {}.",
                next.course, next.time, next.room
            ),
            None => NO_CLASSES.to_owned(),
        }
    } else {
        CLASS_NOT_FOUND.to_owned()
    };

    Decision::Reply {
        text,
        strategy: Strategy::Timetable,
    }
}

/// Decides and, if needed, asks the remote assistant. Never fails.
pub async fn route(
    input: &str,
    timetable: Option<&[LectureRecord]>,
    assistant: &dyn RemoteAssistant,
    voice_mode: bool,
) -> Routed {
    let (response_text, strategy) = match decide(input, timetable) {
        Decision::Reply { text, strategy } => (text, strategy),
        Decision::Forward => {
            debug!("forwarding query to the remote assistant");
            (
                assistant.ask_or_fallback(input.trim()).await,
                Strategy::Remote,
            )
        }
    };

    Routed {
        response_text,
        speak: voice_mode,
        strategy,
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// First lecture, in storage order, whose course or lecturer is mentioned.
fn find_lecture<'a>(lower_input: &str, timetable: &'a [LectureRecord]) -> Option<&'a LectureRecord> {
    let mentions = |field: &str| {
        let field = field.trim().to_lowercase();
        !field.is_empty() && lower_input.contains(&field)
    };

    timetable
        .iter()
        .find(|lecture| mentions(&lecture.course) || mentions(&lecture.lecturer))
}
