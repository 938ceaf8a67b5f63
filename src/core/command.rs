//! Legacy command grammar: `add lecture <subject> <time> [<room>]`, plus the
//! `next lecture` and `show lectures` queries.

use crate::error::CommandError;
use crate::infrastructure::entities::LectureRecord;

pub const HELP: &str = "I didn't understand. Try saying: add lecture maths 10am b12.";

pub const STORE_UNAVAILABLE: &str = "Sorry, I couldn't open your timetable. Please try again.";

/// Placeholder for fields the command grammar cannot express.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddLecture(LectureRecord),
    NextLecture,
    ShowLectures,
}

/// Parses a command. Input is lower-cased before tokenizing.
pub fn parse(input: &str) -> Result<Command, CommandError> {
    let command = input.trim().to_lowercase();
    let tokens: Vec<&str> = command.split_whitespace().collect();

    match tokens.as_slice() {
        ["add", "lecture", subject, time, rest @ ..] => {
            let room = rest.first().copied().unwrap_or(UNKNOWN);
            Ok(Command::AddLecture(LectureRecord::new(
                *subject, UNKNOWN, room, *time,
            )))
        }
        ["add", "lecture", ..] => Err(CommandError::Unrecognized(command.clone())),
        _ if command.contains("next lecture") => Ok(Command::NextLecture),
        _ if command.contains("show lectures") => Ok(Command::ShowLectures),
        _ => Err(CommandError::Unrecognized(command.clone())),
    }
}

impl Command {
    /// Spoken reply for this command, given the timetable after it ran.
    pub fn reply(&self, timetable: &[LectureRecord]) -> String {
        match self {
            Command::AddLecture(lecture) => format!(
                "Added {} lecture at {} in room {}",
                lecture.course, lecture.time, lecture.room
            ),
            Command::NextLecture => match timetable.first() {
                None => "You have no lectures saved yet.".to_owned(),
                Some(next) => format!(
                    "Your next lecture is {} at {} in room {}",
                    next.course, next.time, next.room
                ),
            },
            Command::ShowLectures if timetable.is_empty() => "You have no lectures saved.".to_owned(),
            Command::ShowLectures => format!("You have {} lectures.", timetable.len()),
        }
    }
}
