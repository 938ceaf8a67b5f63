//! Timetable endpoints

use crate::api::ExtractStudent;
use crate::api::timetable::schemas::{CommandReply, LectureList, NewLecture, RunCommand};
use crate::core::traits::{CommandService, TimetableService};
use crate::error::TimetableError;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use log::error;

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(list_lectures).post(add_lecture).delete(reset_timetable),
        )
        .route("/commands", post(run_command))
}

async fn list_lectures(
    Inject(timetable_service): Inject<dyn TimetableService>,
    ExtractStudent(student_id): ExtractStudent,
) -> (StatusCode, Json<LectureList>) {
    let lectures = timetable_service.get_all(student_id).await;

    (StatusCode::OK, Json(LectureList { lectures }))
}

async fn add_lecture(
    Inject(timetable_service): Inject<dyn TimetableService>,
    ExtractStudent(student_id): ExtractStudent,
    Json(lecture): Json<NewLecture>,
) -> Result<(StatusCode, Json<LectureList>), (StatusCode, &'static str)> {
    match timetable_service
        .add_lecture(student_id, lecture.into())
        .await
    {
        Ok(lectures) => Ok((StatusCode::CREATED, Json(LectureList { lectures }))),
        Err(TimetableError::MissingFields) => {
            Err((StatusCode::BAD_REQUEST, "Please fill all fields."))
        }
        Err(TimetableError::Store(e)) => {
            error!("failed to add lecture: {e}");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "could not save the lecture"))
        }
    }
}

async fn reset_timetable(
    Inject(timetable_service): Inject<dyn TimetableService>,
    ExtractStudent(student_id): ExtractStudent,
) -> StatusCode {
    match timetable_service.reset(student_id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            error!("failed to reset timetable: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn run_command(
    Inject(command_service): Inject<dyn CommandService>,
    ExtractStudent(student_id): ExtractStudent,
    Json(command): Json<RunCommand>,
) -> Json<CommandReply> {
    let outcome = command_service.execute(student_id, &command.text).await;

    Json(CommandReply {
        reply: outcome.reply,
        lectures: outcome.lectures,
    })
}

pub mod schemas {
    use crate::infrastructure::entities::LectureRecord;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Debug, Default)]
    pub struct LectureList {
        pub lectures: Vec<LectureRecord>,
    }

    /// Lecture form. Missing fields arrive as empty strings and are rejected
    /// by validation rather than by the JSON extractor.
    #[derive(Deserialize, Debug, Default)]
    #[serde(default)]
    pub struct NewLecture {
        pub course: String,
        pub lecturer: String,
        pub room: String,
        pub time: String,
    }

    impl From<NewLecture> for LectureRecord {
        fn from(lecture: NewLecture) -> Self {
            LectureRecord::new(lecture.course, lecture.lecturer, lecture.room, lecture.time)
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct RunCommand {
        pub text: String,
    }

    #[derive(Serialize, Debug)]
    pub struct CommandReply {
        pub reply: String,
        pub lectures: Vec<LectureRecord>,
    }
}
