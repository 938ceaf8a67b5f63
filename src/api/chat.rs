//! Chat endpoints

use crate::api::ExtractStudent;
use crate::api::chat::schemas::{MessagePart, SendMessage};
use crate::core::chat::ChatMessage;
use crate::core::reveal::reveal;
use crate::core::traits::ChatService;
use async_stream::stream;
use axum::http::StatusCode;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;
use futures_util::{Stream, StreamExt, pin_mut};
use log::debug;
use tokio_util::sync::CancellationToken;

const EMPTY_MESSAGE: (StatusCode, &str) = (StatusCode::BAD_REQUEST, "message text is empty");

pub fn router() -> Router {
    Router::new()
        .route("/", post(send_message))
        .route("/stream", post(stream_message))
}

async fn send_message(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractStudent(student_id): ExtractStudent,
    Json(message): Json<SendMessage>,
) -> Result<Json<schemas::ChatTurn>, (StatusCode, &'static str)> {
    if message.text.trim().is_empty() {
        return Err(EMPTY_MESSAGE);
    }

    let turn = chat_service
        .respond(student_id, &message.text, message.voice_mode)
        .await;

    Ok(Json(turn.into()))
}

/// Streams a reply the way the app renders it: the echoed user message
/// (sent before Remi starts answering), growing prefixes of Remi's reply,
/// then the finished turn.
///
/// Dropping the response (client disconnect) cancels both the pending
/// remote call and the reveal.
async fn stream_message(
    Inject(chat_service): Inject<dyn ChatService>,
    ExtractStudent(student_id): ExtractStudent,
    Json(message): Json<SendMessage>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, (StatusCode, &'static str)> {
    if message.text.trim().is_empty() {
        return Err(EMPTY_MESSAGE);
    }

    let cancel = CancellationToken::new();
    let tick = chat_service.reveal_tick();

    let stream = stream! {
        let _cancel_on_drop = cancel.clone().drop_guard();

        let user_message = ChatMessage::user(message.text.trim());
        yield Event::default()
            .event("new_message")
            .json_data(schemas::Message::from(user_message.clone()));

        let turn = chat_service
            .reply_to(student_id, user_message, message.voice_mode)
            .await;

        let message_id = turn.reply.id;
        let frames = reveal(turn.reply.text.clone(), tick, cancel.clone());
        pin_mut!(frames);

        while let Some(text) = frames.next().await {
            yield Event::default()
                .event("message_part")
                .json_data(MessagePart { message_id, text });
        }

        debug!("reveal of {message_id} finished");
        yield Event::default()
            .event("message_done")
            .json_data(schemas::ChatTurn::from(turn));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub mod schemas {
    use crate::core::chat::{self, Sender, Strategy};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct SendMessage {
        pub text: String,
        #[serde(default)]
        pub voice_mode: bool,
    }

    #[derive(Serialize, Debug)]
    pub struct Message {
        pub id: Uuid,
        pub sender: Sender,
        pub text: String,
    }

    impl From<chat::ChatMessage> for Message {
        fn from(message: chat::ChatMessage) -> Self {
            Message {
                id: message.id,
                sender: message.sender,
                text: message.text,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ChatTurn {
        pub messages: Vec<Message>,
        pub strategy: Strategy,
        pub speak: bool,
    }

    impl From<chat::ChatTurn> for ChatTurn {
        fn from(turn: chat::ChatTurn) -> Self {
            ChatTurn {
                messages: vec![turn.user_message.into(), turn.reply.into()],
                strategy: turn.strategy,
                speak: turn.speak,
            }
        }
    }

    /// One reveal frame: the first `n` characters of the reply.
    #[derive(Serialize, Debug)]
    pub struct MessagePart {
        pub message_id: Uuid,
        pub text: String,
    }
}
