//! Speech output.

use crate::core::traits::Speaker;
use async_trait::async_trait;
use di::{inject, injectable};
use log::info;

/// Records utterances on the `speech` log target. Clients do the actual
/// synthesis from the `speak` flag of each reply.
pub struct LogSpeaker;

#[injectable(Speaker)]
impl LogSpeaker {
    #[inject]
    pub fn create() -> LogSpeaker {
        LogSpeaker
    }
}

#[async_trait]
impl Speaker for LogSpeaker {
    async fn speak(&self, text: &str) {
        info!(target: "speech", "{text}");
    }
}
