//! Remi academic assistant backend - Library exports for testing
//!

pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod infrastructure;

use crate::config::Settings;
use crate::core::assistant::HttpRemoteAssistant;
use crate::core::services::{MyChatService, MyCommandService, MyTimetableService};
use crate::core::speech::LogSpeaker;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::repositories::DbKeyValueRepository;
use di::{Injectable, ServiceCollection};

/// Production service registrations.
pub fn services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add(Settings::singleton())
        .add(DatabaseConnection::singleton())
        .add(HttpRemoteAssistant::singleton())
        .add(LogSpeaker::singleton())
        .add(DbKeyValueRepository::scoped())
        .add(MyTimetableService::scoped())
        .add(MyChatService::scoped())
        .add(MyCommandService::scoped());
    services
}
