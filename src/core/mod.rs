pub mod assistant;
pub mod chat;
pub mod command;
pub mod reveal;
pub mod router;
pub mod services;
pub mod speech;
pub mod traits;
