pub mod common;
pub mod config;
pub mod events;
pub mod list;
pub mod report;
pub mod watch;
