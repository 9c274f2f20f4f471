pub mod attachments;
pub mod common;
pub mod config;
pub mod record;
