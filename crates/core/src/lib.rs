//! santapost core library.
//!
//! This crate provides the foundational components for the Secret Santa
//! mailer: configuration, roster loading and validation, derangement
//! pairing, email templates, the SMTP dispatcher, and the GIPHY client.

pub mod config;
pub mod errors;
pub mod giphy;
pub mod notify;
pub mod pairing;
pub mod roster;

// Re-exports for convenience.
pub use config::AppConfig;
pub use pairing::Pairing;
pub use roster::{Participant, Roster};
