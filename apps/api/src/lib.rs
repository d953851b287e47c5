//! Journal: a personal journaling service and the client-side logic that drives it.
//!
//! The server half (`routes` and below) hosts the blob upload gateway, entry storage,
//! prompts and the pending-draft hand-off. The `client` half holds the recording
//! state machine, image attachment, entry composition and the HTTP client for the API.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod drafts;
pub mod entries;
pub mod errors;
pub mod format;
pub mod models;
pub mod prompts;
pub mod routes;
pub mod state;
pub mod storage;
