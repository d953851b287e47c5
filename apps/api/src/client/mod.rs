//! Client-side journaling logic, independent of any UI toolkit.
//!
//! Each piece owns one part of composing an entry and talks to the server through the
//! traits in [`api`], so a UI layer only forwards user actions and renders state.

pub mod api;
pub mod composer;
pub mod error;
pub mod image;
mod pending;
pub mod prompts;
pub mod recorder;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ClientError;
