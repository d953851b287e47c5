pub mod draft;
pub mod entry;
pub mod prompt;
pub mod upload;
