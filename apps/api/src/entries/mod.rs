// Entry composition on the server side: validation, persistence and browsing.

pub mod handlers;
pub mod repository;
