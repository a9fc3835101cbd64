pub mod chat;
pub mod filters;
pub mod job;
pub mod matching;
