// Job records: persistence plus the HTTP surface that drives analysis and letters.
// All LLM work is delegated to the assistant module.

pub mod handlers;
pub mod repository;
