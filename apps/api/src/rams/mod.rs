// RAMS generation: structured job input → method statement + COSHH section.
// All LLM calls go through llm_client. Failures degrade to boilerplate in fallback.

pub mod fallback;
pub mod generator;
pub mod handlers;
pub mod models;
pub mod prompts;
