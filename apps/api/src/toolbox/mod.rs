// Toolbox talks: short on-site safety briefings generated from a topic.

pub mod generator;
pub mod handlers;
pub mod models;
pub mod prompts;
