// Ticket triage: local inference, prompt building, dual-backend dispatch and response parsing.
// All LLM calls go through llm_client, never direct provider HTTP calls.

pub mod classify;
pub mod dispatcher;
pub mod effort;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod product;
pub mod prompts;
pub mod scoring;
pub mod webhook;
