// AI content layer: prompt composition, completion, output normalization and
// per-task fallback. All LLM calls go through llm_client, never reqwest here.

pub mod composer;
pub mod generator;
pub mod handlers;
pub mod image;
pub mod normalizer;
pub mod prompts;
pub mod request;
