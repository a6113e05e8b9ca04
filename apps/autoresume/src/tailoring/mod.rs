// Resume tailoring: rewrite prompt, full-run orchestration, and HTTP handlers.
// All model calls go through llm_client::TextGenerator.

pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod rewriter;

pub use pipeline::{TailorReport, TailorRequest, TailoringPipeline};
