// Resume bullets: pure extraction from LaTeX and LLM-assisted tagging.

pub mod extractor;
pub mod prompts;
pub mod tagger;

pub use extractor::extract_resume_items;
pub use tagger::tag_bullets;
