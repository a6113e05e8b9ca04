// Shared prompt fragments. Each module that calls the model keeps its own prompts.rs
// alongside it; this file holds the cross-cutting pieces.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Appended to every rewrite prompt.
pub const TRUTHFULNESS_INSTRUCTION: &str = "\
    CRITICAL: Stay 100% truthful. Never invent employers, projects, metrics, tools, or users \
    that are not present in the source resume. Reframe emphasis only.";

/// Fills `{name}` placeholders in one pass over `template`. Substituted text is never
/// rescanned, so values that contain `{name}` stay literal. Unknown placeholders are kept.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder =
        PLACEHOLDER.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("valid regex"));

    placeholder
        .replace_all(template, |caps: &Captures<'_>| {
            match values.iter().find(|(name, _)| *name == &caps[1]) {
                Some((_, value)) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
