// Prompt constants for JD signal analysis.

/// System prompt for JD analysis.
pub const JD_SIGNALS_SYSTEM: &str = "You are an expert job description analyzer. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// JD analysis prompt template.
/// Replace: {cluster_list}, {cluster_definitions}, {jd_text}
pub const JD_SIGNALS_PROMPT_TEMPLATE: &str = r#"Analyze the following Job Description and identify how strongly it emphasizes each of these signal clusters:
[{cluster_list}]

Definitions:
{cluster_definitions}

Weighting Rules (0-10 scale):
- Required skills/core tasks: 8-10
- Day-to-day responsibilities: 5-7
- Preferred/Bonus skills: 3-4
- Not mentioned / irrelevant: 0-1

Return a STRICT JSON object with these keys:
- "signal_weights": object mapping cluster names to integer weights (0-10).
- "top_5_signals": list of the 5 highest-weighted clusters (strings).
- "top_keywords": list of the 10 most critical hard skills/technologies (strings).
- "domain_phrases": list of up to 5 short phrases describing industry, users, or mission
    (e.g., "K-12 schools", "students and teachers", "healthcare providers").

Job Description:
{jd_text}"#;
