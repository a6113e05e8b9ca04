// Prompt constants for bullet tagging.

/// System prompt for bullet tagging.
pub const TAGGING_SYSTEM: &str = "You are analyzing a LaTeX resume. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Bullet tagging prompt template.
/// Replace: {cluster_list}, {resume_latex}
pub const TAGGING_PROMPT_TEMPLATE: &str = r#"The resume below uses \resumeItem{...} for bullet points.

Task:
1. Extract EVERY bullet point (the text inside \resumeItem{...}).
2. For each bullet, assign 1 to 3 relevant signal clusters from this exact list:
   [{cluster_list}]

Return a STRICT JSON object with this shape:
{
  "tagged_bullets": [
    {
      "bullet_text": "The exact original text inside \resumeItem{...}",
      "tags": ["cluster1", "cluster2"]
    }
  ]
}

LaTeX Resume:
{resume_latex}"#;
