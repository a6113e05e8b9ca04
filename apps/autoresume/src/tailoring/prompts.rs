// Prompt constants for the resume rewrite step.

/// System prompt for the rewrite — raw LaTeX out, nothing else.
pub const REWRITE_SYSTEM: &str = "You are an elite resume-tailoring engine. \
    Return ONLY raw LaTeX. No markdown, no explanations, no backticks.";

/// Rewrite prompt template.
/// Replace: {truthfulness_instruction}, {top_signals}, {top_keywords}, {domain_phrases},
///          {bullets_json}, {resume_latex}
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite the \resumeItem{...} bullets in the LaTeX code to better align with the Job Description signals.

{truthfulness_instruction}

SCORING CONTEXT:
You will see a JSON list of bullets, ranked best-first, with:
- "bullet_text"
- "tags" (signal clusters)
- "alignment_score" (higher = more relevant to this job)
- "selected" (whether the bullet fits the content budget)

DYNAMIC SCORING DIRECTIVES:
- High-Scoring Bullets: Keep them, optionally move slightly higher within their section, and expand meaningful technical depth where useful.
- Low-Scoring Bullets: Compress aggressively (around 15-18 words), or reframe them to more strongly touch on a Top 5 Signal *only if authentic*.
- Bullets with "selected": false: remove them from the document. Never remove a whole entry's last bullet.

KEYWORD & DOMAIN ALIGNMENT:
- Top 5 JD Signals: {top_signals}
- Top 10 Keywords: {top_keywords}
- Domain Phrases: {domain_phrases}

ENFORCEMENT:
- Ensure at least ONE strong bullet explicitly reflects EACH of the Top 5 Signals.
- When the Job Description clearly indicates a specific domain or user group, reflect that domain in 2-3 bullets where the connection is natural.
- Reuse 2-3 domain phrases only when it is honest. If the project was not actually in that domain, phrase it as "similar to how [domain users] do X".

USER & IMPACT FRAMING:
- Emphasize who benefits from the work (users, customers, stakeholders), especially if "product_user_focus" is a high-weight signal.
- When mentioning teamwork, communication, documentation, or learning, briefly indicate the context.

AVOID GENERIC PHRASES:
- Do NOT end bullets with abstract phrases like "supporting learning and growth" or "demonstrating user focus".
- End bullets with a concrete impact: reduced errors or manual work, faster workflows, clearer feedback for specific users.

NON-WORDY ENFORCEMENT:
- Target: 20-28 words per bullet. Hard max: 30 words.
- Maximum 2 commas per bullet. Maximum 1 "and" per bullet.
- Remove filler ("leveraged", "utilized", "cutting-edge", "comprehensive"). Prefer concrete verbs.
- Bold 2-3 highly relevant keywords in each bullet using \textbf{...}.

LATEX SAFETY:
- Preserve section order. Do NOT add or remove sections.
- Ensure "Technical Skills" and "Education" sections appear exactly once.
- Keep the same LaTeX structure (\section, \resumeSubheading, \resumeItem, etc.).

Scored Bullets Context (JSON):
{bullets_json}

Current LaTeX Resume:
{resume_latex}"#;
