//! Bullet Tagger — asks the model to label each resume bullet with 1–3 signal clusters.
//!
//! Model output is untrusted: malformed entries are skipped, tags are normalized, and
//! tags outside the weight mapping are dropped here so the scorer only ever sees
//! configured categories.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::bullets::prompts::{TAGGING_PROMPT_TEMPLATE, TAGGING_SYSTEM};
use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{call_json, LlmError, TextGenerator};
use crate::scoring::ResumeBullet;
use crate::signals::catalogue::{catalogue_names, CategoryWeights, SignalCategory};

#[derive(Debug, Deserialize)]
struct TaggingReply {
    #[serde(default)]
    tagged_bullets: Value,
}

#[derive(Debug, Deserialize)]
struct RawTaggedBullet {
    #[serde(default)]
    bullet_text: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Builds the tagging prompt for a LaTeX resume.
pub fn build_tagging_prompt(resume_latex: &str) -> String {
    fill_template(
        TAGGING_PROMPT_TEMPLATE,
        &[
            ("cluster_list", catalogue_names().as_str()),
            ("resume_latex", resume_latex),
        ],
    )
}

/// Tags every bullet in `resume_latex`. Returns an empty list (with a warning) when the
/// model's reply is not usable; transport failures are errors.
pub async fn tag_bullets(
    resume_latex: &str,
    llm: &dyn TextGenerator,
    weights: &CategoryWeights,
) -> Result<Vec<ResumeBullet>, AppError> {
    let prompt = build_tagging_prompt(resume_latex);

    let reply = match call_json::<TaggingReply>(llm, &prompt, TAGGING_SYSTEM).await {
        Ok(reply) => reply,
        Err(LlmError::Parse(e)) => {
            warn!("Failed to parse JSON for bullet tagging: {e}");
            return Ok(Vec::new());
        }
        Err(e) => return Err(AppError::Llm(format!("Bullet tagging failed: {e}"))),
    };

    Ok(bullets_from_reply(reply.tagged_bullets, weights))
}

fn bullets_from_reply(tagged: Value, weights: &CategoryWeights) -> Vec<ResumeBullet> {
    let Value::Array(entries) = tagged else {
        warn!("Tagging reply has no 'tagged_bullets' list; ignoring it");
        return Vec::new();
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RawTaggedBullet>(entry) {
            Ok(raw) => Some(raw),
            Err(e) => {
                debug!("Skipping malformed tagged bullet: {e}");
                None
            }
        })
        .filter_map(|raw| {
            let text = raw.bullet_text?.trim().to_string();
            if text.is_empty() {
                return None;
            }
            let tags = normalize_tags(&text, raw.tags.unwrap_or_default(), weights);
            Some(ResumeBullet { text, tags })
        })
        .collect()
}

/// Normalizes raw tag strings and keeps only categories present in `weights`,
/// deduplicated in first-seen order.
pub fn normalize_tags(
    bullet_text: &str,
    raw_tags: Vec<String>,
    weights: &CategoryWeights,
) -> Vec<SignalCategory> {
    let mut tags: Vec<SignalCategory> = Vec::new();

    for raw in raw_tags {
        let category = SignalCategory::new(&raw);
        if category.as_str().is_empty() || tags.contains(&category) {
            continue;
        }
        if !weights.contains(&category) {
            warn!(
                "Dropping unknown tag '{}' on bullet {:?}",
                raw,
                bullet_text.chars().take(60).collect::<String>()
            );
            continue;
        }
        tags.push(category);
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ResponseFormat;
    use async_trait::async_trait;
    use serde_json::json;

    struct CannedReply(Result<&'static str, u16>);

    #[async_trait]
    impl TextGenerator for CannedReply {
        async fn generate(
            &self,
            prompt: &str,
            _system: &str,
            _format: ResponseFormat,
        ) -> Result<String, LlmError> {
            assert!(prompt.contains("tagged_bullets"));
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(LlmError::Api {
                    status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_normalize_tags_drops_unknown_and_duplicates() {
        let weights = CategoryWeights::default();
        let tags = normalize_tags(
            "Built APIs",
            vec![
                "Backend".to_string(),
                "backend".to_string(),
                "quantum".to_string(),
                "cloud-devops".to_string(),
                " ".to_string(),
            ],
            &weights,
        );
        assert_eq!(
            tags,
            vec![SignalCategory::new("backend"), SignalCategory::new("cloud_devops")]
        );
    }

    #[test]
    fn test_reply_with_non_list_is_empty() {
        let bullets = bullets_from_reply(json!({"oops": 1}), &CategoryWeights::default());
        assert!(bullets.is_empty());
    }

    #[test]
    fn test_reply_skips_malformed_and_blank_entries() {
        let reply = json!([
            {"bullet_text": "Built REST APIs", "tags": ["backend"]},
            {"bullet_text": "   ", "tags": ["backend"]},
            {"tags": ["frontend"]},
            "not an object",
            {"bullet_text": "Ran standups", "tags": null}
        ]);
        let bullets = bullets_from_reply(reply, &CategoryWeights::default());
        assert_eq!(bullets.len(), 2);
        assert_eq!(bullets[0].tags, vec![SignalCategory::new("backend")]);
        assert!(bullets[1].tags.is_empty());
    }

    #[test]
    fn test_prompt_embeds_resume() {
        let prompt = build_tagging_prompt("\\resumeItem{Shipped a thing}");
        assert!(prompt.contains("Shipped a thing"));
        assert!(prompt.contains("teamwork_communication"));
    }

    #[tokio::test]
    async fn test_tag_bullets_happy_path() {
        let llm = CannedReply(Ok(
            r#"{"tagged_bullets": [{"bullet_text": "Built APIs", "tags": ["backend", "Performance Scalability"]}]}"#,
        ));
        let bullets = tag_bullets("doc", &llm, &CategoryWeights::default())
            .await
            .unwrap();
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].tags[1].as_str(), "performance_scalability");
    }

    #[tokio::test]
    async fn test_tag_bullets_unparseable_reply_is_empty() {
        let llm = CannedReply(Ok("not json at all"));
        let bullets = tag_bullets("doc", &llm, &CategoryWeights::default())
            .await
            .unwrap();
        assert!(bullets.is_empty());
    }

    #[tokio::test]
    async fn test_tag_bullets_api_failure_is_error() {
        let llm = CannedReply(Err(400));
        let result = tag_bullets("doc", &llm, &CategoryWeights::default()).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
