//! Prompt construction for commit message generation.

use crate::gemini::client::{
    Content, GenerateContentRequest, GenerationConfig, Part, SafetySetting,
};

/// Maximum characters of diff text sent to the model, truncation marker included.
pub const MAX_DIFF_LENGTH: usize = 50_000;

/// Appended to a diff that was cut short.
pub const TRUNCATION_MARKER: &str = "\n... (diff truncated)";

const MAX_OUTPUT_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.3;
const TOP_P: f32 = 0.8;
const TOP_K: u32 = 40;

/// Harm categories relaxed so diffs touching security code are not refused.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Cut `diff` so the result, marker included, fits in [`MAX_DIFF_LENGTH`] characters.
///
/// Returns the text and whether it was truncated.
pub fn truncate_diff(diff: &str) -> (String, bool) {
    if diff.chars().count() <= MAX_DIFF_LENGTH {
        return (diff.to_string(), false);
    }

    let keep = MAX_DIFF_LENGTH - TRUNCATION_MARKER.chars().count();
    let end = diff
        .char_indices()
        .nth(keep)
        .map_or(diff.len(), |(index, _)| index);

    let mut text = String::with_capacity(end + TRUNCATION_MARKER.len());
    text.push_str(&diff[..end]);
    text.push_str(TRUNCATION_MARKER);
    (text, true)
}

/// Build the instruction text for a (possibly truncated) diff.
pub fn build_prompt(diff: &str) -> String {
    format!(
        "Analyze the following git diff and generate a concise, professional commit message.

The commit message should:
- Be clear and descriptive
- Follow conventional commit format if applicable
- Be no longer than 72 characters for the subject line
- Not include explanations or meta-commentary, just the commit message itself

Git diff:
{diff}

Commit message:"
    )
}

/// Full request body: prompt, sampling parameters and safety thresholds.
pub fn build_request(prompt: String) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part { text: Some(prompt) }],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            top_k: TOP_K,
        },
        safety_settings: SAFETY_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: category.to_string(),
                threshold: "BLOCK_NONE".to_string(),
            })
            .collect(),
    }
}
