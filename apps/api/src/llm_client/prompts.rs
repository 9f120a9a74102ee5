// Shared prompt fragments.
// Task-specific role text lives in generation/prompts.rs. The fragments here
// are applied identically to every content task.

/// Style rule 1: no emphasis characters or emojis.
pub const NO_EMPHASIS_RULE: &str = "1. DO NOT use ANY emojis or emphasis characters \
    (no bold, no italics, no asterisks for emphasis). Ever.";

/// Style rule 2: bullet-structured explanations.
pub const BULLET_STRUCTURE_RULE: &str = "2. Structure your explanations using concise \
    point-wise lists (bullet points).";

/// Header placed in front of the numbered style rules.
pub const STYLE_RULES_HEADER: &str = "CRITICAL RULES:";

/// Style rule 3: at least one inline image whose URL path is a percent-encoded
/// description served by the image-rendering origin.
pub fn image_markup_rule(image_origin: &str) -> String {
    format!(
        "3. To explain topics visually, you MUST include at least one image using Markdown \
        image syntax: `![Description]({image_origin}detailed%20url%20encoded%20description%20of%20image)` \
        where the URL path is a URL-encoded descriptive phrase."
    )
}

/// The three invariant style rules, in order, as one block.
pub fn style_rules(image_origin: &str) -> String {
    format!(
        "{STYLE_RULES_HEADER} {NO_EMPHASIS_RULE} {BULLET_STRUCTURE_RULE} {}",
        image_markup_rule(image_origin)
    )
}

/// Fragment that forces a single bare JSON object. Callers append the key list.
pub const JSON_OBJECT_ONLY: &str = "You MUST respond with ONLY a single valid JSON object. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Renders the exact key list the JSON object must carry.
pub fn required_keys_instruction(keys: &[&str]) -> String {
    let quoted = keys
        .iter()
        .map(|k| format!("'{k}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("The object MUST have exactly these keys: {quoted}.")
}
