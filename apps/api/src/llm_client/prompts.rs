// Prompt fragments shared by every caller of the LLM client.
// Feature-specific prompts live next to the feature (see generation/prompts.rs).

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Placeholder the prompts use for any value the user left blank.
pub const NOT_AVAILABLE: &str = "N/A";
