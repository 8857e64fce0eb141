//! Default prompts.

/// Single-turn summarization instruction. `{content}` is replaced with the text.
pub const DEFAULT_SUMMARY_PROMPT: &str =
    "Please summarize the provided text in less than 30 characters: {content}";
