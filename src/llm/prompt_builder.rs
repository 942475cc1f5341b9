use crate::llm::prompts;
use crate::style::StyleProfile;

/// Largest diff sent verbatim when no other limit is configured.
pub const DEFAULT_MAX_DIFF_BYTES: usize = 60_000;

/// Inputs of one commit-message prompt. Never persisted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptContext<'a> {
    pub diff: &'a str,
    pub profile: Option<&'a StyleProfile>,
    /// Guidelines already resolved for this run (explicit value or cached one).
    pub guidelines: Option<&'a str>,
    pub context: Option<&'a str>,
}

/// Compose the single prompt sent to the model.
pub fn build_commit_prompt(ctx: &PromptContext<'_>, max_diff_bytes: usize) -> String {
    let mut prompt = String::new();
    prompt.push_str(prompts::COMMIT_INSTRUCTIONS);
    prompt.push_str("\n\n");

    if let Some(summary) = ctx
        .profile
        .and_then(|p| p.summary.as_deref())
        .filter(|s| !s.trim().is_empty())
    {
        prompt.push_str("## Repository commit style\n");
        prompt.push_str(summary.trim());
        prompt.push_str("\n\n");
    }

    if let Some(guidelines) = ctx.guidelines.filter(|g| !g.trim().is_empty()) {
        prompt.push_str("## Commit message guidelines\n");
        prompt.push_str(guidelines.trim());
        prompt.push_str("\n\n");
    }

    let (diff, omitted) = truncate_diff(ctx.diff, max_diff_bytes);
    prompt.push_str("## Staged changes (git diff --cached)\n```diff\n");
    prompt.push_str(diff);
    if !diff.is_empty() && !diff.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("```\n");
    if omitted > 0 {
        prompt.push_str(&format!(
            "[diff truncated: {omitted} of {} bytes omitted]\n",
            ctx.diff.len()
        ));
    }
    prompt.push('\n');

    if let Some(extra) = ctx.context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("## Additional context from the author\n");
        prompt.push_str(extra.trim());
        prompt.push_str("\n\n");
    }

    prompt.push_str(prompts::OUTPUT_RULES);
    prompt.push('\n');
    prompt
}

/// Cut `diff` to at most `max` bytes on a char boundary. Returns the kept
/// slice and how many bytes were dropped.
fn truncate_diff(diff: &str, max: usize) -> (&str, usize) {
    if diff.len() <= max {
        return (diff, 0);
    }

    let mut end = max;
    while !diff.is_char_boundary(end) {
        end -= 1;
    }
    (&diff[..end], diff.len() - end)
}
