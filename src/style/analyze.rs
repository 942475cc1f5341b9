use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::StyleProfile;
use crate::git::CommitRecord;

/// How many subjects are quoted verbatim in the summary.
const EXAMPLE_SUBJECTS: usize = 10;

static CONVENTIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>[a-z]+)(\([^)]*\))?!?: \S").expect("static regex")
});

/// Derive a style profile from recent commit messages.
///
/// Purely local: the summary is built from counts over `commits`, so the same
/// history always yields the same text.
pub fn analyze(commits: &[CommitRecord], now: DateTime<Utc>) -> StyleProfile {
    StyleProfile {
        history_depth: u32::try_from(commits.len()).unwrap_or(u32::MAX),
        summary: Some(summarize(commits)),
        guidelines: None,
        generated_at: Some(now),
    }
}

fn summarize(commits: &[CommitRecord]) -> String {
    if commits.is_empty() {
        return "No previous commits found. This is likely the initial commit.".to_string();
    }

    let total = commits.len();
    let mut types: BTreeMap<String, usize> = BTreeMap::new();
    let mut conventional = 0;
    let mut with_body = 0;
    let mut capitalized = 0;
    let mut trailing_period = 0;
    let mut subject_chars = 0;

    for commit in commits {
        let subject = commit.subject.trim();
        subject_chars += subject.chars().count();

        if let Some(caps) = CONVENTIONAL.captures(subject) {
            conventional += 1;
            *types.entry(caps["type"].to_string()).or_default() += 1;
        }
        if !commit.body.trim().is_empty() {
            with_body += 1;
        }
        if subject.chars().next().is_some_and(char::is_uppercase) {
            capitalized += 1;
        }
        if subject.ends_with('.') {
            trailing_period += 1;
        }
    }

    let mut out = String::new();
    out.push_str(&format!("Based on the last {total} commit(s):\n"));

    if conventional * 2 > total {
        let mut ranked: Vec<(String, usize)> = types.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let top = ranked
            .iter()
            .take(6)
            .map(|(t, n)| format!("{t} ({n})"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "- Uses Conventional Commit prefixes in {} of subjects; common types: {top}.\n",
            percent(conventional, total)
        ));
    } else {
        out.push_str(&format!(
            "- Mostly free-form subjects; only {} use a `type: ` prefix.\n",
            percent(conventional, total)
        ));
    }

    out.push_str(&format!(
        "- Average subject length is {} characters.\n",
        subject_chars / total
    ));
    out.push_str(&format!(
        "- {} of subjects start with a capital letter; {} end with a period.\n",
        percent(capitalized, total),
        percent(trailing_period, total)
    ));
    out.push_str(&format!(
        "- {} of commits include a body after the subject.\n",
        percent(with_body, total)
    ));

    out.push_str("Recent subjects:\n");
    for commit in commits.iter().take(EXAMPLE_SUBJECTS) {
        out.push_str(&format!("- {}\n", commit.subject.trim()));
    }

    out.trim_end().to_string()
}

fn percent(part: usize, total: usize) -> String {
    format!("{}%", part * 100 / total.max(1))
}
