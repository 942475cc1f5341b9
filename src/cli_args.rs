use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Long flags consumed by git-ai-commit that take no value.
const OWN_SWITCHES: &[&str] = &[
    "--analyze",
    "--force-analyze",
    "--verbose",
    "--dry-run",
    "--auto-commit",
    "--help",
    "--version",
];

/// Long flags consumed by git-ai-commit that take a value.
const OWN_OPTIONS: &[&str] = &[
    "--history-depth",
    "--cache-file",
    "--context",
    "--guidelines",
    "--model",
];

/// `git commit` options whose value may be the next argument. The value is
/// forwarded with its flag and never interpreted as one of ours.
const GIT_LONG_OPTIONS: &[&str] = &[
    "--message",
    "--file",
    "--author",
    "--date",
    "--cleanup",
    "--reuse-message",
    "--reedit-message",
    "--fixup",
    "--squash",
    "--template",
    "--trailer",
    "--pathspec-from-file",
];

/// Short `git commit` switches that may precede another letter in a cluster (`-am`).
const GIT_SHORT_SWITCHES: &str = "aeinopqsvz";
/// Short `git commit` options that take a value.
const GIT_SHORT_OPTIONS: &str = "mFCct";

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "git-ai-commit",
    version,
    about = "LLM-assisted Git commit message generator",
    after_help = "Any other arguments (e.g. --amend, -S, pathspecs) are passed through to `git commit`.\n\
                  Passing -m, -F or --file skips generation and commits with your message."
)]
#[command(group(
    ArgGroup::new("confirm_group")
        .args(["verbose", "auto_commit"])
        .multiple(false)
))]
pub struct Cli {
    /// Analyze recent history, write the style cache, and exit
    #[arg(long)]
    pub analyze: bool,

    /// Number of commits to scan when analyzing style
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub history_depth: Option<u32>,

    /// Re-analyze style before generating, even if a cached profile exists
    #[arg(long)]
    pub force_analyze: bool,

    /// Style cache location (default: .git/ai-commit-style.json)
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    pub cache_file: Option<PathBuf>,

    /// Free-text hint added to the prompt
    #[arg(long, value_name = "TEXT", allow_hyphen_values = true)]
    pub context: Option<String>,

    /// Commit guidelines: inline text, a file path, or an http(s) URL (cached for later runs)
    #[arg(long, value_name = "VALUE", allow_hyphen_values = true)]
    pub guidelines: Option<String>,

    /// Show progress and confirm the message before committing
    #[arg(long)]
    pub verbose: bool,

    /// Print the generated message without committing
    #[arg(long)]
    pub dry_run: bool,

    /// Commit immediately with the generated message, without opening the editor
    #[arg(long)]
    pub auto_commit: bool,

    /// Gemini model name (e.g. gemini-1.5-flash)
    #[arg(long, allow_hyphen_values = true)]
    pub model: Option<String>,
}

/// Arguments split into ours and those destined for `git commit`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SplitArgs {
    pub own: Vec<String>,
    pub forwarded: Vec<String>,
}

/// Separate known flags from the passthrough list, keeping both in original order.
pub fn split_args<I>(args: I) -> SplitArgs
where
    I: IntoIterator<Item = String>,
{
    let mut split = SplitArgs::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            split.forwarded.push(arg);
            split.forwarded.extend(iter.by_ref());
            break;
        }

        if arg.starts_with("--") {
            let (name, attached) = match arg.split_once('=') {
                Some((name, _)) => (name, true),
                None => (arg.as_str(), false),
            };

            if OWN_SWITCHES.contains(&name) {
                split.own.push(arg);
            } else if OWN_OPTIONS.contains(&name) {
                split.own.push(arg);
                if !attached {
                    split.own.extend(iter.next());
                }
            } else {
                let takes_next = !attached && GIT_LONG_OPTIONS.contains(&name);
                split.forwarded.push(arg);
                if takes_next {
                    split.forwarded.extend(iter.next());
                }
            }
            continue;
        }

        if arg == "-h" || arg == "-V" {
            split.own.push(arg);
            continue;
        }

        let takes_next = matches!(short_value_option(&arg), Some((_, false)));
        split.forwarded.push(arg);
        if takes_next {
            split.forwarded.extend(iter.next());
        }
    }

    split
}

/// For a short-option cluster like `-am` or `-mfix`, the first value-taking
/// letter and whether its value is attached.
fn short_value_option(arg: &str) -> Option<(char, bool)> {
    let cluster = arg.strip_prefix('-').filter(|c| !c.starts_with('-'))?;
    let mut chars = cluster.char_indices();

    while let Some((idx, c)) = chars.next() {
        if GIT_SHORT_OPTIONS.contains(c) {
            let attached = idx + c.len_utf8() < cluster.len();
            return Some((c, attached));
        }
        if !GIT_SHORT_SWITCHES.contains(c) {
            return None;
        }
    }

    None
}

/// Does the forwarded list already carry a commit message (`-m`, `-F`, `--file`)?
pub fn has_explicit_message(forwarded: &[String]) -> bool {
    let mut iter = forwarded.iter();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        if arg.starts_with("--") {
            let name = arg.split_once('=').map_or(arg.as_str(), |(n, _)| n);
            if name == "--message" || name == "--file" {
                return true;
            }
            if GIT_LONG_OPTIONS.contains(&name) && !arg.contains('=') {
                iter.next();
            }
            continue;
        }

        match short_value_option(arg) {
            Some(('m' | 'F', _)) => return true,
            Some((_, false)) => {
                iter.next();
            }
            _ => {}
        }
    }

    false
}

/// Parsed invocation: our flags, the passthrough list, and whether the user
/// supplied their own message.
#[derive(Debug)]
pub struct CommitRequest {
    pub cli: Cli,
    pub forwarded: Vec<String>,
    pub explicit_message: bool,
}

impl CommitRequest {
    /// Parse everything after the program name.
    pub fn parse_from<I>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = String>,
    {
        let split = split_args(args);
        let cli = Cli::try_parse_from(std::iter::once("git-ai-commit".to_string()).chain(split.own))?;
        let explicit_message = has_explicit_message(&split.forwarded);

        Ok(CommitRequest {
            cli,
            forwarded: split.forwarded,
            explicit_message,
        })
    }
}
