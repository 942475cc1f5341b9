//! The commit flow: decide whether to generate, build the prompt, and hand
//! the result to `git commit`.

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;

use crate::cli_args::CommitRequest;
use crate::config::Config;
use crate::error::GenerationError;
use crate::git::{self, Git};
use crate::guidelines::GuidelineSource;
use crate::llm::LlmClient;
use crate::llm::prompt_builder::{PromptContext, build_commit_prompt};
use crate::style::{self, StyleCache, StyleProfile};
use crate::term::{self, Console};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `git commit` ran with the user's own message flags.
    Delegated(i32),
    /// `git commit` ran with a generated (or empty) message.
    Committed(i32),
    Previewed,
    Aborted,
    NothingStaged,
    Analyzed,
}

impl Outcome {
    /// Process exit status: git's own status when it ran, otherwise success.
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Delegated(code) | Outcome::Committed(code) => *code,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    DryRun,
    Quiet,
    AutoCommit,
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Accept,
    Edit,
    Retry,
    Abort,
}

impl Choice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "a" | "accept" | "y" | "yes" => Some(Choice::Accept),
            "e" | "edit" => Some(Choice::Edit),
            "r" | "retry" => Some(Choice::Retry),
            "b" | "abort" | "n" | "no" | "q" => Some(Choice::Abort),
            _ => None,
        }
    }
}

pub struct CommitFlow<'a> {
    req: &'a CommitRequest,
    cfg: &'a Config,
    git: &'a dyn Git,
    console: &'a dyn Console,
}

impl<'a> CommitFlow<'a> {
    pub fn new(
        req: &'a CommitRequest,
        cfg: &'a Config,
        git: &'a dyn Git,
        console: &'a dyn Console,
    ) -> Self {
        CommitFlow {
            req,
            cfg,
            git,
            console,
        }
    }

    /// Run one invocation. `connect` builds the model client and is only
    /// called once generation is actually needed.
    pub fn run<F>(&self, connect: F) -> Result<Outcome>
    where
        F: FnOnce() -> Result<Box<dyn LlmClient>>,
    {
        let cli = &self.req.cli;

        if cli.analyze {
            return self.run_analyze();
        }

        if self.req.explicit_message {
            if cli.dry_run {
                println!("A commit message was supplied with -m/-F; nothing to generate.");
                return Ok(Outcome::Previewed);
            }
            log::info!("Explicit message supplied; skipping generation");
            let code = self.git.commit(&self.req.forwarded)?;
            return Ok(Outcome::Delegated(code));
        }

        self.step("Analyzing staged changes...");
        let diff = self.git.staged_diff()?;
        if diff.trim().is_empty() && !self.allows_empty_diff() {
            println!("No staged changes found. Stage files with `git add` first.");
            return Ok(Outcome::NothingStaged);
        }

        let cache = self.cache()?;
        let profile = self.style_profile(&cache);

        let llm = connect()?;

        let guidelines = self.guidelines(&cache, &profile);

        let prompt = build_commit_prompt(
            &PromptContext {
                diff: &diff,
                profile: Some(&profile),
                guidelines: guidelines.as_deref(),
                context: cli.context.as_deref(),
            },
            self.cfg.max_diff_bytes,
        );

        match self.mode() {
            Mode::DryRun => {
                let message = self.generate(llm.as_ref(), &prompt)?;
                if cli.verbose {
                    show_message(&message);
                } else {
                    println!("{message}");
                }
                Ok(Outcome::Previewed)
            }
            Mode::Verbose => self.confirm(llm.as_ref(), &prompt),
            mode @ (Mode::Quiet | Mode::AutoCommit) => match self.generate(llm.as_ref(), &prompt) {
                Ok(message) => self.commit_message(&message, mode == Mode::Quiet),
                Err(e) => {
                    eprintln!(
                        "{} {e}; opening the editor without a generated message",
                        "warning:".yellow().bold()
                    );
                    self.commit_plain()
                }
            },
        }
    }

    fn mode(&self) -> Mode {
        let cli = &self.req.cli;
        if cli.dry_run {
            Mode::DryRun
        } else if cli.verbose {
            Mode::Verbose
        } else if cli.auto_commit {
            Mode::AutoCommit
        } else {
            Mode::Quiet
        }
    }

    /// `--analyze`: rebuild the profile from history, persist it, and stop.
    fn run_analyze(&self) -> Result<Outcome> {
        let cache = self.cache()?;
        self.step(&format!(
            "Analyzing the last {} commit(s)...",
            self.cfg.history_depth
        ));

        let analysis = self.analyze_history()?;
        let mut profile = cache.load();
        profile.apply_analysis(analysis);
        cache.save(&profile)?;

        println!(
            "Analyzed {} commit(s); style profile written to {}",
            profile.history_depth,
            cache.path().display()
        );
        if self.req.cli.verbose {
            if let Some(summary) = &profile.summary {
                println!("{summary}");
            }
        }

        if self.req.cli.guidelines.is_some() {
            self.guidelines(&cache, &profile);
        }

        Ok(Outcome::Analyzed)
    }

    fn cache(&self) -> Result<StyleCache> {
        match &self.req.cli.cache_file {
            Some(path) => Ok(StyleCache::new(path.clone())),
            None => Ok(StyleCache::in_git_dir(&self.git.git_dir()?)),
        }
    }

    fn analyze_history(&self) -> Result<StyleProfile> {
        let commits = self.git.recent_commits(self.cfg.history_depth)?;
        Ok(style::analyze(&commits, Utc::now()))
    }

    /// The profile for this run. Only `--force-analyze` writes the cache here;
    /// a missing summary is filled in memory.
    fn style_profile(&self, cache: &StyleCache) -> StyleProfile {
        let mut profile = cache.load();

        if self.req.cli.force_analyze {
            self.step("Re-analyzing commit history...");
            match self.analyze_history() {
                Ok(analysis) => {
                    profile.apply_analysis(analysis);
                    if let Err(e) = cache.save(&profile) {
                        eprintln!("{} {e}", "warning:".yellow().bold());
                    }
                }
                Err(e) => log::warn!("could not analyze history: {e:#}"),
            }
        } else if !profile.has_summary() {
            self.step("Learning from recent commit history...");
            match self.analyze_history() {
                Ok(analysis) => profile.apply_analysis(analysis),
                Err(e) => log::warn!("could not analyze history: {e:#}"),
            }
        } else {
            self.step(&format!(
                "Using cached style profile from {}",
                cache.path().display()
            ));
        }

        profile
    }

    /// Guidelines for the prompt. An explicit `--guidelines` value replaces the
    /// cached one, and is cached itself once resolved. If it cannot be resolved
    /// the run has no guidelines at all.
    fn guidelines(&self, cache: &StyleCache, profile: &StyleProfile) -> Option<String> {
        let Some(value) = self.req.cli.guidelines.as_deref() else {
            return profile.cached_guidelines().map(str::to_string);
        };

        let source = GuidelineSource::classify(value);
        self.step(&format!("Resolving guidelines from {}...", source.describe()));

        let pb = matches!(source, GuidelineSource::Url(_))
            .then(|| term::spinner("Fetching guidelines..."));
        let resolved = source.resolve(self.cfg.fetch_timeout);
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        match resolved {
            Ok(text) => {
                if let Err(e) = cache.merge_guidelines(&text) {
                    eprintln!("{} {e}", "warning:".yellow().bold());
                }
                Some(text)
            }
            Err(e) => {
                eprintln!(
                    "{} {e}; continuing without guidelines",
                    "warning:".yellow().bold()
                );
                None
            }
        }
    }

    fn generate(&self, llm: &dyn LlmClient, prompt: &str) -> Result<String, GenerationError> {
        let pb = term::spinner("Generating commit message...");
        let result = llm.generate(prompt);
        pb.finish_and_clear();
        result
    }

    /// `--verbose`: show the message and let the user decide.
    fn confirm(&self, llm: &dyn LlmClient, prompt: &str) -> Result<Outcome> {
        loop {
            match self.generate(llm, prompt) {
                Ok(message) => {
                    show_message(&message);
                    let choice = self.ask(
                        "Commit with this message? [a]ccept / [e]dit / a[b]ort: ",
                        &[Choice::Accept, Choice::Edit, Choice::Abort],
                    )?;
                    return match choice {
                        Choice::Accept => self.commit_message(&message, false),
                        Choice::Edit => self.commit_message(&message, true),
                        _ => Ok(abort()),
                    };
                }
                Err(e) => {
                    eprintln!("{} {e}", "error:".red().bold());
                    let choice = self.ask(
                        "[r]etry / [e]dit manually / a[b]ort: ",
                        &[Choice::Retry, Choice::Edit, Choice::Abort],
                    )?;
                    match choice {
                        Choice::Retry => continue,
                        Choice::Edit => return self.commit_plain(),
                        _ => return Ok(abort()),
                    }
                }
            }
        }
    }

    fn ask(&self, prompt: &str, allowed: &[Choice]) -> Result<Choice> {
        loop {
            let input = self.console.prompt_input(prompt)?;
            match Choice::parse(&input) {
                Some(choice) if allowed.contains(&choice) => return Ok(choice),
                _ => println!("Please choose one of the options shown."),
            }
        }
    }

    /// Commit with the generated message, optionally through the editor.
    fn commit_message(&self, message: &str, edit: bool) -> Result<Outcome> {
        let git_dir = self.git.git_dir()?;
        let path = git::write_message_file(&git_dir, message)?;

        let mut args = vec!["--file".to_string(), path.to_string_lossy().into_owned()];
        if edit {
            args.push("--edit".to_string());
        }
        args.extend(self.req.forwarded.iter().cloned());

        self.step("Committing...");
        let code = self.git.commit(&args)?;
        Ok(Outcome::Committed(code))
    }

    /// Plain `git commit` with only the forwarded flags: the standard editor flow.
    fn commit_plain(&self) -> Result<Outcome> {
        let code = self.git.commit(&self.req.forwarded)?;
        Ok(Outcome::Committed(code))
    }

    fn allows_empty_diff(&self) -> bool {
        self.req
            .forwarded
            .iter()
            .take_while(|a| a.as_str() != "--")
            .any(|a| a == "--amend" || a == "--allow-empty")
    }

    fn step(&self, message: &str) {
        if self.req.cli.verbose {
            println!("{} {message}", "==>".cyan().bold());
        } else {
            log::info!("{message}");
        }
    }
}

fn show_message(message: &str) {
    println!();
    println!("{}", "----- Commit Message Preview -----".bold());
    println!("{message}");
    println!("{}", "----------------------------------".bold());
}

fn abort() -> Outcome {
    println!("Commit aborted. Your changes are still staged.");
    Outcome::Aborted
}
