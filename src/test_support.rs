//! Helpers shared by unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

use crate::error::GenerationError;
use crate::git::{CommitRecord, Git};
use crate::llm::LlmClient;
use crate::style::StyleCache;
use crate::term::Console;

/// A wiremock server for synchronous tests.
///
/// The blocking reqwest client must not run inside a tokio runtime, so only
/// mounting and inspection go through `block_on`.
pub struct MockHttp {
    server: MockServer,
    rt: Runtime,
}

impl MockHttp {
    pub fn start() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        MockHttp { server, rt }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn received(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}

/// In-memory `Git` that records every `git commit` invocation.
pub struct FakeGit {
    pub dir: TempDir,
    pub diff: String,
    pub history: Vec<CommitRecord>,
    pub exit_code: i32,
    pub commits: RefCell<Vec<Vec<String>>>,
    /// Contents of the `--file` message at the time of each commit.
    pub messages: RefCell<Vec<Option<String>>>,
}

impl FakeGit {
    pub fn with_diff(diff: &str) -> Self {
        FakeGit {
            dir: tempfile::tempdir().unwrap(),
            diff: diff.to_string(),
            history: vec![],
            exit_code: 0,
            commits: RefCell::new(vec![]),
            messages: RefCell::new(vec![]),
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        StyleCache::in_git_dir(self.dir.path()).path().to_path_buf()
    }
}

impl Git for FakeGit {
    fn git_dir(&self) -> anyhow::Result<PathBuf> {
        Ok(self.dir.path().to_path_buf())
    }

    fn staged_diff(&self) -> anyhow::Result<String> {
        Ok(self.diff.clone())
    }

    fn recent_commits(&self, depth: u32) -> anyhow::Result<Vec<CommitRecord>> {
        Ok(self.history.iter().take(depth as usize).cloned().collect())
    }

    fn commit(&self, args: &[String]) -> anyhow::Result<i32> {
        let message = args
            .iter()
            .position(|a| a == "--file")
            .and_then(|i| args.get(i + 1))
            .and_then(|p| fs::read_to_string(p).ok());
        self.messages.borrow_mut().push(message);
        self.commits.borrow_mut().push(args.to_vec());
        Ok(self.exit_code)
    }
}

/// Scripted `LlmClient` that records the prompts it receives.
#[derive(Default)]
pub struct FakeLlm {
    pub prompts: RefCell<Vec<String>>,
    pub replies: RefCell<VecDeque<Result<String, GenerationError>>>,
}

impl FakeLlm {
    pub fn replying(replies: Vec<Result<String, GenerationError>>) -> Rc<Self> {
        Rc::new(FakeLlm {
            prompts: RefCell::new(vec![]),
            replies: RefCell::new(replies.into()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.borrow().last().cloned().unwrap_or_default()
    }
}

impl LlmClient for Rc<FakeLlm> {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(GenerationError::EmptyResponse))
    }
}

/// `Console` answering from a fixed script.
#[derive(Default)]
pub struct ScriptedConsole {
    pub answers: RefCell<VecDeque<String>>,
    pub secret: Option<String>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedConsole {
    pub fn answering(answers: &[&str]) -> Self {
        ScriptedConsole {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Default::default()
        }
    }
}

impl Console for ScriptedConsole {
    fn prompt_input(&self, prompt: &str) -> anyhow::Result<String> {
        self.asked.borrow_mut().push(prompt.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("console script exhausted at {prompt:?}"))
    }

    fn prompt_secret(&self, prompt: &str) -> anyhow::Result<Option<String>> {
        self.asked.borrow_mut().push(prompt.to_string());
        Ok(self.secret.clone())
    }
}
