mod cli_args;
mod config;
mod error;
mod flow;
mod git;
mod guidelines;
mod llm;
mod logging;
mod setup;
mod style;
mod term;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use colored::Colorize;
use std::env;
use std::process::ExitCode;

use crate::cli_args::{Cli, CommitRequest};
use crate::config::Config;
use crate::flow::CommitFlow;
use crate::git::SystemGit;
use crate::term::StdConsole;

fn run() -> Result<i32> {
    let req = match CommitRequest::parse_from(env::args().skip(1)) {
        Ok(req) => req,
        Err(e) => e.exit(),
    };

    logging::init_logger(req.cli.verbose);
    log::debug!("Forwarding to git commit: {:?}", req.forwarded);

    let cfg = Config::from_sources(&req.cli);
    let console = StdConsole;
    let git = SystemGit;

    let outcome = CommitFlow::new(&req, &cfg, &git, &console)
        .run(|| setup::build_llm_client(&cfg, &console))?;

    log::debug!("Finished with {:?}", outcome);
    Ok(outcome.exit_code())
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
