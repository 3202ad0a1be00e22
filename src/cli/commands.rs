//! CLI command definitions for study-streamliner.
//!
//! One invocation runs one study session: plan, lesson, interactive quiz
//! and grade report for a topic at a difficulty level.

use anyhow::Context;
use clap::Parser;

use super::report::ConsoleReporter;
use crate::agents::{Difficulty, InvalidDifficulty};
use crate::pipeline::{Mode, PipelineConfig, PipelineError, PipelineOrchestrator};
use crate::quiz::TerminalQuiz;

/// Turn a topic into a study plan, a lesson and a graded quiz.
#[derive(Parser, Debug)]
#[command(name = "study-streamliner")]
#[command(about = "Generate a study plan, lesson and quiz for a topic, then grade your answers")]
#[command(version)]
#[command(
    long_about = "study-streamliner plans a lesson on a topic, teaches it, quizzes you and grades the answers.\n\nSet GEMINI_API_KEY to use the remote model; without it, offline content is used.\n\nExample usage:\n  study-streamliner \"Merkle Trees\" beginner"
)]
pub struct Cli {
    /// Topic to study.
    #[arg(value_parser = parse_topic)]
    pub topic: String,

    /// Difficulty level: Beginner, Intermediate or Advanced (case-insensitive).
    #[arg(value_parser = parse_difficulty)]
    pub difficulty: Difficulty,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "warn", env = "STREAMLINER_LOG")]
    pub log_level: String,

    /// Model to use instead of STREAMLINER_MODEL or the default.
    #[arg(short, long)]
    pub model: Option<String>,
}

fn parse_topic(s: &str) -> Result<String, String> {
    let topic = s.trim();
    if topic.is_empty() {
        return Err("topic cannot be empty".to_string());
    }
    Ok(topic.to_string())
}

fn parse_difficulty(s: &str) -> Result<Difficulty, InvalidDifficulty> {
    s.parse()
}

/// Parse CLI arguments from the process environment.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse CLI arguments and run the session.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run one study session with the parsed arguments.
///
/// A stage failure is reported on the console and returned as an error so
/// the process exits non-zero.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let mut config = PipelineConfig::from_env().context("invalid configuration")?;
    if let Some(model) = cli.model {
        config = config.with_model(model);
    }
    let orchestrator =
        PipelineOrchestrator::from_config(&config).context("failed to set up the pipeline")?;

    let mut reporter = ConsoleReporter::stdout();
    reporter.banner(&cli.topic, cli.difficulty);
    if orchestrator.mode() == Mode::Offline {
        reporter.offline_notice();
    }

    let mut terminal = TerminalQuiz::stdio();
    match orchestrator
        .run(&cli.topic, cli.difficulty, &mut reporter, &mut terminal)
        .await
    {
        Ok(report) => {
            reporter.grade_report(&report);
            Ok(())
        }
        Err(PipelineError::Stage(err)) => {
            reporter.abort(&err);
            Err(anyhow::Error::new(err).context("study session aborted"))
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_arguments() {
        let cli = Cli::try_parse_from(["study-streamliner", "Merkle Trees", "beginner"])
            .expect("should parse");
        assert_eq!(cli.topic, "Merkle Trees");
        assert_eq!(cli.difficulty, Difficulty::Beginner);
        assert!(cli.model.is_none());
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "study-streamliner",
            "Rust",
            "ADVANCED",
            "--log-level",
            "debug",
            "-m",
            "gemini-2.5-pro",
        ])
        .expect("should parse");
        assert_eq!(cli.difficulty, Difficulty::Advanced);
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.model.as_deref(), Some("gemini-2.5-pro"));
    }

    #[test]
    fn test_invalid_difficulty_is_a_usage_error() {
        let err = Cli::try_parse_from(["study-streamliner", "Rust", "expert"])
            .expect_err("invalid difficulty");
        let message = err.to_string();
        assert!(message.contains("Beginner, Intermediate, Advanced"));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_missing_arguments_and_empty_topic() {
        assert!(Cli::try_parse_from(["study-streamliner", "Rust"]).is_err());
        assert!(Cli::try_parse_from(["study-streamliner"]).is_err());
        assert!(Cli::try_parse_from(["study-streamliner", "  ", "beginner"]).is_err());
        assert!(Cli::try_parse_from(["study-streamliner", "a", "beginner", "extra"]).is_err());
    }
}
