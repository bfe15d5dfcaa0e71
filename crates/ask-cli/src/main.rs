mod logging;
mod presenter;
mod terminal;

use ask_spec::{DEFAULT_MASK, QuestionSet, Session, ask, confirm, question_schema};
use clap::{Parser, Subcommand};
use presenter::{AnswerPresenter, OutputFormat};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use terminal::TerminalSource;
use tracing::debug;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Environment variable consulted for the mask glyph when `--mask` is absent.
const MASK_ENV: &str = "ASK_MASK";

/// Exit status of a run that stopped before every question was answered.
/// Distinct from the `1` that `confirm` uses for "no".
const EXIT_CANCELLED: i32 = 2;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Ask questions on the terminal",
    long_about = "Runs question sets with defaults, dependent questions and masked input, then prints the collected answers"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask every question in a question set and print the answers.
    Run {
        /// Path to the question-set JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Encoding for the collected answers.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Glyph echoed for each character of a password reply (defaults to ASK_MASK or `*`).
        #[arg(long, value_name = "GLYPH", value_parser = parse_mask)]
        mask: Option<char>,
    },
    /// Ask a single yes/no question; exits 0 for yes and 1 for no.
    Confirm {
        /// Message shown above the prompt.
        message: String,
    },
    /// Load a question set and list its questions without asking them.
    Check {
        /// Path to the question-set JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Print the JSON Schema of a question entry.
    Schema,
}

fn main() -> CliResult<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run { spec, format, mask } => run_questions(&spec, format, mask),
        Command::Confirm { message } => run_confirm(&message),
        Command::Check { spec } => run_check(&spec),
        Command::Schema => run_schema(),
    }
}

fn run_questions(spec_path: &Path, format: OutputFormat, mask: Option<char>) -> CliResult<()> {
    let questions = load_questions(spec_path)?;
    let mask = resolve_mask(mask)?;
    debug!(questions = questions.len(), %mask, "running question set");

    let presenter = AnswerPresenter::new(format);
    let mut session = terminal_session().with_mask(mask);
    let mut out = io::stdout();
    match ask(&questions, &mut session, &mut out) {
        Ok(answers) => presenter.show_answers(&answers),
        Err(err) => {
            presenter.show_failure(&err);
            drop(session);
            std::process::exit(EXIT_CANCELLED);
        }
    }
}

fn run_confirm(message: &str) -> CliResult<()> {
    let mut session = terminal_session();
    let mut out = io::stdout();
    let confirmed = match confirm(message, &mut session, &mut out) {
        Ok(confirmed) => confirmed,
        Err(err) => {
            AnswerPresenter::new(OutputFormat::Json).show_failure(&err);
            drop(session);
            std::process::exit(EXIT_CANCELLED);
        }
    };
    if confirmed {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn run_check(spec_path: &Path) -> CliResult<()> {
    let questions = load_questions(spec_path)?;
    AnswerPresenter::new(OutputFormat::Json).show_question_set(&questions);
    Ok(())
}

fn run_schema() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&question_schema())?);
    Ok(())
}

fn load_questions(path: &Path) -> CliResult<QuestionSet> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    Ok(QuestionSet::from_json_str(&raw)?)
}

fn terminal_session() -> Session<TerminalSource> {
    Session::new(|| Ok(TerminalSource::stdin()))
}

fn resolve_mask(flag: Option<char>) -> CliResult<char> {
    if let Some(mask) = flag {
        return Ok(mask);
    }
    match env::var_os(MASK_ENV) {
        Some(raw) => {
            let raw = raw
                .into_string()
                .map_err(|_| format!("{} is not valid unicode", MASK_ENV))?;
            Ok(parse_mask(&raw).map_err(|err| format!("{}: {}", MASK_ENV, err))?)
        }
        None => Ok(DEFAULT_MASK),
    }
}

fn parse_mask(raw: &str) -> Result<char, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(glyph), None) if !glyph.is_control() => Ok(glyph),
        _ => Err(format!("mask must be a single visible character, got {:?}", raw)),
    }
}
