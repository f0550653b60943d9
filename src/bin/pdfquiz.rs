//! CLI binary for pdf-quiz.
//!
//! A thin shell over the library: file arguments fill the upload batch,
//! flags map to `QuizConfig`, a spinner shows generation progress and a
//! line prompt drives the quiz. All decisions live in `QuizApp`.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_quiz::{
    format_file_size, resolve_upload, CancelToken, Difficulty, GenerationProgressCallback,
    PdfiumExtractor, ProgressCallback, ProviderConversationFactory, QuizApp, QuizConfig,
    QuizSession,
};
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner whose message mirrors the
/// generate button label ("Processing file i / N", then "Generating quiz").
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening conversation…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_file_start(&self, file_num: usize, total_files: usize) {
        self.bar.set_prefix("Uploading");
        self.bar
            .set_message(format!("Processing file {file_num} / {total_files}"));
    }

    fn on_file_sent(&self, file_num: usize, total_files: usize, payload_len: usize) {
        self.bar.println(format!(
            "  {} File {:>2}/{:<2}  {}",
            green("✓"),
            file_num,
            total_files,
            dim(&format!("{payload_len:>7} chars")),
        ));
    }

    fn on_request_start(&self, attempt: u32, max_attempts: u32) {
        self.bar.set_prefix("Generating");
        if attempt == 1 {
            self.bar.set_message("Generating quiz");
        } else {
            self.bar
                .set_message(format!("Generating quiz (attempt {attempt}/{max_attempts})"));
        }
    }

    fn on_attempt_failed(&self, attempt: u32, max_attempts: u32, error: &str) {
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Attempt {}/{}  {}",
            red("✗"),
            attempt,
            max_attempts,
            red(&msg)
        ));
    }

    fn on_generation_complete(&self, question_count: usize) {
        self.bar.println(format!(
            "{} {} questions generated",
            green("✔"),
            bold(&question_count.to_string())
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Five easy questions from one PDF
  pdfquiz lecture.pdf

  # Ten hard questions from several PDFs (at most 5 files, 10 MB each)
  pdfquiz --difficulty hard --questions 10 ch1.pdf ch2.pdf ch3.pdf

  # Use a specific provider and model
  pdfquiz --provider openai --model gpt-4.1-mini notes.pdf

  # Print the generated questions as JSON instead of playing
  pdfquiz --json notes.pdf > quiz.json

QUIZ CONTROLS:
  1-4   choose an answer      n   next question
  p     previous question     q   quit
  r     restart (results)     c   create a new quiz (results)

BATCH PROMPT (after a failed generation or on a new quiz):
  path.pdf ...   add files     -name.pdf   remove a file
  empty line     retry         q           quit
  Ctrl-C cancels a running generation; pressed again, it exits.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  PDFQUIZ_LLM_PROVIDER    Override provider (gemini, openai, anthropic, ollama)
  PDFQUIZ_MODEL           Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium; otherwise the system library is used
"#;

/// Generate a multiple-choice quiz from PDF files and play it in the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "pdfquiz",
    version,
    about = "Generate a multiple-choice quiz from PDF files using an LLM",
    long_about = "Send the text of up to five PDF documents to a generative language model \
in one conversation, ask it for a multiple-choice quiz, then play and score the quiz \
in the terminal.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file paths or HTTP/HTTPS URLs (at most 5).
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Quiz difficulty.
    #[arg(short, long, env = "PDFQUIZ_DIFFICULTY", value_enum, default_value = "easy")]
    difficulty: DifficultyArg,

    /// Number of questions (1–15).
    #[arg(short = 'n', long, env = "PDFQUIZ_QUESTIONS", default_value_t = 5,
          value_parser = clap::value_parser!(u8).range(1..=15))]
    questions: u8,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-mini).
    #[arg(long, env = "PDFQUIZ_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama.
    #[arg(long, env = "PDFQUIZ_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDFQUIZ_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max LLM output tokens per turn.
    #[arg(long, env = "PDFQUIZ_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Total quiz requests before giving up on malformed replies.
    #[arg(long, env = "PDFQUIZ_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFQUIZ_PASSWORD")]
    password: Option<String>,

    /// Print the generated questions as JSON and exit.
    #[arg(long, env = "PDFQUIZ_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDFQUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFQUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the quiz itself.
    #[arg(short, long, env = "PDFQUIZ_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFQUIZ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-file text extraction timeout in seconds.
    #[arg(long, env = "PDFQUIZ_EXTRACT_TIMEOUT", default_value_t = 120)]
    extract_timeout: u64,

    /// Per-turn LLM call timeout in seconds.
    #[arg(long, env = "PDFQUIZ_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(v: DifficultyArg) -> Self {
        match v {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

/// What the player asked for on the results screen.
enum AfterQuiz {
    Quit,
    NewQuiz,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO
    // logs out of its way unless asked.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let base_config = build_config(&cli, None)?;
    let mut app = QuizApp::new(&base_config);
    let in_flight = spawn_interrupt_handler();

    let mut edits = BatchEdits {
        add: cli.inputs.clone(),
        remove: Vec::new(),
    };

    loop {
        if let Some(session) = app.session_mut() {
            match play(session)? {
                AfterQuiz::Quit => return Ok(()),
                AfterQuiz::NewQuiz => {
                    app.new_quiz();
                    edits = match prompt_for_edits()? {
                        Some(edits) => edits,
                        None => return Ok(()),
                    };
                }
            }
            continue;
        }

        apply_edits(&mut app, &edits, &cli).await;
        let outcome = if !app.can_generate() {
            Err(anyhow::anyhow!("No PDF files were accepted; nothing to generate from"))
        } else {
            print_batch(&app, cli.quiet);
            let cancel = CancelToken::new();
            set_in_flight(&in_flight, Some(cancel.clone()));
            let result = run_generation(&mut app, &cli, show_progress, &cancel).await;
            set_in_flight(&in_flight, None);
            result
        };

        match settle(&app, outcome, cli.json)? {
            Next::PrintJson => {
                if let Some(session) = app.session() {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(session.questions())
                            .context("Failed to serialise questions")?
                    );
                }
                return Ok(());
            }
            Next::Play => {}
            Next::EditBatch(e) => {
                eprintln!("{} {:#}", red("✘ Something went wrong:"), e);
                edits = match prompt_for_edits()? {
                    Some(edits) => edits,
                    None => return Ok(()),
                };
            }
        }
    }
}

/// What the shell does once a generate request has finished.
#[derive(Debug)]
enum Next {
    /// `--json`: print the quiz and exit.
    PrintJson,
    /// Show the quiz.
    Play,
    /// Generation failed; the batch is still held, so ask for edits.
    EditBatch(anyhow::Error),
}

/// Only `--json` runs treat a failed generation as fatal.
fn settle(app: &QuizApp, outcome: Result<()>, json: bool) -> Result<Next> {
    match (outcome, json) {
        (Ok(()), true) if app.session().is_some() => Ok(Next::PrintJson),
        (Ok(()), true) => Err(anyhow::anyhow!("Quiz generation did not produce a quiz")),
        (Err(e), true) => Err(e).context("Quiz generation failed"),
        (Ok(()), false) => Ok(Next::Play),
        (Err(e), false) => Ok(Next::EditBatch(e)),
    }
}

type InFlight = Arc<Mutex<Option<CancelToken>>>;

/// Ctrl-C cancels the generation in flight; with nothing to cancel (or on
/// a second press) it exits like the default handler would.
fn spawn_interrupt_handler() -> InFlight {
    let in_flight: InFlight = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&in_flight);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            let token = slot.lock().ok().and_then(|guard| guard.clone());
            match token {
                Some(token) if !token.is_cancelled() => {
                    eprintln!("\n{}", dim("Cancelling… press Ctrl-C again to exit."));
                    token.cancel();
                }
                _ => std::process::exit(130),
            }
        }
    });
    in_flight
}

fn set_in_flight(in_flight: &InFlight, token: Option<CancelToken>) {
    if let Ok(mut guard) = in_flight.lock() {
        *guard = token;
    }
}

/// Map CLI args to `QuizConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<QuizConfig> {
    let mut builder = QuizConfig::builder()
        .difficulty(cli.difficulty.clone().into())
        .question_count(cli.questions as usize)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_attempts(cli.max_attempts)
        .download_timeout_secs(cli.download_timeout)
        .extract_timeout_secs(cli.extract_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();

    Ok(config)
}

/// Paths to add and file names to drop, as typed at the batch prompt.
#[derive(Debug, Default, PartialEq, Eq)]
struct BatchEdits {
    add: Vec<String>,
    remove: Vec<String>,
}

impl BatchEdits {
    /// Whitespace-separated tokens; `-name.pdf` removes `name.pdf`.
    fn parse(line: &str) -> Self {
        let mut edits = Self::default();
        for token in line.split_whitespace() {
            match token.strip_prefix('-') {
                Some(name) if !name.is_empty() => edits.remove.push(name.to_string()),
                _ => edits.add.push(token.to_string()),
            }
        }
        edits
    }
}

/// Drop the named files, then resolve and offer the new ones, warning on
/// every rejection.
async fn apply_edits(app: &mut QuizApp, edits: &BatchEdits, cli: &Cli) {
    let Some(batch) = app.batch_mut() else {
        return;
    };

    for name in &edits.remove {
        if batch.remove(name).is_none() {
            eprintln!("{} '{}' is not in the batch", cyan("⚠"), name);
        }
    }

    let max_file_size = batch.max_file_size();
    let mut files = Vec::with_capacity(edits.add.len());
    for input in &edits.add {
        match resolve_upload(input, cli.download_timeout, max_file_size).await {
            Ok(file) => files.push(file),
            Err(e) => eprintln!("{} {}", cyan("⚠"), e),
        }
    }

    for rejection in batch.accept(files) {
        eprintln!("{} {}", cyan("⚠"), rejection);
    }
}

fn print_batch(app: &QuizApp, quiet: bool) {
    if quiet {
        return;
    }
    if let Some(batch) = app.batch() {
        for file in batch.files() {
            eprintln!(
                "  {} {}",
                file.name(),
                dim(&format!("- {}", format_file_size(file.size())))
            );
        }
    }
}

/// Run one generation attempt against the real provider and pdfium.
async fn run_generation(
    app: &mut QuizApp,
    cli: &Cli,
    show_progress: bool,
    cancel: &CancelToken,
) -> Result<()> {
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn GenerationProgressCallback>),
    )?;

    let factory = ProviderConversationFactory::from_config(&config)?;
    let extractor = PdfiumExtractor::new(config.password.clone());

    let result = app.generate(&config, &factory, &extractor, cancel).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }

    let stats = result?;
    if !cli.quiet && !cli.json {
        eprintln!(
            "   {} files  /  {} pages  /  {} chars sent,  {} attempt(s), {}ms total",
            stats.files_sent,
            stats.pages_extracted,
            stats.chars_sent,
            stats.attempts,
            stats.total_duration_ms,
        );
    }
    Ok(())
}

/// Ask for batch changes; `None` means the user wants to quit.
fn prompt_for_edits() -> Result<Option<BatchEdits>> {
    eprintln!(
        "{}",
        bold(
            "Enter PDF paths to add, -name.pdf to remove (empty line to retry the batch, q to quit):"
        )
    );
    let line = read_line()?;
    match line.as_deref() {
        None | Some("q") => Ok(None),
        Some(text) => Ok(Some(BatchEdits::parse(text))),
    }
}

fn read_line() -> Result<Option<String>> {
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Drive one session until the player quits or asks for a new quiz.
fn play(session: &mut QuizSession) -> Result<AfterQuiz> {
    let stdout = io::stdout();
    loop {
        {
            let mut out = stdout.lock();
            if session.is_completed() {
                render_results(&mut out, session)?;
            } else {
                render_question(&mut out, session)?;
            }
            out.flush().ok();
        }

        let Some(cmd) = read_line()? else {
            return Ok(AfterQuiz::Quit);
        };

        match cmd.as_str() {
            "q" => return Ok(AfterQuiz::Quit),
            "n" => {
                if !session.advance() {
                    eprintln!("{}", dim("Choose an answer first."));
                }
            }
            "p" => {
                session.retreat();
            }
            "r" if session.is_completed() => {
                session.redo();
            }
            "c" if session.is_completed() => return Ok(AfterQuiz::NewQuiz),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 && session.select_choice(n - 1) => {}
                _ => eprintln!("{}", dim("Unknown command.")),
            },
        }
    }
}

fn render_question(out: &mut impl Write, session: &QuizSession) -> io::Result<()> {
    let (Some(question), Some((pos, total))) = (session.current_question(), session.position())
    else {
        return Ok(());
    };

    const WIDTH: usize = 30;
    let filled = (session.progress() * WIDTH as f64).round() as usize;
    writeln!(out)?;
    writeln!(
        out,
        "{}  [{}{}]",
        bold(&format!("{pos} / {total}")),
        "█".repeat(filled),
        "░".repeat(WIDTH - filled)
    )?;
    writeln!(out, "{}", bold(&question.question))?;
    for (i, choice) in question.choices.iter().enumerate() {
        let marker = if session.selected() == Some(i) {
            cyan("●")
        } else {
            "○".to_string()
        };
        writeln!(out, "  {} {}) {}", marker, i + 1, choice)?;
    }
    let mut controls = format!("[1-{}] choose", question.choices.len());
    if session.can_advance() {
        controls.push_str("  [n]ext");
    }
    if session.can_retreat() {
        controls.push_str("  [p]rev");
    }
    controls.push_str("  [q]uit");
    write!(out, "{} > ", dim(&controls))
}

fn render_results(out: &mut impl Write, session: &QuizSession) -> io::Result<()> {
    let (Some(score), Some(results)) = (session.score(), session.results()) else {
        return Ok(());
    };

    writeln!(out)?;
    writeln!(out, "{}", bold("Quiz Results"))?;
    writeln!(out, "{}", score)?;
    writeln!(out)?;
    for r in &results {
        writeln!(out, "{}", bold(&r.question))?;
        let yours = r.your_answer.as_deref().unwrap_or("—");
        let mark = if r.correct { green("✓") } else { red("✗") };
        writeln!(out, "  {} Your answer: {}", mark, yours)?;
        writeln!(out, "    Correct answer: {}", r.correct_answer)?;
    }
    write!(
        out,
        "{} > ",
        dim("[r]estart quiz  [c]reate new quiz  [p]rev  [q]uit")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_edits_split_adds_and_removes() {
        let edits = BatchEdits::parse("  a.pdf -b.pdf https://x.org/c.pdf  -d.pdf ");
        assert_eq!(edits.add, vec!["a.pdf", "https://x.org/c.pdf"]);
        assert_eq!(edits.remove, vec!["b.pdf", "d.pdf"]);
    }

    #[test]
    fn lone_dash_is_a_path() {
        let edits = BatchEdits::parse("-");
        assert_eq!(edits.add, vec!["-"]);
        assert!(edits.remove.is_empty());
    }

    #[test]
    fn empty_line_changes_nothing() {
        assert_eq!(BatchEdits::parse("   "), BatchEdits::default());
    }

    #[tokio::test]
    async fn removing_a_file_keeps_the_rest_of_the_batch() {
        let cli = Cli::parse_from(["pdfquiz", "unused.pdf"]);
        let config = build_config(&cli, None).expect("config");
        let mut app = QuizApp::new(&config);
        let batch = app.batch_mut().expect("creating");
        batch.accept([
            pdf_quiz::UploadedFile::new("a.pdf", b"%PDF-1.7".to_vec()),
            pdf_quiz::UploadedFile::new("b.pdf", b"%PDF-1.7".to_vec()),
        ]);

        apply_edits(&mut app, &BatchEdits::parse("-a.pdf -missing.pdf"), &cli).await;

        let batch = app.batch().expect("creating");
        assert_eq!(batch.len(), 1);
        assert!(batch.contains("b.pdf"));
    }

    fn app_with_batch() -> QuizApp {
        let mut app = QuizApp::new(&QuizConfig::default());
        app.batch_mut()
            .expect("creating")
            .accept([pdf_quiz::UploadedFile::new("a.pdf", b"%PDF-1.7".to_vec())]);
        app
    }

    #[test]
    fn failed_generation_returns_to_batch_prompt() {
        let app = app_with_batch();
        let next = settle(&app, Err(anyhow::anyhow!("model said no")), false).expect("not fatal");
        assert!(matches!(next, Next::EditBatch(_)));
        assert_eq!(app.batch().map(|b| b.len()), Some(1));
    }

    #[test]
    fn failed_generation_is_fatal_with_json() {
        let app = app_with_batch();
        assert!(settle(&app, Err(anyhow::anyhow!("model said no")), true).is_err());
    }

    #[test]
    fn successful_generation_plays_or_prints() {
        let mut app = app_with_batch();
        app.start_quiz(Vec::new());
        assert!(matches!(settle(&app, Ok(()), false), Ok(Next::Play)));
        assert!(matches!(settle(&app, Ok(()), true), Ok(Next::PrintJson)));
    }

    #[test]
    fn interrupt_slot_tracks_generation() {
        let in_flight: InFlight = Arc::new(Mutex::new(None));
        let token = CancelToken::new();
        set_in_flight(&in_flight, Some(token.clone()));
        assert!(in_flight.lock().unwrap().is_some());
        set_in_flight(&in_flight, None);
        assert!(in_flight.lock().unwrap().is_none());
    }
}
