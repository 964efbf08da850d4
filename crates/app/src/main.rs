use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use services::{
    AppServices, Clock, Effect, EngineHandle, Intent, LessonApiConfig, LessonOrigin, Mode,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;

const ANIMATION_PAUSE: Duration = Duration::from_millis(600);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct Args {
    db: DbTarget,
    origin: LessonOrigin,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--api <base_url> | --lessons-file <path>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://lessons.sqlite3");
    eprintln!("  --api {}", services::lesson_source::DEFAULT_API_URL);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSON_DB_URL, LESSON_API_URL, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db = match std::env::var("LESSON_DB_URL") {
            Ok(raw) => DbTarget::parse(&raw)?,
            Err(_) => DbTarget::parse("lessons.sqlite3")?,
        };
        let mut origin = LessonOrigin::Api(LessonApiConfig::from_env());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    db = DbTarget::parse(&require_value(args, "--db")?)?;
                }
                "--api" => {
                    let value = require_value(args, "--api")?;
                    if !value.starts_with("http://") && !value.starts_with("https://") {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    origin = LessonOrigin::Api(LessonApiConfig { base_url: value });
                }
                "--lessons-file" => {
                    let value = require_value(args, "--lessons-file")?;
                    origin = LessonOrigin::File(PathBuf::from(value));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db, origin })
    }
}

/// Where the completion database lives.
#[derive(Debug, PartialEq, Eq)]
enum DbTarget {
    Memory,
    File(PathBuf),
}

impl DbTarget {
    /// Accepts `sqlite::memory:`, `sqlite://path`, `sqlite:path` or a bare path.
    /// Relative paths resolve against the working directory.
    fn parse(raw: &str) -> Result<Self, ArgsError> {
        let trimmed = raw.trim();
        if trimmed == "sqlite::memory:" {
            return Ok(Self::Memory);
        }

        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);
        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() {
            return Err(ArgsError::InvalidDbUrl {
                raw: raw.to_string(),
            });
        }

        let path = PathBuf::from(path);
        if path.is_absolute() {
            return Ok(Self::File(path));
        }
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Ok(Self::File(cwd.join(path)))
    }

    fn url(&self) -> String {
        match self {
            DbTarget::Memory => "sqlite::memory:".to_string(),
            DbTarget::File(path) => format!("sqlite://{}", path.display()),
        }
    }

    /// sqlx does not create missing database files on its own.
    fn ensure_exists(&self) -> std::io::Result<()> {
        let DbTarget::File(path) = self else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(())
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Drive the engine from stdin until the lessons are done or input ends.
async fn run_lessons(engine: EngineHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut effects = engine.subscribe_effects();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    engine.dispatch(Intent::LoadItems);
    engine.flush().await;

    loop {
        while let Ok(effect) = effects.try_recv() {
            match effect {
                Effect::ShowMessage(message) => println!("! {message}"),
                Effect::NavigateToDone => println!("All lessons done. Well played!"),
            }
        }

        let state = engine.state();
        match state.mode() {
            Mode::Loading => {
                engine.flush().await;
                continue;
            }
            Mode::Finished => break,
            Mode::Error => {
                println!(
                    "Could not load lessons: {}",
                    state.error.as_deref().unwrap_or_default()
                );
                println!("Press enter to retry, or type :q to quit.");
                match lines.next_line().await? {
                    Some(line) if line.trim() == ":q" => break,
                    None => break,
                    Some(_) => engine.dispatch(Intent::Retry),
                }
            }
            Mode::AnimatingCorrect => {
                println!("Correct!");
                tokio::time::sleep(ANIMATION_PAUSE).await;
                engine.dispatch(Intent::CorrectAnimationFinished);
            }
            Mode::AnimatingWrong => {
                println!("Not quite, try again.");
                tokio::time::sleep(ANIMATION_PAUSE).await;
                engine.dispatch(Intent::WrongAnimationFinished);
            }
            Mode::Active => {
                let Some(item) = state.current_item() else {
                    break;
                };
                println!();
                println!("{}", render::progress_header(&state));
                println!("  {}", render::lesson_line(item));
                if item.requires_input() {
                    println!("Type the missing part (:next to move on, :q to quit):");
                } else {
                    println!("Press enter to continue (:q to quit):");
                }

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                match line.as_str() {
                    ":q" => break,
                    ":next" => engine.dispatch(Intent::NextLessonClicked),
                    answer => {
                        if item.requires_input() {
                            engine.dispatch(Intent::InputChanged(answer.to_string()));
                        }
                        engine.dispatch(Intent::CheckAnswer);
                    }
                }
            }
        }

        engine.flush().await;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    parsed.db.ensure_exists()?;
    let db_url = parsed.db.url();
    let app = AppServices::new_sqlite(&db_url, Clock::system(), parsed.origin).await?;
    info!(db = %db_url, "completion tracking ready");

    run_lessons(app.engine()).await?;

    let completed = app.progress().completed_lesson_ids().await?;
    info!(completed = completed.len(), "session finished");
    Ok(())
}


#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
