use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use quiz_core::model::QuizSettings;
use services::{Clock, QuizService, Randomness};
use storage::bank::load_question_bank;
use storage::repository::Storage;

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSeconds { raw: String },
    InvalidSeed { raw: String },
    InvalidDbUrl { raw: String },
    InvalidBankPath { raw: String },
    InvalidEnv { var: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSeconds { raw } => write!(f, "invalid --seconds value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBankPath { raw } => write!(f, "invalid --bank value: {raw:?}"),
            ArgsError::InvalidEnv { var, raw } => write!(f, "invalid {var} value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play       [--bank <path>] [--db <sqlite_url>] [--seconds <n>] [--no-timer] [--seed <n>]");
    eprintln!("  cargo run -p app -- check      [--bank <path>]");
    eprintln!("  cargo run -p app -- reset-best [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bank data/questions.json");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!("  --seconds 30");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BANK_PATH, QUIZ_DB_URL, QUIZ_SECONDS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Check,
    ResetBest,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "check" => Some(Self::Check),
            "reset-best" => Some(Self::ResetBest),
            _ => None,
        }
    }
}

struct Args {
    bank_path: PathBuf,
    db_url: String,
    seconds: Option<u32>,
    timer_enabled: bool,
    seed: Option<u64>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        Self::parse_with_env(args, |var| std::env::var(var).ok())
    }

    fn parse_with_env(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut bank_path = env("QUIZ_BANK_PATH")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from("data/questions.json"), PathBuf::from);
        let mut db_url = env("QUIZ_DB_URL")
            .map_or_else(|| normalize_sqlite_url("quiz.sqlite3".into()), normalize_sqlite_url);
        let mut seconds = env("QUIZ_SECONDS")
            .map(|value| {
                value.trim().parse::<u32>().map_err(|_| ArgsError::InvalidEnv {
                    var: "QUIZ_SECONDS",
                    raw: value.clone(),
                })
            })
            .transpose()?;
        let mut timer_enabled = true;
        let mut seed = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => {
                    let value = require_value(args, "--bank")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidBankPath { raw: value });
                    }
                    bank_path = PathBuf::from(value);
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--seconds" => {
                    let value = require_value(args, "--seconds")?;
                    let parsed: u32 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeconds { raw: value.clone() })?;
                    seconds = Some(parsed);
                }
                "--no-timer" => timer_enabled = false,
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            bank_path,
            db_url,
            seconds,
            timer_enabled,
            seed,
        })
    }

    fn settings(&self) -> Result<QuizSettings, Box<dyn std::error::Error>> {
        let defaults = QuizSettings::default();
        let settings = match self.seconds {
            Some(seconds) => defaults.with_seconds_per_question(seconds)?,
            None => defaults,
        };
        Ok(settings.with_timer_enabled(self.timer_enabled))
    }

    fn randomness(&self) -> Randomness {
        self.seed.map_or(Randomness::Entropy, Randomness::Seeded)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

async fn open_storage(db_url: &str) -> Result<Storage, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    Ok(Storage::sqlite(db_url).await?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means play.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    match cmd {
        Command::Play => {
            let settings = parsed.settings()?;
            let bank = load_question_bank(&parsed.bank_path)?;
            let storage = open_storage(&parsed.db_url).await?;
            let service = QuizService::new(
                Clock::default_clock(),
                Arc::new(bank),
                Arc::clone(&storage.best_scores),
                settings,
            )
            .with_randomness(parsed.randomness());
            play::run(&service).await
        }
        Command::Check => {
            let bank = load_question_bank(&parsed.bank_path)?;
            let topics: Vec<String> = bank.topics().iter().map(ToString::to_string).collect();
            println!(
                "{}: {} questions, {} topics ({})",
                parsed.bank_path.display(),
                bank.len(),
                topics.len(),
                topics.join(", ")
            );
            Ok(())
        }
        Command::ResetBest => {
            let storage = open_storage(&parsed.db_url).await?;
            storage.best_scores.clear_best().await?;
            info!("best score cleared in {}", parsed.db_url);
            println!("Best score cleared.");
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        parse_env(args, &[])
    }

    fn parse_env(args: &[&str], vars: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(ToString::to_string);
        Args::parse_with_env(&mut iter, |var| {
            vars.iter()
                .find(|(key, _)| *key == var)
                .map(|(_, value)| (*value).to_string())
        })
    }

    #[test]
    fn parses_flags() {
        let args = parse(&[
            "--bank", "bank.json", "--db", "sqlite::memory:", "--seconds", "45", "--no-timer",
            "--seed", "7",
        ])
        .unwrap();
        assert_eq!(args.bank_path, PathBuf::from("bank.json"));
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.seconds, Some(45));
        assert!(!args.timer_enabled);
        assert_eq!(args.randomness(), Randomness::Seeded(7));

        let settings = args.settings().unwrap();
        assert_eq!(settings.seconds_per_question(), 45);
        assert!(!settings.timer_enabled());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(parse(&["--seconds", "soon"]), Err(ArgsError::InvalidSeconds { .. })));
        assert!(matches!(parse(&["--seed"]), Err(ArgsError::MissingValue { flag: "--seed" })));
        assert!(matches!(parse(&["--bank", " "]), Err(ArgsError::InvalidBankPath { .. })));
        assert!(matches!(parse(&["--wat"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn out_of_range_seconds_fail_at_settings() {
        let args = parse(&["--seconds", "1"]).unwrap();
        assert!(args.settings().is_err());
    }

    #[test]
    fn shortest_time_limit_is_accepted() {
        let args = parse(&["--seconds", "5"]).unwrap();
        assert_eq!(args.settings().unwrap().seconds_per_question(), 5);
    }

    #[test]
    fn env_seconds_are_validated_like_the_flag() {
        let args = parse_env(&[], &[("QUIZ_SECONDS", "20")]).unwrap();
        assert_eq!(args.seconds, Some(20));

        assert!(matches!(
            parse_env(&[], &[("QUIZ_SECONDS", "soon")]),
            Err(ArgsError::InvalidEnv { var: "QUIZ_SECONDS", .. })
        ));

        let args = parse_env(&["--seconds", "40"], &[("QUIZ_SECONDS", "20")]).unwrap();
        assert_eq!(args.seconds, Some(40));
    }

    #[test]
    fn normalizes_sqlite_urls() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("sqlite:///tmp/q.db".into()), "sqlite:///tmp/q.db");
        assert_eq!(normalize_sqlite_url("sqlite:/tmp/q.db".into()), "sqlite:///tmp/q.db");
        assert!(normalize_sqlite_url("q.db".into()).starts_with("sqlite:///"));
    }
}
