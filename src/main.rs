use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use quiz_portal::leaderboard::{dashboard_stats, leaderboard, summarize};
use quiz_portal::session::SystemClock;
use quiz_portal::store::{LocalStore, PersistenceHandle, QuizSource};
use quiz_portal::{
    format_time, load_attempts_from_json, load_quizzes_from_json, App, Config, Portal, QuizFilter,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "quiz-portal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a quiz in the terminal (default)
    Take {
        /// Import quizzes from this JSON file before starting
        #[arg(short, long)]
        quizzes: Option<PathBuf>,
        /// Only show quizzes for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Only show quizzes for this subject
        #[arg(long)]
        subject: Option<String>,
        /// Your display name (saved for next time)
        #[arg(long)]
        name: Option<String>,
        /// Your email (saved for next time)
        #[arg(long)]
        email: Option<String>,
    },
    /// List available quizzes
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Import quizzes (or attempts) from a JSON file
    Import {
        path: PathBuf,
        /// The file holds attempt records instead of quizzes
        #[arg(long)]
        attempts: bool,
    },
    /// Show the leaderboard
    Leaderboard {
        /// Restrict to one quiz id
        #[arg(long)]
        quiz: Option<String>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Show portal-wide stats
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Take {
        quizzes: None,
        date: None,
        subject: None,
        name: None,
        email: None,
    });

    let mut config = Config::load()?;
    let interactive = matches!(command, Commands::Take { .. });
    let _log_guard = init_logging(&config, !interactive)?;

    let store = LocalStore::new(config.data_dir()?);
    tracing::debug!("data dir: {}", store.root().display());

    match command {
        Commands::Take {
            quizzes,
            date,
            subject,
            name,
            email,
        } => {
            if let Some(path) = quizzes {
                let loaded = load_quizzes_from_json(&path)?;
                store.import_quizzes(loaded).await?;
            }

            let Some(identity) = config.resolve_identity(name, email)? else {
                bail!("No user profile yet. Run again with --name <NAME> --email <EMAIL>");
            };
            config.save()?;

            let filter = QuizFilter { date, subject };
            let available = store.fetch_available_quizzes(&filter).await?;
            let attempts = store.attempts().await?;
            tracing::info!("{} quizzes available to {}", available.len(), identity.email);

            let app = App::new(available, attempts, identity, Arc::new(SystemClock))
                .with_persistence(PersistenceHandle::spawn(Arc::new(store)))
                .with_leaderboard_size(config.leaderboard_size);
            Portal::new(app).run().await?;
        }
        Commands::List { date, subject } => {
            let filter = QuizFilter { date, subject };
            let quizzes = store.fetch_available_quizzes(&filter).await?;
            let attempts = store.attempts().await?;
            let email = config.user.as_ref().map(|u| u.email.clone()).unwrap_or_default();

            if quizzes.is_empty() {
                println!("No quizzes. Add some with: quiz-portal import <file>");
                return Ok(());
            }
            for quiz in &quizzes {
                let summary = summarize(&attempts, &email, &quiz.id);
                let badge = match summary.best {
                    Some(best) => format!(
                        "attempted x{}, best {}/{}",
                        summary.attempts, best.score, best.total
                    ),
                    None => "new".to_string(),
                };
                println!(
                    "{}  {:<20} {:<16} {:>3} questions  {:>3} min  {}",
                    quiz.date,
                    quiz.id,
                    quiz.subject,
                    quiz.total_questions(),
                    quiz.time_limit_minutes(),
                    badge
                );
            }
        }
        Commands::Import { path, attempts } => {
            if attempts {
                let loaded = load_attempts_from_json(&path)?;
                let total = store.import_attempts(loaded).await?;
                println!("Imported attempts from {} ({} stored)", path.display(), total);
            } else {
                let loaded = load_quizzes_from_json(&path)?;
                let total = store.import_quizzes(loaded).await?;
                println!("Imported quizzes from {} ({} stored)", path.display(), total);
            }
        }
        Commands::Leaderboard { quiz, limit } => {
            let attempts = store.attempts().await?;
            let email = config.user.as_ref().map(|u| u.email.as_str());
            let entries = leaderboard(
                &attempts,
                quiz.as_deref(),
                limit.unwrap_or(config.leaderboard_size),
                email,
            );

            if entries.is_empty() {
                println!("No attempts yet.");
            }
            for entry in entries {
                println!(
                    "#{:<3} {:<20} {:<16} {}/{} ({}%)  {}{}",
                    entry.rank,
                    entry.user_name,
                    entry.quiz_id,
                    entry.score,
                    entry.total,
                    entry.percentage,
                    format_time(entry.time_taken_seconds),
                    if entry.is_you { "  <- you" } else { "" }
                );
            }
        }
        Commands::Stats => {
            let quizzes = store.quizzes().await?;
            let attempts = store.attempts().await?;
            let stats = dashboard_stats(&quizzes, &attempts, &Local::now());

            println!("Quizzes:         {}", stats.total_quizzes);
            println!("Questions:       {}", stats.total_questions);
            println!("Attempts:        {}", stats.total_attempts);
            println!("Users:           {}", stats.distinct_users);
            println!("Attempts today:  {}", stats.attempts_on_day);
        }
    }

    Ok(())
}

/// File logging always; stderr too when the terminal is not taken over by the UI.
fn init_logging(config: &Config, to_stderr: bool) -> Result<WorkerGuard> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "quiz-portal.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
    let stderr_layer =
        to_stderr.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(guard)
}
