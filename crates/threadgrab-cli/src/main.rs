use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use threadgrab_acquire::thread::{DEFAULT_AUTH_STATE, DEFAULT_BASE_URL, DEFAULT_OUTPUT_DIR};
use threadgrab_acquire::{BrowserSource, FetchConfig, HttpSource};

#[derive(Parser)]
#[command(name = "threadgrab")]
#[command(about = "Fetch a forum thread through a saved login session and save it as clean JSON")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one thread, strip HTML from its posts, and save it as JSON
    Fetch {
        /// Numeric thread ID
        #[arg(short, long, default_value_t = 155939)]
        thread: u64,

        /// Forum origin
        #[arg(short, long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Saved browser session state (cookies) from an earlier login
        #[arg(short, long, default_value = DEFAULT_AUTH_STATE)]
        auth_state: PathBuf,

        /// Directory the thread JSON is written to
        #[arg(short = 'O', long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// How to load the page
        #[arg(long, value_enum, default_value = "browser")]
        transport: Transport,

        /// Chrome/Chromium executable (browser transport only; auto-detected if omitted)
        #[arg(long)]
        chrome: Option<PathBuf>,
    },

    /// Strip HTML from a file and print the text, as done for post bodies
    Clean {
        /// HTML file to clean
        file: PathBuf,
    },
}

#[derive(Clone, clap::ValueEnum)]
enum Transport {
    /// Headless Chromium carrying the saved session
    Browser,
    /// Plain HTTP with the saved session's cookies
    Http,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing and CDP crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn,chromiumoxide=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn,chromiumoxide=info",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    match cli.command {
        Commands::Fetch {
            thread,
            base_url,
            auth_state,
            output_dir,
            transport,
            chrome,
        } => {
            let config = FetchConfig {
                base_url,
                auth_state,
                output_dir,
            };
            tracing::info!(thread, base_url = %config.base_url, "Scraping thread");

            let outcome = match transport {
                Transport::Browser => {
                    threadgrab_acquire::run(&config, thread, |state| {
                        Ok(BrowserSource::new(state).with_chrome(chrome))
                    })
                    .await
                }
                Transport::Http => threadgrab_acquire::run(&config, thread, HttpSource::new).await,
            };

            // Failures are reported, not raised: the process still exits cleanly.
            outcome.report();
        }
        Commands::Clean { file } => {
            tracing::debug!(file = %file.display(), "Cleaning HTML");
            let html = std::fs::read_to_string(&file)?;
            println!("{}", threadgrab_acquire::clean::html_to_text(&html));
        }
    }

    Ok(())
}
