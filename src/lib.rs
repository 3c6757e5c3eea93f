pub mod cli;
pub mod config;
pub mod context;
pub mod display;
pub mod filter;
pub mod message;
pub mod people;
pub mod streams;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

pub use cli::{ColorMode, Commands, OutputFormat, cli_parse};
pub use config::{ConfigError, NarrowConfig, load_config};
pub use context::{NarrowContext, RealmSettings};
pub use filter::{Filter, FilterError, Predicate, Term};
pub use message::{Message, MessageId, MessageKind, MessageLog, MessageStore, load_messages};
pub use people::{People, PeopleDirectory, Person, UserId};
pub use streams::{StreamDirectory, StreamId, Streams, Subscription};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A subscriber may already be installed when embedded in another binary
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn write_output_file(path: &std::path::Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_tracing(cli.verbose);
    cli.color.apply();

    let config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    let ctx = config
        .context()
        .context("Failed to build narrow context from config")?;

    if let Some(path) = &cli.config {
        tracing::info!(config = %path.display(), "loaded organization config");
    }

    let output_text = match &cli.command {
        Commands::Parse { query } => {
            let filter = Filter::parse(query, ctx);
            match cli.format {
                OutputFormat::Text => display::format_terms_text(&filter),
                OutputFormat::Json => display::format_terms_json(&filter),
            }
        }
        Commands::Describe { query } => {
            let filter = Filter::parse(query, ctx);
            match cli.format {
                OutputFormat::Text => format!("{}\n", filter.describe()),
                OutputFormat::Json => display::format_description_json(&filter),
            }
        }
        Commands::Match {
            query,
            messages,
            first,
        } => {
            let log = load_messages(messages).with_context(|| {
                format!("Failed to load messages from '{}'", messages.display())
            })?;
            let filter = Filter::parse(query, ctx);
            tracing::info!(
                query = %filter,
                messages = log.len(),
                local = filter.can_apply_locally(),
                "evaluating narrow"
            );

            if *first {
                let id = filter.first_valid_id_from(&log.ids(), &log);
                display::format_first_match(id, cli.format)
            } else {
                let matches: Vec<&Message> = log
                    .messages()
                    .iter()
                    .filter(|message| filter.matches(message))
                    .collect();
                match cli.format {
                    OutputFormat::Text => display::format_matches_text(&filter, log.len(), &matches),
                    OutputFormat::Json => display::format_matches_json(&filter, log.len(), &matches),
                }
            }
        }
    };

    print!("{output_text}");
    if !output_text.ends_with('\n') {
        println!();
    }
    if let Some(path) = &cli.output {
        write_output_file(path, &output_text)?;
    }

    Ok(())
}
