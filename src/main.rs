//! # Lectio CLI (`lectio`)
//!
//! Daily Bible readings on the M'Cheyne plan, with structured passages,
//! word-level highlights, and a local/S3 cache.
//!
//! ## Usage
//!
//! ```bash
//! lectio --config ./lectio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lectio show` | Display a day's readings from the cache |
//! | `lectio parse <reference> --file <path>` | Parse raw passage text into verses |
//! | `lectio stats` | Reading and highlight statistics for a day |
//! | `lectio migrate <month> <day>` | Convert a legacy cache entry in place |
//! | `lectio keys` | Print the cache keys for a day |

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use lectio::cache::{legacy_cache_key, structured_cache_key, ReadingCache};
use lectio::config::{self, Config};
use lectio::display::DisplayOptions;
use lectio::extract::parse_passage_text;
use lectio::memo::ComputeCache;
use lectio::migrate::migrate_legacy_cache;
use lectio::readings::{date_with_offset, load_with_fallback, DailyReadings};
use lectio::store::Store;

/// Lectio — daily M'Cheyne Bible readings with structured passages and
/// highlights.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Missing config files fall back to built-in defaults.
#[derive(Parser)]
#[command(
    name = "lectio",
    about = "Daily M'Cheyne Bible readings with structured passages and highlights",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Cache location, S3 mirror, Bible version, and display settings are
    /// read from this file. A missing file uses defaults.
    #[arg(long, global = true, default_value = "./lectio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Display a day's readings.
    ///
    /// Loads structured readings from the cache (S3 first when configured,
    /// then local), migrating legacy entries on the fly. When the requested
    /// day is missing, the adjacent days are tried.
    Show {
        /// Day offset from today (`-1` for yesterday, `1` for tomorrow).
        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Hide highlight annotations and summaries.
        #[arg(long)]
        no_highlights: bool,
    },

    /// Parse raw passage text into structured verses.
    ///
    /// Reads the file, extracts verses for the given reference, applies
    /// typographic cleanup, and prints the formatted passage.
    Parse {
        /// Bible reference, e.g. `"Genesis 1:1-5"` or `"Psalm 23"`.
        reference: String,

        /// Path to a file containing the raw passage text.
        #[arg(long)]
        file: PathBuf,
    },

    /// Show reading and highlight statistics for a day.
    Stats {
        /// Day offset from today.
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Convert a legacy cache entry to the structured format.
    ///
    /// Looks up the legacy entry for the given date in the current year
    /// and rewrites it under the structured key.
    Migrate {
        /// Month (1-12).
        month: u32,

        /// Day of month.
        day: u32,
    },

    /// Print the cache keys for a day and whether they exist locally.
    Keys {
        /// Day offset from today.
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Show {
            offset,
            no_highlights,
        } => run_show(&cfg, offset, no_highlights).await,
        Commands::Parse { reference, file } => run_parse(&cfg, &reference, &file).await,
        Commands::Stats { offset } => run_stats(&cfg, offset).await,
        Commands::Migrate { month, day } => run_migrate(&cfg, month, day).await,
        Commands::Keys { offset } => run_keys(&cfg, offset).await,
    }
}

fn display_options(cfg: &Config, show_highlights: bool) -> DisplayOptions {
    DisplayOptions {
        show_highlights,
        max_width: cfg.display.max_width,
        ..DisplayOptions::default()
    }
}

async fn run_show(cfg: &Config, offset: i64, no_highlights: bool) -> Result<()> {
    let cache = ReadingCache::from_config(cfg)?.with_compute_cache(ComputeCache::new());
    let (date, readings) = load_with_fallback(&cache, offset).await;

    match readings {
        Some(readings) => {
            println!("📅 M'Cheyne readings for {}", date.format("%B %-d, %Y"));
            println!();
            println!("{}", readings.format_display(&display_options(cfg, !no_highlights)));
        }
        None => {
            println!("No readings found for {}.", date.format("%B %-d, %Y"));
        }
    }

    match cache.clear_old_entries(cfg.cache.days_to_keep) {
        Ok(0) => {}
        Ok(removed) => tracing::debug!(removed, "pruned old cache entries"),
        Err(err) => tracing::warn!(error = %err, "cache pruning failed"),
    }
    Ok(())
}

async fn run_parse(cfg: &Config, reference: &str, file: &PathBuf) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let passage = parse_passage_text(&raw, reference, &cfg.bible.version)
        .with_context(|| format!("failed to parse '{reference}'"))?;
    println!("{}", passage.format_display(&display_options(cfg, true)));
    Ok(())
}

async fn run_stats(cfg: &Config, offset: i64) -> Result<()> {
    let cache = ReadingCache::from_config(cfg)?;
    let (date, readings) = load_with_fallback(&cache, offset).await;
    let Some(readings) = readings else {
        println!("No readings found for {}.", date.format("%B %-d, %Y"));
        return Ok(());
    };

    println!(
        "📊 Statistics for {} ({} readings)",
        date.format("%B %-d, %Y"),
        readings.total_readings()
    );
    println!();
    print_category_stats("Family", &readings);
    print_category_stats("Secret", &readings);
    Ok(())
}

fn print_category_stats(category: &str, readings: &DailyReadings) {
    let items = match category {
        "Family" => &readings.family,
        _ => &readings.secret,
    };
    println!("{category} ({} readings):", items.len());
    for reading in items {
        match reading.as_structured() {
            Some(passage) => {
                println!("  {}", passage.format_metadata_summary());
                let stats = passage.get_highlight_statistics();
                if stats.total_highlights > 0 {
                    println!(
                        "    ✨ {} highlights, {:.1}% coverage",
                        stats.total_highlights, stats.coverage_percent
                    );
                }
            }
            None => println!("  (legacy entry, no statistics)"),
        }
    }
    println!();
}

async fn run_migrate(cfg: &Config, month: u32, day: u32) -> Result<()> {
    let year = Utc::now().date_naive().year();
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .with_context(|| format!("invalid date {month}/{day}/{year}"))?;

    let cache = ReadingCache::from_config(cfg)?;
    if migrate_legacy_cache(&cache, date).await? {
        println!("Migrated legacy cache entry for {date} to the structured format.");
    } else {
        println!("Nothing to migrate for {date}.");
    }
    Ok(())
}

async fn run_keys(cfg: &Config, offset: i64) -> Result<()> {
    let cache = ReadingCache::from_config(cfg)?;
    let date = date_with_offset(offset);

    for key in [structured_cache_key(date), legacy_cache_key(date)] {
        let present = cache.local().exists(&key).await.unwrap_or(false);
        let marker = if present { "✓" } else { "✗" };
        println!("{marker} {key}");
    }
    Ok(())
}
