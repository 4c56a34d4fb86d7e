//! kingsroom-scraper - tournament page acquisition
//!
//! Runs batch scrapes, single-identifier processing, or re-extraction of a
//! stored capture, and prints the result as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use kingsroom_common::config::{self, RootFolderInitializer, RootFolderResolver, TomlConfig};
use kingsroom_scraper::models::{EntityTarget, RunMode, RunOptions, RunRequest, RunThresholds};
use kingsroom_scraper::ScrapeService;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MODULE_NAME: &str = "scraper";

#[derive(Parser, Debug)]
#[command(name = "kingsroom-scraper")]
#[command(about = "Tournament results acquisition")]
#[command(version)]
struct Cli {
    /// Root folder for the capture cache and enriched output
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Configuration file (defaults to <config_dir>/kingsroom/scraper.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a batch over a candidate sequence
    Run(RunArgs),
    /// Process one identifier
    Single {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        id: u64,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Re-extract an already stored capture by storage key
    Reprocess {
        #[command(flatten)]
        target: TargetArgs,
        #[arg(long)]
        key: String,
    },
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Entity id, or any URL on the entity's site
    #[arg(long)]
    entity: String,
}

impl TargetArgs {
    fn target(&self) -> EntityTarget {
        if self.entity.starts_with("http://") || self.entity.starts_with("https://") {
            EntityTarget::Url(self.entity.clone())
        } else {
            EntityTarget::EntityId(self.entity.clone())
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Single,
    Bulk,
    Range,
    Gaps,
    Auto,
    Refresh,
}

#[derive(Args, Debug)]
struct OptionArgs {
    /// Always fetch live, ignoring cached captures
    #[arg(long)]
    no_cache: bool,
    #[arg(long)]
    force_refresh: bool,
    #[arg(long)]
    ignore_do_not_scrape: bool,
    #[arg(long)]
    skip_in_progress: bool,
    /// Leave finished games that are already stored alone
    #[arg(long)]
    keep_existing: bool,
    #[arg(long)]
    skip_not_published: bool,
    #[arg(long)]
    skip_not_found_gaps: bool,
}

impl OptionArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            use_cache: !self.no_cache,
            force_refresh: self.force_refresh,
            ignore_do_not_scrape_flag: self.ignore_do_not_scrape,
            skip_in_progress: self.skip_in_progress,
            override_existing: !self.keep_existing,
            skip_not_published: self.skip_not_published,
            skip_not_found_gaps: self.skip_not_found_gaps,
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    target: TargetArgs,

    #[arg(long, value_enum)]
    mode: ModeArg,

    /// Identifier for single mode
    #[arg(long)]
    id: Option<u64>,
    /// Number of identifiers for bulk mode
    #[arg(long)]
    count: Option<u64>,
    #[arg(long)]
    start: Option<u64>,
    #[arg(long)]
    end: Option<u64>,
    /// Comma-separated identifiers for gaps/refresh mode
    #[arg(long, value_delimiter = ',')]
    ids: Vec<u64>,
    /// Upper bound for auto mode
    #[arg(long)]
    max_id: Option<u64>,
    /// Last processed identifier for bulk/auto, instead of the cache ledger
    #[arg(long)]
    resume_after: Option<u64>,

    #[arg(long)]
    max_consecutive_not_found: Option<u32>,
    #[arg(long)]
    max_consecutive_errors: Option<u32>,
    #[arg(long)]
    max_consecutive_blanks: Option<u32>,
    #[arg(long)]
    max_total_errors: Option<u32>,

    #[command(flatten)]
    options: OptionArgs,
}

impl RunArgs {
    fn mode(&self) -> Result<RunMode> {
        let need = |value: Option<u64>, flag: &str| {
            value.with_context(|| format!("--{} is required for {:?} mode", flag, self.mode))
        };
        Ok(match self.mode {
            ModeArg::Single => RunMode::Single { id: need(self.id, "id")? },
            ModeArg::Bulk => RunMode::Bulk { count: need(self.count, "count")? },
            ModeArg::Range => RunMode::Range {
                start_id: need(self.start, "start")?,
                end_id: need(self.end, "end")?,
            },
            ModeArg::Gaps => RunMode::Gaps { ids: self.ids.clone() },
            ModeArg::Auto => RunMode::Auto { max_id: self.max_id },
            ModeArg::Refresh => RunMode::Refresh { ids: self.ids.clone() },
        })
    }

    fn request(&self, defaults: RunThresholds) -> Result<RunRequest> {
        let thresholds = RunThresholds {
            max_consecutive_not_found: self
                .max_consecutive_not_found
                .unwrap_or(defaults.max_consecutive_not_found),
            max_consecutive_errors: self
                .max_consecutive_errors
                .unwrap_or(defaults.max_consecutive_errors),
            max_consecutive_blanks: self
                .max_consecutive_blanks
                .unwrap_or(defaults.max_consecutive_blanks),
            max_total_errors: self.max_total_errors.unwrap_or(defaults.max_total_errors),
        };
        let mut request = RunRequest::new(self.target.target(), self.mode()?)
            .with_thresholds(thresholds)
            .with_options(self.options.options());
        request.resume_after = self.resume_after;
        Ok(request)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .or_else(|| config::default_config_path(MODULE_NAME));
    // Config decides the default log level, so its outcome is logged once
    // the subscriber exists
    let loaded = config_path
        .as_deref()
        .filter(|path| path.exists())
        .map(|path| (path, config::load_toml_config(path)));
    let toml_config = match &loaded {
        Some((_, Ok(config))) => config.clone(),
        _ => TomlConfig::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting kingsroom-scraper {}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Some((path, Ok(_))) => info!(path = %path.display(), "Loaded config file"),
        Some((_, Err(e))) => warn!("{}; using compiled defaults", e),
        None => warn!("Config file not found, using compiled defaults"),
    }

    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_arg(cli.root.clone())
        .with_toml(&toml_config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    info!("Root folder: {}", initializer.root().display());

    let service = ScrapeService::from_config(&toml_config, &initializer)
        .context("Failed to initialize scrape service")?;

    match cli.command {
        Command::Run(args) => {
            let request = args.request(toml_config.thresholds.into())?;
            let summary = service.run(&request).await.context("Run failed")?;
            print_json(&summary)
        }
        Command::Single { target, id, options } => {
            let report = service
                .process_single(&target.target(), id, &options.options())
                .await;
            print_json(&report)
        }
        Command::Reprocess { target, key } => {
            let report = service
                .reprocess_key(&target.target(), &key)
                .await
                .context("Reprocess failed")?;
            print_json(&report)
        }
    }
}
