use clap::{Parser, Subcommand};
use crawl_report::config::{ConfigLoader, ReportConfig};
use crawl_report::dataset::loader::DEFAULT_MAX_NULL_FRACTION;
use crawl_report::dataset::{Dataset, DatasetCache, DatasetLoader};
use crawl_report::output::ReportRenderer;
use crawl_report::output::console::ConsoleOutput;
use crawl_report::output::json::JsonOutput;
use crawl_report::report::ReportBuilder;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "crawl-report")]
#[command(version = "0.1.0")]
#[command(about = "Usage report over a crawl/extraction job export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report described by a config file
    Run {
        /// Path to the configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Show a loading spinner (stderr)
        #[arg(short, long, default_value_t = false)]
        progress: bool,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Build a report straight from a CSV export
    Summarize {
        /// Path to the CSV export
        #[arg(short, long)]
        input: PathBuf,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Drop columns with at least this fraction of missing cells
        #[arg(long, default_value_t = DEFAULT_MAX_NULL_FRACTION)]
        max_null_fraction: f64,
    },
    /// Rebuild the report whenever the source file changes
    Watch {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Seconds between checks of the source file
        #[arg(short, long, default_value_t = 5)]
        interval_secs: u64,
    },
}

fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe { std::env::set_var("RUST_LOG", "info"); }
    }
    let cli = Cli::parse();
    let logger = env_logger::Builder::from_default_env().build();

    let progress = matches!(cli.command, Commands::Run { progress: true, .. });
    let multi = MultiProgress::new();
    if progress {
        indicatif_log_bridge::LogWrapper::new(multi.clone(), logger).try_init()?;
    } else {
        let level = logger.filter();
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
    }

    match cli.command {
        Commands::Run { config, progress } => {
            let cfg = load_config(&config)?;
            let source = ConfigLoader::source_path(&config, &cfg);

            let mut loader = DatasetLoader::new(cfg.max_null_fraction());
            let spinner = progress.then(|| loading_spinner(&multi));
            if let Some(pb) = &spinner {
                loader = loader.with_progress(pb.clone());
            }

            let dataset = loader.load(&source)?;
            if let Some(pb) = spinner {
                pb.finish_with_message(format!("Loaded {} records", dataset.len()));
            }

            render(&cfg, &dataset)?;
        }
        Commands::Check { config } => {
            match ConfigLoader::load(&config) {
                Ok(cfg) => {
                    println!("✅ Config is valid:");
                    println!("   Name: {}", cfg.name);
                    println!("   Source: {}", ConfigLoader::source_path(&config, &cfg).display());
                    println!("   Max null fraction: {}", cfg.max_null_fraction());
                }
                Err(e) => {
                    eprintln!("❌ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Summarize { input, json, max_null_fraction } => {
            let dataset = DatasetLoader::new(max_null_fraction).load(&input)?;
            let report = ReportBuilder::build(&dataset)?;

            let mut renderer: Box<dyn ReportRenderer> = if json {
                Box::new(JsonOutput::stdout(true))
            } else {
                let title = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Crawl Usage Report".to_string());
                Box::new(ConsoleOutput::stdout(title))
            };
            renderer.render(&report)?;
            renderer.close()?;
        }
        Commands::Watch { config, interval_secs } => {
            let cfg = load_config(&config)?;
            let source = ConfigLoader::source_path(&config, &cfg);
            let mut cache = DatasetCache::new(DatasetLoader::new(cfg.max_null_fraction()));
            let interval = Duration::from_secs(interval_secs.max(1));

            log::info!("Watching {} every {}s", source.display(), interval.as_secs());
            loop {
                match cache.load(&source) {
                    Ok(lookup) if lookup.is_fresh() => {
                        if let Err(e) = render(&cfg, lookup.dataset()) {
                            log::error!("Failed to build report: {}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to load {}: {}", source.display(), e),
                }
                std::thread::sleep(interval);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ReportConfig> {
    log::info!("Loading config from {:?}", path);
    let cfg = ConfigLoader::load(path)?;
    log::info!("Loaded report config: {}", cfg.name);
    Ok(cfg)
}

fn render(cfg: &ReportConfig, dataset: &Dataset) -> anyhow::Result<()> {
    let report = ReportBuilder::build(dataset)?;
    let mut renderer = ConfigLoader::create_renderer(cfg);
    renderer.render(&report)?;
    renderer.close()?;
    Ok(())
}

fn loading_spinner(multi: &MultiProgress) -> ProgressBar {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
