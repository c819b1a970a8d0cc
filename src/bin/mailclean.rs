use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use mailclean::{
    AppConfig, ChecksEnabled, DedupReport, NetworkInspector, PostgresRowStore, ValidationPolicy,
    ValidationRun, dedupe, validate,
};

#[path = "mailclean/args.rs"]
mod args;
#[path = "mailclean/logging.rs"]
mod logging;

use crate::args::{Cli, Format, Mode};

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] [{wide_bar}] {pos}/{len} ({eta})",
    ) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn print_dedup(report: &DedupReport, format: Format) -> Result<()> {
    match format {
        Format::Human => println!("Removed duplicates: {} row(s) deleted", report.removed),
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn print_validation(run: &ValidationRun, format: Format) -> Result<()> {
    match format {
        Format::Human => println!(
            "Validation Complete: {} valid, {} invalid",
            run.valid, run.invalid
        ),
        Format::Json => println!("{}", serde_json::to_string_pretty(run)?),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let Some(mode) = cli.mode() else {
        eprintln!("error: exactly one of --dedup (-p) or --validate (-v) is required\n");
        Cli::command().print_help()?;
        std::process::exit(1);
    };

    logging::init(cli.debug)?;

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;
    let layout = config.table_layout()?;
    info!(?config, "configuration loaded");

    match mode {
        Mode::Dedup => {
            let ignored = cli.validation_flags();
            if !ignored.is_empty() {
                warn!(flags = ?ignored, "ignored with --dedup");
            }
            let mut store = PostgresRowStore::connect(&config.postgres_config(), layout)
                .with_context(|| format!("connect to {}:{}", config.db_host, config.db_port))?;
            let report = dedupe(&mut store).context("remove duplicates")?;
            print_dedup(&report, cli.format)?;
        }
        Mode::Validate => {
            let checks = ChecksEnabled {
                mx: cli.enable_mx,
                smtp: cli.enable_smtp,
                catch_all: cli.enable_catch_all,
            };
            let policy = ValidationPolicy {
                checks,
                force: cli.force,
                proxy: cli.proxy.clone(),
            };

            let mut options = config.inspector_options(checks);
            if let Some(proxy) = policy.proxy.as_deref() {
                options = options.with_proxy(proxy).context("invalid --proxy")?;
            }
            let inspector = NetworkInspector::new(options).context("prepare network checks")?;

            let mut store = PostgresRowStore::connect(&config.postgres_config(), layout)
                .with_context(|| format!("connect to {}:{}", config.db_host, config.db_port))?;
            let mut bar = progress_bar();
            let run = validate(&mut store, &inspector, &policy, &mut bar)
                .context("validate emails")?;
            print_validation(&run, cli.format)?;
        }
    }

    Ok(())
}
