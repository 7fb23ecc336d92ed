use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use masjid_ledger::config::Config;
use masjid_ledger::data::data_exporter::{
    serializer_for, write_export, ExportArtifact, ExportFormat, ExportOutcome, ExportSerializer,
    StatementExporter,
};
use masjid_ledger::data::engine::TableEngine;
use masjid_ledger::data::table_state::SortDirection;
use masjid_ledger::data::type_inference::parse_day;
use masjid_ledger::ledger::billing::statement_breakdown;
use masjid_ledger::ledger::screen::{parse_filter_arg, parse_sort_arg, ScreenRequest};
use masjid_ledger::ledger::LedgerKind;
use masjid_ledger::utils::logging::init_tracing;

mod table_display;

use table_display::display_page;

#[derive(Parser, Debug)]
#[command(name = "masjid-ledger", version)]
#[command(about = "Filter, sort, page, select and export mosque back-office ledgers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show one page of a ledger
    View {
        #[command(flatten)]
        ledger: LedgerArgs,

        #[command(flatten)]
        screen: ScreenArgs,
    },

    /// Export the filtered rows of a ledger (every page)
    Export {
        #[command(flatten)]
        ledger: LedgerArgs,

        #[command(flatten)]
        screen: ScreenArgs,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Output directory (defaults to the configured export directory)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Document title (defaults to the ledger's report title)
        #[arg(long)]
        title: Option<String>,

        /// Export only the selected rows that pass the filters
        #[arg(long)]
        selected: bool,
    },

    /// Statement of accounts for one member of the arrears register
    Statement {
        /// Arrears register (JSON or CSV)
        file: PathBuf,

        /// Member ID, e.g. M-001
        #[arg(short, long)]
        member: String,

        /// Month the statement counts back from (defaults to today)
        #[arg(long, value_parser = parse_date_arg, value_name = "DATE")]
        as_of: Option<NaiveDate>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Statement)]
        format: ExportFormat,

        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Write or show the configuration file
    Config {
        /// Write a commented default config
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Args, Debug)]
struct LedgerArgs {
    /// Ledger file (JSON array of objects, or CSV with a header row)
    file: PathBuf,

    #[arg(short, long, value_enum)]
    ledger: LedgerKind,
}

#[derive(Args, Debug)]
struct ScreenArgs {
    /// Column filter, COLUMN=VALUE; ranges use FROM..TO
    #[arg(long = "filter", value_parser = parse_filter_arg, value_name = "COLUMN=VALUE")]
    filters: Vec<(String, String)>,

    /// Sort column, optionally with :asc or :desc
    #[arg(long, value_parser = parse_sort_arg, value_name = "COLUMN[:DIR]")]
    sort: Option<(String, SortDirection)>,

    /// 1-based page number
    #[arg(long)]
    page: Option<usize>,

    #[arg(long)]
    page_size: Option<usize>,

    /// Select every filtered row
    #[arg(long)]
    select_all: bool,

    /// Select a row by key
    #[arg(long, value_name = "KEY")]
    select: Vec<String>,
}

impl From<ScreenArgs> for ScreenRequest {
    fn from(args: ScreenArgs) -> Self {
        ScreenRequest {
            filters: args.filters,
            sort: args.sort,
            page: args.page,
            page_size: args.page_size,
            select_all: args.select_all,
            select: args.select,
        }
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_day(s).ok_or_else(|| format!("'{}' is not a date (try YYYY-MM-DD)", s))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // The config subcommand owns the file, so reading it must not create it
    let config = match (&cli.command, &cli.config) {
        (Commands::Config { .. }, path) => {
            Config::load_or_default(&config_path(path.as_deref())?)?
        }
        (_, Some(path)) => Config::load_from(path)?,
        (_, None) => Config::load().unwrap_or_else(|e| {
            eprintln!("{} {:#}, using defaults", "warning:".yellow(), e);
            Config::default()
        }),
    };

    init_tracing(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::View { ledger, screen } => {
            let engine = open_screen(&ledger, screen, &config)?;
            display_page(
                &engine,
                ledger.ledger.total_column(),
                &config.export.currency,
            );
        }

        Commands::Export {
            ledger,
            screen,
            format,
            out,
            title,
            selected,
        } => {
            let engine = open_screen(&ledger, screen, &config)?;
            let kind = ledger.ledger;

            let mut request = kind.export_request(engine.state());
            request.currency = config.export.currency.clone();
            if let Some(title) = title {
                request.title = title;
            }
            if !config.export.include_totals {
                request.total_column = None;
            }

            let serializer = serializer(format, &config);
            let (outcome, stem, empty_message) = if selected {
                (
                    engine.export_selected(serializer.as_ref(), &request)?,
                    format!("{}_Selected", kind.export_stem()),
                    "No rows selected to export.",
                )
            } else {
                (
                    engine.export_filtered(serializer.as_ref(), &request)?,
                    kind.export_stem().to_string(),
                    "No records to export based on current filters.",
                )
            };

            match outcome {
                ExportOutcome::NoRows => {
                    println!("{}", empty_message.yellow());
                }
                ExportOutcome::Exported(artifact) => {
                    let dir = out.unwrap_or_else(|| config.export.output_dir.clone());
                    let path = write_export(&artifact, &dir, &stem)?;
                    println!(
                        "{}",
                        format!("Exported {} rows to {}", artifact.row_count, path.display())
                            .green()
                    );
                }
            }
        }

        Commands::Statement {
            file,
            member,
            as_of,
            format,
            out,
        } => {
            let records = LedgerKind::Arrears.load(&file)?;
            let Some(record) = records
                .position_of_key(&member)
                .and_then(|row| records.record(row))
            else {
                bail!("Member '{}' is not in the arrears register", member);
            };

            let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
            let mut batch = statement_breakdown(record, as_of);
            batch.currency = config.export.currency.clone();

            let serializer = serializer(format, &config);
            let artifact = ExportArtifact {
                format: serializer.format(),
                row_count: batch.rows.len(),
                bytes: serializer.serialize(&batch)?,
            };

            let dir = out.unwrap_or_else(|| config.export.output_dir.clone());
            let path = write_export(&artifact, &dir, &format!("Statement_{}", member))?;
            info!(target: "export", "Statement for {} as of {}", member, as_of);
            println!(
                "{}",
                format!("Statement written to {}", path.display()).green()
            );
        }

        Commands::Config { init, force, show } => {
            let path = config_path(cli.config.as_deref())?;

            let config = if init {
                Config::write_template(&path, force)?;
                println!("{}", format!("Wrote {}", path.display()).green());
                Config::load_from(&path)?
            } else {
                config
            };

            if show || !init {
                println!("{}", format!("# {}", path.display()).dark_grey());
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::get_config_path(),
    }
}

/// Load a ledger file and replay the requested screen operations on it
fn open_screen(ledger: &LedgerArgs, screen: ScreenArgs, config: &Config) -> Result<TableEngine> {
    let records = ledger.ledger.load(&ledger.file)?;
    let mut engine = ledger
        .ledger
        .open(records, config.table.page_size)
        .with_context(|| {
            format!(
                "{} does not look like a {} ledger",
                ledger.file.display(),
                ledger.ledger
            )
        })?;

    for warning in ScreenRequest::from(screen).apply(&mut engine) {
        warn!(target: "table", "{}", warning);
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
    Ok(engine)
}

fn serializer(format: ExportFormat, config: &Config) -> Box<dyn ExportSerializer> {
    match format {
        ExportFormat::Statement => Box::new(StatementExporter {
            records_per_page: config.export.statement_page_size,
        }),
        other => serializer_for(other),
    }
}
