pub mod analytics;
pub mod cache;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;


use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::PathBuf;

use analytics::DetailedReport;
use commands::import::{self, SheetFormat};
use commands::{backup, reports, sales};
use db::{Database, DatabaseExt};
use error::{Error, Result};
use models::{DateRange, FilterSpec, Selection};
use state::AppState;

#[derive(Debug, Parser)]
#[command(name = "marea-sales", version, about = "Restaurant sales analytics")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "MAREA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a POS sales export (.xlsx/.xls/.ods workbook or CSV)
    Import {
        file: PathBuf,
        #[arg(long, default_value_t = ';')]
        delimiter: char,
    },
    /// Print a report as JSON
    Report {
        /// monthly, top-items, categories, stats, waiter-performance,
        /// waiter-pdv, filter-options, or a detailed report
        /// (by-item, by-waiter, by-growth, by-hour, by-category, by-waiter-performance)
        kind: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write a date range to a JSON backup file
    Backup {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Delete the range after the file is written
        #[arg(long)]
        purge: bool,
    },
    /// Restore records from a JSON backup file
    Restore { file: PathBuf },
    /// Delete every stored record
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Show the record count and capacity status
    Count,
}

#[derive(Debug, clap::Args)]
struct FilterArgs {
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long)]
    waiter: Option<String>,
    #[arg(long)]
    pdv: Option<String>,
}

impl FilterArgs {
    fn into_filter(self) -> FilterSpec {
        let date_range = (self.from.is_some() || self.to.is_some()).then_some(DateRange {
            from: self.from,
            to: self.to,
        });
        FilterSpec {
            date_range,
            categories: self.categories.into_iter().collect::<BTreeSet<_>>(),
            waiter: Selection::from_arg(self.waiter),
            point_of_sale: Selection::from_arg(self.pdv),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_report(app: &AppState, kind: &str, filter: FilterSpec, limit: Option<usize>) -> Result<()> {
    let today = Local::now().date_naive();
    match kind {
        "monthly" => print_json(&reports::get_monthly_sales(app, &filter, today)?),
        "top-items" => print_json(&reports::get_top_items(app, &filter, today, limit)?),
        "categories" => print_json(&reports::get_category_sales(app, &filter, today)?),
        "stats" => print_json(&reports::get_sales_stats(app, &filter)?),
        "waiter-performance" => print_json(&reports::get_waiter_performance(app, &filter, today)?),
        "waiter-pdv" => {
            let waiter = filter
                .waiter
                .as_only()
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidArgument("waiter-pdv needs --waiter".to_string()))?;
            print_json(&reports::get_waiter_pdv_details(app, &waiter, &filter, today)?)
        }
        "filter-options" => print_json(&sales::filter_options(app.db())?),
        other => {
            let detailed: DetailedReport = other.parse().map_err(Error::InvalidArgument)?;
            print_json(&reports::get_detailed_report(app, detailed, &filter, today)?)
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref())?;
    logging::init(&config.log.level);
    match cli.config.as_deref() {
        Some(path) => tracing::info!("Loaded config from: {}", path.display()),
        None => tracing::info!("Using default embedded configuration"),
    }

    let db_path = config::get_database_path(&config, cli.config.as_deref());
    let app = AppState::new(Database::open(&db_path)?, config)?;

    match cli.command {
        Command::Import { file, delimiter } => {
            let summary = match SheetFormat::from_path(&file) {
                SheetFormat::Workbook => import::import_workbook(&app, &std::fs::read(&file)?)?,
                SheetFormat::Csv => {
                    let delimiter = u8::try_from(delimiter).map_err(|_| {
                        Error::InvalidArgument(format!("unsupported delimiter {:?}", delimiter))
                    })?;
                    import::import_csv(&app, File::open(&file)?, delimiter)?
                }
            };
            sales::check_capacity(app.db(), &app.config.limits)?;
            print_json(&summary)
        }
        Command::Report { kind, filter, limit } => {
            run_report(&app, &kind, filter.into_filter(), limit)
        }
        Command::Backup {
            from,
            to,
            dir,
            purge,
        } => print_json(&backup::backup_range(&app, from, to, &dir, purge)?),
        Command::Restore { file } => {
            let summary = backup::restore(&app, File::open(&file)?)?;
            sales::check_capacity(app.db(), &app.config.limits)?;
            print_json(&summary)
        }
        Command::Reset { yes } => {
            if !yes {
                return Err(Error::InvalidArgument(
                    "reset deletes every record; pass --yes to confirm".to_string(),
                ));
            }
            let deleted = backup::reset(&app)?;
            print_json(&serde_json::json!({ "deleted": deleted }))
        }
        Command::Count => {
            let total = sales::count(app.db(), &FilterSpec::default())?;
            let status = sales::check_capacity(app.db(), &app.config.limits)?;
            print_json(&serde_json::json!({ "count": total, "capacity": status }))
        }
    }
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
