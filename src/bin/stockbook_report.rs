//! Prints sales statistics for the configured store as JSON.
//!
//! The store is chosen through the `STOCKBOOK_*` environment variables.

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use serde_json::{Map, Value, json};
use stockbook::{
    config::StoreConfig,
    telemetry,
    types::{DATE_FORMAT, DateRange, parse_date},
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "stockbook_report",
    version,
    about = "Sales by day, top products, and sales by origin as JSON"
)]
struct Cli {
    /// First included day, YYYY-MM-DD.
    #[arg(value_name = "START", value_parser = parse_day, requires = "end")]
    start: Option<NaiveDate>,

    /// Last included day, YYYY-MM-DD.
    #[arg(value_name = "END", value_parser = parse_day)]
    end: Option<NaiveDate>,
}

impl Cli {
    fn range(&self) -> Option<DateRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("'{raw}' is not a date in {DATE_FORMAT} form"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_tracing();
    let range = cli.range();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "bad configuration");
            return ExitCode::from(2);
        }
    };
    let inventory = match config.open_inventory() {
        Ok(inventory) => inventory,
        Err(err) => {
            error!(error = %err, dir = %config.data_dir.display(), "cannot open store");
            return ExitCode::FAILURE;
        }
    };
    info!(backend = ?config.backend, dir = %config.data_dir.display(), "store opened");

    let top: Map<String, Value> = inventory
        .top_products(range.as_ref())
        .into_iter()
        .map(|(name, total)| (name, Value::from(total)))
        .collect();
    let report = json!({
        "sales_by_day": inventory.sales_by_day(range.as_ref()),
        "top_products": top,
        "sales_by_origin": inventory.sales_by_origin(range.as_ref()),
    });

    match serde_json::to_string_pretty(&report) {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "cannot encode report");
            ExitCode::FAILURE
        }
    }
}
