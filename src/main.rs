// budget-sim - headless front end for the cost and budget simulator

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use pama_budget_sim::{BudgetSimulator, Dimension, FilterState, Scenario, SimError, YearMonth};

#[derive(Parser)]
#[command(name = "budget-sim")]
#[command(about = "Cost and budget simulator for budget preparations")]
#[command(version)]
struct Cli {
    /// Log to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Input {
    /// CSV or Excel file with the spend records
    #[arg(long, short = 'd')]
    data: PathBuf,

    /// Worksheet to read from an Excel file (default: data)
    #[arg(long)]
    sheet: Option<String>,

    /// Restrict a dimension, e.g. --filter "Supplier Type=Local,Global"
    #[arg(long = "filter", short = 'f', value_name = "DIMENSION=VALUES")]
    filters: Vec<String>,

    /// TOML scenario with [params] and [filters]; flags take precedence
    #[arg(long)]
    scenario: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List the values each filter still offers
    Options {
        #[command(flatten)]
        input: Input,
    },
    /// Apply filters and print the simulation tables
    Simulate {
        #[command(flatten)]
        input: Input,

        /// Spend change in percent
        #[arg(long, allow_hyphen_values = true)]
        spend_change: Option<f64>,

        /// Price change in percent
        #[arg(long, allow_hyphen_values = true)]
        price_change: Option<f64>,

        /// First month the spend change applies to
        #[arg(long, value_name = "YYYYMM", value_parser = parse_year_month)]
        spend_start: Option<YearMonth>,

        /// First month the price change applies to
        #[arg(long, value_name = "YYYYMM", value_parser = parse_year_month)]
        price_start: Option<YearMonth>,

        /// Calendar year of the projected months (default: current year)
        #[arg(long)]
        projection_year: Option<i32>,
    },
}

fn parse_year_month(s: &str) -> Result<YearMonth, String> {
    s.parse().map_err(|e: SimError| e.to_string())
}

/// Parse `Dimension=v1,v2`.
fn parse_filter(arg: &str) -> Result<(Dimension, Vec<String>), SimError> {
    let (name, values) = arg.split_once('=').ok_or_else(|| {
        SimError::Validation(format!("Expected DIMENSION=VALUES, got '{arg}'"))
    })?;
    let dim: Dimension = name.trim().parse()?;
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    Ok((dim, values))
}

impl Input {
    fn scenario(&self) -> Result<Scenario, SimError> {
        let mut scenario = match &self.scenario {
            Some(path) => Scenario::load(path)?,
            None => Scenario::default(),
        };
        for arg in &self.filters {
            let (dim, values) = parse_filter(arg)?;
            scenario.filters = scenario.filters.with_selection(dim, values);
        }
        Ok(scenario)
    }

    fn simulator(&self) -> Result<BudgetSimulator, SimError> {
        BudgetSimulator::from_path(&self.data, self.sheet.as_deref())
    }
}

fn print_options(sim: &BudgetSimulator, filters: &FilterState) -> Result<(), SimError> {
    for (dim, options) in sim.available_options_all(filters)? {
        let marker = if filters.selection(dim).is_some() { "*" } else { " " };
        println!("{marker} {dim} ({}): {}", options.len(), options.join(", "));
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), SimError> {
    match cli.command {
        Command::Options { input } => {
            let scenario = input.scenario()?;
            let sim = input.simulator()?;
            print_options(&sim, &scenario.filters)
        }
        Command::Simulate {
            input,
            spend_change,
            price_change,
            spend_start,
            price_start,
            projection_year,
        } => {
            let mut scenario = input.scenario()?;
            let params = &mut scenario.params;
            if let Some(v) = spend_change {
                params.spend_change_pct = v;
            }
            if let Some(v) = price_change {
                params.price_change_pct = v / 100.0;
            }
            if let Some(v) = spend_start {
                params.spend_adjustment_start = v;
            }
            if let Some(v) = price_start {
                params.price_adjustment_start = v;
            }
            if projection_year.is_some() {
                params.projection_year = projection_year;
            }

            let sim = input.simulator()?;
            let result = sim.simulate(&scenario.filters, &scenario.params)?;

            let anchor = sim.anchor();
            println!(
                "Latest data: {} ({})  |  rows: {} of {}\n",
                anchor.year_month,
                anchor.month_name().unwrap_or("no month"),
                result.filtered.height(),
                sim.dataset().height()
            );
            print!("{}", result.report.render());
            Ok(())
        }
    }
}

// ── Logging ─────────────────────────────────────────────────────────────────

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn init_logging(verbose: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbose))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
