//! Deposit Calculator CLI
//!
//! Command-line front end: calculate deposits, show growth tables and manage
//! the saved calculation history.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use deposit_calculator::calculation::{parse_terms, series, DepositTerms, InterestMethod};
use deposit_calculator::export::{write_history_csv, write_series_csv};
use deposit_calculator::format::{
    format_currency, format_currency_short, format_date, format_rate, format_years,
};
use deposit_calculator::history::{
    project, Calculation, CalculationRecord, FileStorage, HistoryError, HistoryStore, MethodFilter,
    RecordId, SortKey,
};
use deposit_calculator::CalculatorConfig;

#[derive(Debug, Parser)]
#[command(name = "deposit_calculator", version, about = "Deposit interest calculator")]
struct Cli {
    /// Directory holding the saved history (overrides DEPOSIT_CALC_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage key of the history snapshot (overrides DEPOSIT_CALC_STORAGE_KEY)
    #[arg(long, global = true)]
    storage_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate interest, print the growth table and save the result
    Calc {
        #[command(flatten)]
        input: TermsInput,

        /// Optional label for the saved calculation
        #[arg(long)]
        name: Option<String>,

        /// Do not save the calculation to history
        #[arg(long)]
        no_save: bool,
    },

    /// Print the year-by-year growth series
    Series {
        #[command(flatten)]
        input: TermsInput,

        /// Also write the series to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// List saved calculations
    History {
        /// all, simple or compound
        #[arg(long, default_value_t = MethodFilter::All)]
        filter: MethodFilter,

        /// date, years, rate or amount (always descending)
        #[arg(long, default_value_t = SortKey::CreatedAt)]
        sort: SortKey,

        /// Also write the listed calculations to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Rename a saved calculation; omit the name to clear it
    Rename {
        id: String,
        name: Option<String>,
    },

    /// Recalculate a saved entry with changed inputs, replacing it
    Edit {
        id: String,

        #[arg(long)]
        principal: Option<String>,

        #[arg(long)]
        rate: Option<String>,

        #[arg(long)]
        years: Option<String>,

        #[arg(long)]
        method: Option<InterestMethod>,

        #[arg(long)]
        name: Option<String>,
    },

    /// Delete a saved calculation
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Delete every saved calculation
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

/// Raw deposit inputs; validated before any calculation
#[derive(Debug, Args)]
struct TermsInput {
    /// Principal in won
    #[arg(long)]
    principal: Option<String>,

    /// Interest rate in percent per year (0 < rate <= 100)
    #[arg(long)]
    rate: Option<String>,

    /// Term in years, fractional allowed
    #[arg(long)]
    years: Option<String>,

    /// simple or compound
    #[arg(long, default_value_t = InterestMethod::Simple)]
    method: InterestMethod,
}

impl TermsInput {
    fn parse(&self) -> Result<DepositTerms> {
        let terms = parse_terms(
            self.principal.as_deref().unwrap_or_default(),
            self.rate.as_deref().unwrap_or_default(),
            self.years.as_deref().unwrap_or_default(),
        )?;
        Ok(terms)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = CalculatorConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(key) = cli.storage_key {
        config.storage_key = key;
    }

    match cli.command {
        Command::Calc { input, name, no_save } => {
            let terms = input.parse()?;
            let calculation = Calculation::new(terms, input.method).with_name(name.unwrap_or_default());
            print_result(&calculation);
            print_growth_table(&terms, input.method);

            if !no_save {
                let mut store = open_store(&config);
                let record = store.add(calculation).map_err(describe)?;
                println!("\nSaved as {}", record.id());
            }
        }

        Command::Series { input, csv } => {
            let terms = input.parse()?;
            print_growth_table(&terms, input.method);

            if let Some(path) = csv {
                let file = File::create(&path)
                    .with_context(|| format!("unable to create {}", path.display()))?;
                write_series_csv(file, series(&terms, input.method))?;
                println!("\nSeries written to: {}", path.display());
            }
        }

        Command::History { filter, sort, csv } => {
            let store = open_store(&config);
            let view = project(store.all(), filter, sort);

            if view.is_empty() {
                println!("No saved calculations yet.");
            }
            for record in &view {
                print_record(record);
            }

            if let Some(path) = csv {
                let file = File::create(&path)
                    .with_context(|| format!("unable to create {}", path.display()))?;
                write_history_csv(file, view.iter().copied())?;
                println!("History written to: {}", path.display());
            }
        }

        Command::Rename { id, name } => {
            let mut store = open_store(&config);
            let id = RecordId::from(id);
            store.rename(&id, name.as_deref().unwrap_or_default()).map_err(describe)?;
            println!("Renamed {id}");
        }

        Command::Edit { id, principal, rate, years, method, name } => {
            let mut store = open_store(&config);
            let id = RecordId::from(id);
            let original = store
                .get(&id)
                .cloned()
                .ok_or_else(|| describe(HistoryError::NotFound(id.clone())))?;

            let terms = parse_terms(
                &principal.unwrap_or_else(|| original.principal().to_string()),
                &rate.unwrap_or_else(|| original.rate().to_string()),
                &years.unwrap_or_else(|| original.years().to_string()),
            )?;
            let method = method.unwrap_or(original.method());
            let name = name.unwrap_or_else(|| original.name().to_string());

            store.take(&id).map_err(describe)?;
            let calculation = Calculation::new(terms, method).with_name(name);
            print_result(&calculation);
            let record = store.add(calculation).map_err(describe)?;
            println!("\nReplaced {} with {}", original.id(), record.id());
        }

        Command::Delete { id, yes } => {
            let mut store = open_store(&config);
            let id = RecordId::from(id);
            if store.get(&id).is_none() {
                return Err(describe(HistoryError::NotFound(id)));
            }
            if !yes && !confirm("Delete this calculation?")? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete(&id).map_err(describe)?;
            println!("Deleted {id}");
        }

        Command::Clear { yes } => {
            let mut store = open_store(&config);
            if !yes && !confirm("Delete ALL saved calculations? This cannot be undone.")? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = store.len();
            store.clear().map_err(describe)?;
            println!("Cleared {removed} calculations");
        }
    }

    Ok(())
}

/// Open the configured history, warning when a saved snapshot could not be fully loaded
fn open_store(config: &CalculatorConfig) -> HistoryStore<FileStorage> {
    let store = config.open_history();
    if let Some(err) = store.load_error() {
        if store.is_empty() {
            eprintln!("warning: {err}; starting with an empty history");
        } else {
            eprintln!("warning: {err}");
        }
    }
    store
}

/// Turn a history error into a user-facing message
fn describe(err: HistoryError) -> anyhow::Error {
    let hint = match &err {
        HistoryError::Persistence(inner) if inner.is_quota_exceeded() => {
            Some("Storage is full. Delete some saved calculations and try again.")
        }
        HistoryError::NotFound(_) => Some("Run `history` to see the current entries."),
        HistoryError::Persistence(_) => None,
    };
    match hint {
        Some(hint) => anyhow::anyhow!("{err}\n{hint}"),
        None => err.into(),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer)? == 0 {
        bail!("no confirmation received");
    }
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_result(calculation: &Calculation) {
    let terms = calculation.terms();
    let result = calculation.result();

    println!("Deposit Calculation ({})", calculation.method().label());
    println!("======================\n");
    println!("  Principal:  {:>20}", format_currency(terms.principal()));
    println!("  Rate:       {:>20}", format_rate(terms.rate()));
    println!("  Term:       {:>20}", format_years(terms.years()));
    println!("  Interest:   {:>20}", format_currency(result.interest));
    println!("  Total:      {:>20}", format_currency(result.total_amount));
}

fn print_growth_table(terms: &DepositTerms, method: InterestMethod) {
    println!("\nGrowth ({}):", method.label());
    println!("{:>6} {:>20} {:>20} {:>12}", "Year", "Amount", "Interest", "Short");
    println!("{}", "-".repeat(61));
    for point in series(terms, method) {
        println!(
            "{:>6} {:>20} {:>20} {:>12}",
            point.period,
            format_currency(point.amount),
            format_currency(point.interest),
            format_currency_short(point.amount),
        );
    }
}

fn print_record(record: &CalculationRecord) {
    let name = if record.name().is_empty() {
        "(unnamed)"
    } else {
        record.name()
    };
    println!(
        "{}  {} [{}]  {}",
        record.id(),
        name,
        record.method().label(),
        format_date(record.created_at())
    );
    println!(
        "    principal {}  rate {}  term {}  interest {}  total {}",
        format_currency(record.principal()),
        format_rate(record.rate()),
        format_years(record.years()),
        format_currency(record.interest()),
        format_currency(record.total_amount()),
    );
}
