// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use expense_tracker::{
    parse_amount, parse_date, Category, ExpenseBook, ExpenseDetails, ExpenseError, ExpenseId,
    Granularity, Origin, Projection, TrackerConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about = "Personal expense tracker", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "EXPENSE_TRACKER_DB")]
    db: Option<PathBuf>,

    /// Config file (default: ./expense-tracker.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database if it does not exist yet
    Init,
    /// Record a new expense
    Add {
        #[arg(short, long, value_parser = parse_category_arg)]
        category: Category,
        #[arg(short, long, value_parser = parse_amount_arg)]
        amount: f64,
        /// Defaults to today
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(short = 'D', long, default_value = "")]
        description: String,
    },
    /// List saved expenses
    List {
        #[arg(long)]
        json: bool,
    },
    /// Change an expense; fields not given keep their current value
    Edit {
        id: ExpenseId,
        #[arg(short, long, value_parser = parse_category_arg)]
        category: Option<Category>,
        #[arg(short, long, value_parser = parse_amount_arg)]
        amount: Option<f64>,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        #[arg(short = 'D', long)]
        description: Option<String>,
    },
    /// Delete an expense
    Remove { id: ExpenseId },
    /// Delete every expense
    Clear {
        /// Skip the safety check
        #[arg(long)]
        yes: bool,
    },
    /// Totals by category, day or month
    Totals {
        #[arg(long, value_enum, default_value_t = TotalsBy::Category)]
        by: TotalsBy,
    },
    /// Show (and optionally save) expenses from a CSV or .xlsx file
    Import {
        file: PathBuf,
        /// Persist the imported rows
        #[arg(long)]
        save: bool,
    },
    /// Interactive terminal UI (default)
    Ui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TotalsBy {
    Category,
    Day,
    Month,
}

fn parse_category_arg(s: &str) -> Result<Category, String> {
    s.parse().map_err(|e: expense_tracker::expense::UnknownCategory| e.to_string())
}

fn parse_amount_arg(s: &str) -> Result<f64, String> {
    parse_amount(s).map_err(|e| e.to_string())
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let interactive = matches!(args.command, None | Some(Command::Ui));
    if let Err(err) = init_tracing(args.quiet || interactive, args.verbose) {
        eprintln!("❌ {:#}", err);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Store errors get the friendly message; everything else the chain
            match err.downcast_ref::<ExpenseError>() {
                Some(stale @ ExpenseError::NotFound(_)) => {
                    eprintln!("⚠️  {}", stale.user_message())
                }
                Some(expense_err) => eprintln!("❌ {}", expense_err.user_message()),
                None => eprintln!("❌ {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("EXPENSE_TRACKER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = TrackerConfig::load(args.config.as_deref())?.with_database(args.db);
    let mut book = ExpenseBook::open(&config)?;

    match args.command.unwrap_or(Command::Ui) {
        Command::Init => {
            println!("✓ Expense database ready at {}", book.store().path().display());
            println!("✓ {} expenses stored", book.store().count()?);
        }
        Command::Add {
            category,
            amount,
            date,
            description,
        } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let details = ExpenseDetails::new(category, amount, date, description);
            let id = book.add(&details)?;
            println!(
                "✓ Added expense {}: {} {} on {}",
                id,
                category,
                config.format_amount(amount),
                date
            );
        }
        Command::List { json } => {
            let projection = book.snapshot()?;
            if json {
                println!("{}", serde_json::to_string_pretty(projection.rows())?);
            } else {
                print_projection(&projection, &config);
            }
        }
        Command::Edit {
            id,
            category,
            amount,
            date,
            description,
        } => {
            let current = book.begin_edit(id)?.details;
            let updated = ExpenseDetails {
                category: category.unwrap_or(current.category),
                amount: amount.unwrap_or(current.amount),
                date: date.unwrap_or(current.date),
                description: description.unwrap_or(current.description),
            };
            book.confirm_edit(&updated)?;
            println!("✓ Updated expense {}", id);
        }
        Command::Remove { id } => {
            book.remove(id)?;
            println!("✓ Removed expense {}", id);
        }
        Command::Clear { yes } => {
            if !yes {
                anyhow::bail!("Refusing to delete every expense without --yes");
            }
            let removed = book.clear()?;
            println!("✓ Cleared {} expenses", removed);
        }
        Command::Totals { by } => print_totals(&book, by, &config)?,
        Command::Import { file, save } => run_import(&mut book, &file, save, &config)?,
        Command::Ui => run_ui_mode(book, config)?,
    }

    Ok(())
}

fn run_import(book: &mut ExpenseBook, file: &Path, save: bool, config: &TrackerConfig) -> Result<()> {
    println!("📂 Loading {}...", file.display());
    let report = book.import(file)?;
    println!(
        "✓ {} rows loaded, {} incomplete rows dropped",
        report.rows.len(),
        report.dropped
    );

    if save {
        let ids = book
            .save_imported()
            .context("Import stopped part-way; rows before the failure were saved")?;
        println!("✓ Saved {} expenses to {}", ids.len(), book.store().path().display());
    } else {
        print_projection(&book.snapshot()?, config);
    }
    Ok(())
}

fn print_projection(projection: &Projection, config: &TrackerConfig) {
    if let Origin::Import(path) = projection.origin() {
        println!("Showing data from the uploaded file {}", path.display());
    }
    if projection.is_empty() {
        println!("No expenses recorded yet.");
        return;
    }

    println!(
        "{:<8} {:<12} {:<15} {:>12}  {}",
        "ID", "Date", "Category", "Amount", "Description"
    );
    for row in projection.rows() {
        let id = row.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<12} {:<15} {:>12}  {}",
            id,
            row.details.date.to_string(),
            row.details.category,
            config.format_amount(row.details.amount),
            row.details.description
        );
    }
    println!(
        "{} expenses, total {}",
        projection.len(),
        config.format_amount(projection.total())
    );
}

fn print_totals(book: &ExpenseBook, by: TotalsBy, config: &TrackerConfig) -> Result<()> {
    match by {
        TotalsBy::Category => {
            let totals = book.category_totals()?;
            if totals.is_empty() {
                println!("No data available. Please add expenses first.");
            }
            for t in totals {
                println!(
                    "{:<15} {:>12}  ({} expenses)",
                    t.category,
                    config.format_amount(t.total),
                    t.count
                );
            }
        }
        TotalsBy::Day | TotalsBy::Month => {
            let granularity = if by == TotalsBy::Day {
                Granularity::Day
            } else {
                Granularity::Month
            };
            let totals = book.period_totals(granularity)?;
            if totals.is_empty() {
                println!("No data available. Please add expenses first.");
            }
            for t in totals {
                println!(
                    "{:<12} {:>12}  ({} expenses)",
                    t.period,
                    config.format_amount(t.total),
                    t.count
                );
            }
        }
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(book: ExpenseBook, config: TrackerConfig) -> Result<()> {
    let mut app = ui::App::new(book, config)?;
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_book: ExpenseBook, _config: TrackerConfig) -> Result<()> {
    anyhow::bail!("TUI mode not available. Rebuild with: cargo build --features tui")
}
