use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::application::{ExpenseFilter, GroupSnapshot, SettlementService, SplitRequest};
use crate::domain::{TOLERANCE, format_amount, parse_amount};
use crate::io::{import_expenses_file, load_snapshot_file, parse_date};

/// Quota - Shared expenses, settled
#[derive(Parser)]
#[command(name = "quota")]
#[command(about = "Compute who owes whom in a group of shared expenses")]
#[command(version)]
pub struct Cli {
    /// Group file (JSON with members and expenses)
    #[arg(short, long, env = "QUOTA_GROUP", default_value = "group.json")]
    pub group: PathBuf,

    /// Extra expenses to load from CSV
    #[arg(short, long, env = "QUOTA_EXPENSES")]
    pub expenses: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the balance of every member
    Balances {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show the balance of a single member
    Balance {
        /// Member name or id
        member: String,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show the payments that settle the group
    Settle {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Verify the group's data is consistent
    Check,

    /// Work out the shares of a new expense and print it as JSON
    Split {
        /// Amount of the expense (e.g., "50.00" or "50")
        amount: String,

        /// Member who paid
        #[arg(long)]
        paid_by: String,

        /// Participants: "name" for equal splits, "name:value" otherwise
        #[arg(required = true)]
        participants: Vec<String>,

        /// How to split: equal, exact, percentage
        #[arg(short, long, value_enum, default_value = "equal")]
        mode: SplitMode,

        /// Description of the expense
        #[arg(short, long)]
        description: Option<String>,

        /// Category (e.g., "Food", "Travel")
        #[arg(short, long)]
        category: Option<String>,

        /// Date of the expense (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// Only expenses in this category ("all" for every category)
    #[arg(long)]
    pub category: Option<String>,

    /// Only expenses on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from_date: Option<String>,

    /// Only expenses on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to_date: Option<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<ExpenseFilter> {
        let from_date = self.from_date.as_deref().map(parse_day).transpose()?;
        let to_date = self.to_date.as_deref().map(parse_range_end).transpose()?;

        Ok(ExpenseFilter {
            category: self.category.clone(),
            from_date,
            to_date,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitMode {
    Equal,
    Exact,
    Percentage,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        let snapshot = self.load_group()?;
        let service = SettlementService::new(snapshot);

        match self.command {
            Commands::Balances { filter, format } => {
                run_balances_command(&service, &filter.to_filter()?, format)?;
            }

            Commands::Balance { member, filter } => {
                let entry = service.member_balance(&member, &filter.to_filter()?)?;
                println!("{}: {}", entry.member.name, format_amount(entry.balance));
            }

            Commands::Settle { filter, format } => {
                run_settle_command(&service, &filter.to_filter()?, format)?;
            }

            Commands::Check => {
                run_check_command(&service)?;
            }

            Commands::Split {
                amount,
                paid_by,
                participants,
                mode,
                description,
                category,
                date,
            } => {
                let amount =
                    parse_amount(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let request = parse_split_request(mode, &participants)?;
                let mut expense = service.build_expense(amount, &paid_by, request)?;

                expense = expense.with_date(match date {
                    Some(date_str) => parse_day(&date_str)?,
                    None => Utc::now(),
                });
                if let Some(desc) = description {
                    expense = expense.with_description(desc);
                }
                if let Some(cat) = category {
                    expense = expense.with_category(cat);
                }

                println!("{}", serde_json::to_string_pretty(&expense)?);
            }
        }

        Ok(())
    }

    fn load_group(&self) -> Result<GroupSnapshot> {
        let mut snapshot = load_snapshot_file(&self.group)?;

        if let Some(path) = &self.expenses {
            let result = import_expenses_file(path, &snapshot.members)?;
            if !result.is_clean() {
                eprintln!("Errors in {}:", path.display());
                for error in result.errors.iter().take(10) {
                    eprintln!("  {}", error);
                }
                if result.errors.len() > 10 {
                    eprintln!("  ... and {} more errors", result.errors.len() - 10);
                }
                anyhow::bail!("Expense import failed");
            }
            tracing::info!(imported = result.imported(), "imported expenses from CSV");
            snapshot = snapshot.with_expenses(result.expenses);
        }

        Ok(snapshot)
    }
}

fn default_log_directive(verbose: bool) -> &'static str {
    if verbose { "quota=debug" } else { "quota=warn" }
}

/// Send logs to stderr. `RUST_LOG` wins over the verbose flag.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_day(date_str: &str) -> Result<DateTime<Utc>> {
    parse_date(date_str)
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

/// Upper bound of a date range. A bare day covers the whole day, down to the
/// last nanosecond; a full timestamp is taken as is.
fn parse_range_end(date_str: &str) -> Result<DateTime<Utc>> {
    match NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d") {
        Ok(day) => day
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .map(|end| end.and_utc())
            .with_context(|| format!("Invalid date '{}'", date_str)),
        Err(_) => parse_day(date_str),
    }
}

fn parse_split_request(mode: SplitMode, participants: &[String]) -> Result<SplitRequest> {
    if mode == SplitMode::Equal {
        return Ok(SplitRequest::Equal(
            participants.iter().map(|p| p.trim().to_string()).collect(),
        ));
    }

    let mut pairs = Vec::with_capacity(participants.len());
    for entry in participants {
        let (name, value) = entry
            .split_once(':')
            .with_context(|| format!("Participant '{}' needs a value, as in 'name:10'", entry))?;
        let value = parse_amount(value.trim_end_matches('%'))
            .with_context(|| format!("Invalid value for participant '{}'", name))?;
        pairs.push((name.trim().to_string(), value));
    }

    Ok(match mode {
        SplitMode::Percentage => SplitRequest::Percentage(pairs),
        _ => SplitRequest::Exact(pairs),
    })
}

fn run_balances_command(
    service: &SettlementService<GroupSnapshot>,
    filter: &ExpenseFilter,
    format: OutputFormat,
) -> Result<()> {
    let balances = service.balances(filter)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&balances)?),
        OutputFormat::Table => {
            if balances.is_empty() {
                println!("No members found.");
                return Ok(());
            }
            println!("{:<20} {:>12}  {}", "MEMBER", "BALANCE", "STATUS");
            println!("{}", "-".repeat(44));
            for entry in balances {
                let status = if entry.balance > TOLERANCE {
                    "is owed"
                } else if entry.balance < -TOLERANCE {
                    "owes"
                } else {
                    "settled"
                };
                println!(
                    "{:<20} {:>12}  {}",
                    entry.member.name,
                    format_amount(entry.balance),
                    status
                );
            }
        }
    }
    Ok(())
}

fn run_settle_command(
    service: &SettlementService<GroupSnapshot>,
    filter: &ExpenseFilter,
    format: OutputFormat,
) -> Result<()> {
    let result = service.settle(filter)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Table => {
            if !result.group.is_empty() {
                println!("Group:    {}", result.group);
            }
            println!("Expenses: {}", result.expense_count);
            println!("Total:    {}", format_amount(result.total_spent));
            println!();

            if result.is_settled() {
                println!("Everyone is settled up.");
                return Ok(());
            }

            println!("{:<20} {:<20} {:>12}", "FROM", "TO", "AMOUNT");
            println!("{}", "-".repeat(54));
            for settlement in &result.settlements {
                println!(
                    "{:<20} {:<20} {:>12}",
                    settlement.from.name,
                    settlement.to.name,
                    format_amount(settlement.amount)
                );
            }
        }
    }
    Ok(())
}

fn run_check_command(service: &SettlementService<GroupSnapshot>) -> Result<()> {
    println!("Checking group data...\n");

    let report = service.check_integrity()?;

    println!("Members:  {}", report.member_count);
    println!("Expenses: {}", report.expense_count);
    println!("Spent:    {}", format_amount(report.total_spent));
    println!(
        "Balances: {}  {}",
        format_amount(report.balances.total()),
        if report.is_balanced() {
            "OK"
        } else {
            "UNBALANCED!"
        }
    );
    println!();

    if report.is_healthy() {
        println!("Group data is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Group integrity check failed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::domain::Expense;

    #[test]
    fn test_parse_split_request_equal() {
        let request =
            parse_split_request(SplitMode::Equal, &["Alice".into(), " Bob ".into()]).unwrap();
        assert_eq!(
            request,
            SplitRequest::Equal(vec!["Alice".into(), "Bob".into()])
        );
    }

    #[test]
    fn test_parse_split_request_with_values() {
        let request =
            parse_split_request(SplitMode::Percentage, &["Alice:60%".into(), "Bob:40".into()])
                .unwrap();
        assert_eq!(
            request,
            SplitRequest::Percentage(vec![("Alice".into(), dec!(60)), ("Bob".into(), dec!(40))])
        );

        assert!(parse_split_request(SplitMode::Exact, &["Alice".into()]).is_err());
    }

    #[test]
    fn test_to_date_covers_the_whole_day() {
        let args = FilterArgs {
            to_date: Some("2024-03-01".into()),
            ..FilterArgs::default()
        };
        let filter = args.to_filter().unwrap();

        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(500);
        let next_day = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        assert!(filter.to_date.is_some_and(|end| late <= end && end < next_day));

        let expense = Expense::new(dec!(10), Uuid::new_v4(), vec![]).with_date(late);
        assert!(filter.matches(&expense));
    }

    #[test]
    fn test_to_date_timestamp_is_kept_as_given() {
        let args = FilterArgs {
            to_date: Some("2024-03-01T10:00:00Z".into()),
            ..FilterArgs::default()
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(
            filter.to_date,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_default_log_directive() {
        assert_eq!(default_log_directive(true), "quota=debug");
        assert_eq!(default_log_directive(false), "quota=warn");
    }

    #[test]
    fn test_cli_parses_settle() {
        let cli = Cli::parse_from(["quota", "--group", "trip.json", "settle", "--format", "json"]);
        assert_eq!(cli.group, PathBuf::from("trip.json"));
        assert!(matches!(
            cli.command,
            Commands::Settle {
                format: OutputFormat::Json,
                ..
            }
        ));
    }
}
