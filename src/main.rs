use checkbook::operations::add::{create_entry, parse_date};
use checkbook::operations::import::{DEFAULT_SEPARATOR, import_csv_file};
use checkbook::operations::reconcile::signed_total;
use checkbook::operations::remove::remove_entry_from_db;
use checkbook::{
    Cadence, Classification, Config, FieldMapping, Ledger, LedgerOptions, Money, Reconciliation,
    RecurringRule, TypeCheck, config::DEFAULT_DB_PATH,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "checkbook", about = "Personal ledger with reconciliation and recurring entries")]
struct Cli {
    /// Path to the SQLite database.
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,
    /// Accept type names that are not registered.
    #[arg(long, global = true)]
    lenient_types: bool,
    #[command(subcommand)]
    command: UserCommands,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create or upgrade the database, then post due recurring entries.
    Init,
    /// Add a transaction.
    Add(EntryArgs),
    /// Replace every field of an existing transaction.
    Edit {
        id: i64,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Remove a transaction by id.
    Remove { id: String },
    /// Print transactions, newest first.
    List {
        #[arg(long)]
        unchecked: bool,
    },
    /// Toggle the checked state of a transaction.
    Check { id: i64 },
    #[command(subcommand)]
    Types(TypeCommands),
    #[command(subcommand)]
    Rules(RuleCommands),
    /// Post every recurring entry due today.
    RunDue,
    /// Import transactions from a CSV file.
    Import(ImportArgs),
    /// Compare ledger totals with a bank balance.
    Reconcile { bank_balance: String },
    /// Show database path, count and totals.
    Info,
}

#[derive(Args)]
struct EntryArgs {
    date: String,
    label: String,
    amount: String,
    type_name: String,
    #[arg(long)]
    checked: bool,
}

#[derive(Subcommand)]
enum TypeCommands {
    List,
    Add { name: String, kind: Kind },
    Update { name: String, kind: Kind },
    Remove { name: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Expense,
    Income,
}

impl From<Kind> for Classification {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Expense => Classification::Outflow,
            Kind::Income => Classification::Inflow,
        }
    }
}

#[derive(Subcommand)]
enum RuleCommands {
    List,
    Add {
        label: String,
        amount: String,
        type_name: String,
        cadence: String,
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        day_of_month: Option<u32>,
        #[arg(long)]
        inactive: bool,
    },
    Remove { id: i64 },
}

#[derive(Args)]
struct ImportArgs {
    file: PathBuf,
    #[arg(long, default_value_t = DEFAULT_SEPARATOR as char)]
    separator: char,
    #[arg(long)]
    no_headers: bool,
    #[arg(long, default_value_t = 0)]
    date_column: usize,
    #[arg(long, default_value_t = 1)]
    label_column: usize,
    #[arg(long, default_value_t = 2)]
    amount_column: usize,
    #[arg(long)]
    type_column: Option<usize>,
    #[arg(long, default_value = "CB")]
    default_type: String,
    #[arg(long)]
    checked: bool,
}

fn main() -> ExitCode {
    checkbook::init_tracing();
    let cli = Cli::parse();

    let config = Config {
        db_path: cli.db.clone(),
        options: LedgerOptions {
            type_check: if cli.lenient_types { TypeCheck::Lenient } else { TypeCheck::Strict },
        },
    };

    let ledger = match Ledger::open(&config) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Failed to open the ledger: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let today = checkbook::today();
    match ledger.run_due_postings(today) {
        Ok(summary) if summary.posted > 0 => println!("Posted {} recurring transaction(s).", summary.posted),
        Ok(_) => {}
        Err(e) => eprintln!("Error running recurring transactions: {}", e),
    }

    match run(&ledger, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(ledger: &Ledger, command: UserCommands) -> Result<(), String> {
    let today = checkbook::today();
    match command {
        UserCommands::Init | UserCommands::RunDue => {}
        UserCommands::Add(args) => {
            let entry = build_entry(&args, today)?;
            let id = ledger.create_entry(&entry).map_err(|e| e.to_string())?;
            println!("Transaction {} added successfully!", id);
        }
        UserCommands::Edit { id, entry } => {
            let entry = build_entry(&entry, today)?;
            ledger.update_entry(id, &entry).map_err(|e| e.to_string())?;
            println!("Transaction {} updated.", id);
        }
        UserCommands::Remove { id } => {
            let id = remove_entry_from_db(ledger.connection(), &id).map_err(|e| e.to_string())?;
            println!("Transaction {} removed successfully.", id);
        }
        UserCommands::List { unchecked } => {
            let mut view = Reconciliation::new();
            view.set_hide_checked(unchecked);
            let entries = view.visible_entries(ledger.connection()).map_err(|e| e.to_string())?;
            for entry in &entries {
                println!(
                    "{:>5}  {}  {:<30}  {:>12}  {:<10}  {}",
                    entry.id.unwrap_or_default(),
                    entry.date,
                    entry.label,
                    entry.amount,
                    entry.type_name,
                    entry.check_date().map(|d| format!("checked {}", d)).unwrap_or_default()
                );
            }
            let classes: HashMap<String, Classification> = ledger
                .list_types()
                .map_err(|e| e.to_string())?
                .into_iter()
                .map(|record| (record.name, record.classification))
                .collect();
            let shown = signed_total(&entries, |name| classes.get(name).copied().unwrap_or_default());
            println!("{} transaction(s), net {}", entries.len(), shown);
        }
        UserCommands::Check { id } => {
            let entry = ledger.toggle_checked(id, today).map_err(|e| e.to_string())?;
            let state = if entry.is_checked() { "checked" } else { "unchecked" };
            println!("Transaction {} is now {}.", id, state);
        }
        UserCommands::Types(cmd) => run_types(ledger, cmd)?,
        UserCommands::Rules(cmd) => run_rules(ledger, cmd)?,
        UserCommands::Import(args) => {
            let mapping = FieldMapping {
                date_column: args.date_column,
                label_column: args.label_column,
                amount_column: args.amount_column,
                type_column: args.type_column,
                default_type: args.default_type,
                checked: args.checked,
            };
            let separator = u8::try_from(args.separator)
                .map_err(|_| format!("Unsupported separator '{}'", args.separator))?;
            let report = import_csv_file(
                ledger.connection(),
                &args.file,
                separator,
                !args.no_headers,
                &mapping,
                ledger.options(),
                today,
            )?;
            println!("Successfully imported {} of {} rows.", report.imported, report.total_rows());
            for rejected in &report.rejected {
                println!("  row {}: {}", rejected.row + 1, rejected.reason);
            }
            if !report.is_success() {
                return Err(format!("{} row(s) rejected", report.rejected.len()));
            }
        }
        UserCommands::Reconcile { bank_balance } => {
            let bank_balance = Money::parse_lenient(&bank_balance).map_err(|e| e.to_string())?;
            let mut session = Reconciliation::new();
            session.start(bank_balance);
            if let Some(status) = session.status(ledger.connection()).map_err(|e| e.to_string())? {
                println!("Bank balance:    {}", status.bank_balance);
                println!("Remaining total: {}", status.remaining_total);
                println!("Checked total:   {}", status.checked_total);
                println!("Difference:      {}", status.difference);
            }
            let unchecked = session.visible_entries(ledger.connection()).map_err(|e| e.to_string())?;
            println!("{} unchecked transaction(s).", unchecked.len());
            session.end();
        }
        UserCommands::Info => {
            let summary = ledger.summary().map_err(|e| e.to_string())?;
            println!("{}", summary);
        }
    }
    Ok(())
}

fn build_entry(args: &EntryArgs, today: chrono::NaiveDate) -> Result<checkbook::LedgerEntry, String> {
    let entry = create_entry(&args.date, &args.label, &args.amount, &args.type_name).map_err(|e| e.to_string())?;
    Ok(if args.checked { entry.checked_on(today) } else { entry })
}

fn run_types(ledger: &Ledger, command: TypeCommands) -> Result<(), String> {
    match command {
        TypeCommands::List => {
            for record in ledger.list_types().map_err(|e| e.to_string())? {
                println!("{:<20} {}", record.name, record.classification);
            }
        }
        TypeCommands::Add { name, kind } => {
            ledger.add_type(&name, kind.into()).map_err(|e| e.to_string())?;
            println!("Type '{}' added.", name.trim());
        }
        TypeCommands::Update { name, kind } => {
            ledger.update_type(&name, kind.into()).map_err(|e| e.to_string())?;
            println!("Type '{}' updated.", name);
        }
        TypeCommands::Remove { name } => {
            ledger.remove_type(&name).map_err(|e| e.to_string())?;
            println!("Type '{}' removed.", name);
        }
    }
    Ok(())
}

fn run_rules(ledger: &Ledger, command: RuleCommands) -> Result<(), String> {
    match command {
        RuleCommands::List => {
            for rule in ledger.rules().map_err(|e| e.to_string())? {
                println!(
                    "{:>4}  {:<24} {:>10}  {:<10} {:<8} next {}{}",
                    rule.id.unwrap_or_default(),
                    rule.label,
                    rule.amount,
                    rule.type_name,
                    rule.cadence,
                    rule.next_execution_date(),
                    if rule.active { "" } else { "  (inactive)" }
                );
            }
        }
        RuleCommands::Add {
            label,
            amount,
            type_name,
            cadence,
            start,
            end,
            day_of_month,
            inactive,
        } => {
            let cadence: Cadence = cadence.parse()?;
            let amount = Money::parse_lenient(&amount).map_err(|e| e.to_string())?;
            let start = parse_date(&start).map_err(|e| e.to_string())?;
            let mut rule = RecurringRule::new(label, amount, type_name, cadence, start);
            rule.end_date = end.as_deref().map(parse_date).transpose().map_err(|e| e.to_string())?;
            if let Some(day) = day_of_month {
                rule.day_of_month = day;
            }
            rule.active = !inactive;
            let id = ledger.create_rule(&rule).map_err(|e| e.to_string())?;
            println!("Recurring rule {} created.", id);
        }
        RuleCommands::Remove { id } => {
            ledger.delete_rule(id).map_err(|e| e.to_string())?;
            println!("Recurring rule {} removed.", id);
        }
    }
    Ok(())
}
