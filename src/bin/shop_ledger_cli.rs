use std::{collections::HashMap, env, error::Error, process, sync::Arc};

use colored::Colorize;

use shop_ledger::{
    config::{Config, ConfigManager},
    core::{
        services::{BucketSummary, ClosedDayOutcome, DateRange, GroupMode, Summary},
        AppState, Clock, SystemClock,
    },
    init,
    ledger::{format_amount, EntryInput, EntryKind, LedgerEntry},
    storage::{
        DriveClient, EnvTokenSource, FileKeyValueStore, SyncAdapter, SyncError, SyncOptions,
        TokenGrant,
    },
    utils::build_info,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

const PIN_ENV: &str = "SHOP_LEDGER_PIN";
const SWITCHES: [&str; 1] = ["all-time"];
/// Commands that change existing records and therefore need the PIN.
const GATED_COMMANDS: [&str; 4] = ["edit", "delete", "close-day", "reopen-day"];
const MAX_LOOKBACK_DAYS: u32 = 3660;

fn main() {
    init();

    if let Err(err) = run() {
        eprintln!("{} {err}", "Error:".red().bold());
        process::exit(1);
    }
}

struct Args {
    positional: Vec<String>,
    options: HashMap<String, String>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> CliResult<Self> {
        let mut positional = Vec::new();
        let mut options = HashMap::new();
        while let Some(arg) = raw.next() {
            let Some(name) = arg.strip_prefix("--") else {
                positional.push(arg);
                continue;
            };
            if SWITCHES.contains(&name) {
                options.insert(name.to_string(), String::new());
                continue;
            }
            let value = raw
                .next()
                .ok_or_else(|| format!("option --{name} needs a value"))?;
            options.insert(name.to_string(), value);
        }
        Ok(Self {
            positional,
            options,
        })
    }

    fn arg(&self, index: usize, what: &str) -> CliResult<&str> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| format!("missing {what}").into())
    }

    fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    fn has(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }
}

struct Workspace {
    config: Config,
    adapter: SyncAdapter,
    state: AppState,
    clock: SystemClock,
}

fn run() -> CliResult<()> {
    let args = Args::parse(env::args().skip(1))?;
    let Some(command) = args.positional.first().cloned() else {
        print_usage();
        process::exit(1);
    };

    match command.as_str() {
        "version" => {
            println!("{}", build_info::current().describe());
            return Ok(());
        }
        "help" => {
            print_usage();
            return Ok(());
        }
        _ => {}
    }

    let mut session = open_workspace()?;
    if let Some(pin) = args
        .option("pin")
        .map(str::to_string)
        .or_else(|| env::var(PIN_ENV).ok())
    {
        if GATED_COMMANDS.contains(&command.as_str()) {
            session.state.unlock(&pin)?;
        } else if let Err(err) = session.state.unlock(&pin) {
            warning(&format!("{err} Continuing without unlocking."));
        }
    }

    match command.as_str() {
        "summary" => show_summary(&mut session, &args)?,
        "add" => {
            let input = entry_input(&args, 1)?;
            let id = session.state.add_entry(input, &session.clock)?;
            persist(&session)?;
            success(&format!("Added entry {id}"));
        }
        "edit" => {
            let id = args.arg(1, "entry id")?.to_string();
            let input = entry_input(&args, 2)?;
            session.state.edit_entry(&id, input, &session.clock)?;
            persist(&session)?;
            success(&format!("Updated entry {id}"));
        }
        "delete" => {
            let id = args.arg(1, "entry id")?;
            match session.state.delete_entry(id)? {
                Some(_) => {
                    persist(&session)?;
                    success(&format!("Deleted entry {id}"));
                }
                None => warning(&format!("No entry with id {id}; nothing deleted.")),
            }
        }
        "close-day" => {
            let day = args.arg(1, "date")?;
            match session.state.mark_closed_day(day)? {
                ClosedDayOutcome::AlreadyMarked => {
                    warning(&format!("{day} is already marked closed."))
                }
                _ => {
                    persist(&session)?;
                    success(&format!("Marked {day} as closed."));
                }
            }
        }
        "reopen-day" => {
            let day = args.arg(1, "date")?;
            match session.state.reopen_day(day)? {
                ClosedDayOutcome::NotMarked => {
                    warning(&format!("{day} was not marked closed."))
                }
                _ => {
                    persist(&session)?;
                    success(&format!("Reopened {day}."));
                }
            }
        }
        "missing" => {
            let days = match args.option("days") {
                Some(raw) => raw.parse()?,
                None => session.config.reminder_lookback_days,
            };
            if days > MAX_LOOKBACK_DAYS {
                return Err(format!("--days must be at most {MAX_LOOKBACK_DAYS}").into());
            }
            let missing = session.state.missing_days(session.clock.today(), days);
            if missing.is_empty() {
                success(&format!("Every day in the last {days} has records or is closed."));
            } else {
                section("Days without records");
                for day in missing {
                    println!("  {day}");
                }
            }
        }
        "recent" => {
            let limit = match args.option("limit") {
                Some(raw) => raw.parse()?,
                None => session.config.recent_entries_limit,
            };
            section("Recent entries");
            let currency = session.config.currency.clone();
            for entry in session.state.recent_entries(limit) {
                print_entry(entry, &currency);
            }
        }
        "change-pin" => {
            let current = args.arg(1, "current PIN")?;
            let new_pin = args.arg(2, "new PIN")?;
            let confirm = args.arg(3, "PIN confirmation")?;
            session.state.change_pin(current, new_pin, confirm)?;
            persist(&session)?;
            success("PIN updated.");
        }
        "export" => {
            println!("{}", serde_json::to_string_pretty(&session.state.document)?);
        }
        "sign-in" => {
            let token = args.arg(1, "access token")?;
            let expires_in = match args.positional.get(2) {
                Some(raw) => raw.parse()?,
                None => 3600,
            };
            session.adapter.sign_in(TokenGrant::new(token, expires_in))?;
            success("Signed in. Future commands will sync with remote storage.");
        }
        "sign-out" => {
            session.adapter.sign_out()?;
            success("Signed out. Records stay on this device.");
        }
        other => {
            print_usage();
            return Err(format!("unknown command `{other}`").into());
        }
    }

    Ok(())
}

fn open_workspace() -> CliResult<Workspace> {
    let manager = ConfigManager::new()?;
    let config = manager.load()?;
    let cache = FileKeyValueStore::new(manager.cache_dir(&config))?;
    let remote = DriveClient::new(&config.drive_api_base)?;
    let clock = SystemClock;

    let adapter = SyncAdapter::new(
        Arc::new(remote),
        Arc::new(cache),
        Arc::new(clock),
        SyncOptions::from_config(&config),
    )
    .with_token_source(Arc::new(EnvTokenSource));
    adapter.initialize();

    let report = adapter.fetch_document();
    for note in &report.warnings {
        warning(note);
    }

    let mut state = AppState::new(report.document, clock.today());
    let seeded_pin = state.ensure_pin_hash(&config.default_pin);
    let session = Workspace {
        config,
        adapter,
        state,
        clock,
    };
    if seeded_pin {
        persist(&session)?;
    }
    Ok(session)
}

/// Saves the document. Warns instead of failing when one of the two copies
/// was still written.
fn persist(session: &Workspace) -> CliResult<()> {
    match session.adapter.save_document(&session.state.document) {
        Ok(()) => Ok(()),
        Err(SyncError::NotAuthenticated) => {
            warning("Not signed in; saved on this device only.");
            Ok(())
        }
        Err(SyncError::Remote(err)) => {
            warning(&format!("Saved on this device, but remote sync failed: {err}"));
            Ok(())
        }
        Err(err @ SyncError::LocalCacheFailed(_)) => {
            warning(&err.to_string());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn entry_input(args: &Args, first: usize) -> CliResult<EntryInput> {
    let date = args.arg(first, "date")?;
    let kind_raw = args.arg(first + 1, "entry type (income|expense)")?;
    let kind = EntryKind::parse(kind_raw)
        .ok_or_else(|| format!("entry type must be income or expense, got `{kind_raw}`"))?;
    let amount: f64 = args
        .arg(first + 2, "amount")?
        .parse()
        .map_err(|_| "amount must be a number")?;

    let mut input = EntryInput::new(date, kind, amount);
    if let Some(category) = args.option("category") {
        input = input.with_category(category);
    }
    if let Some(note) = args.option("note") {
        input = input.with_note(note);
    }
    if let Some(mode) = args.option("payment") {
        input = input.with_payment_mode(mode);
    }
    Ok(input)
}

fn show_summary(session: &mut Workspace, args: &Args) -> CliResult<()> {
    let today = session.clock.today();
    if args.has("all-time") {
        session.state.set_range(DateRange::unbounded());
    } else if args.option("from").is_some() || args.option("to").is_some() {
        session
            .state
            .set_range(DateRange::new(args.option("from"), args.option("to")));
    }
    if let Some(mode) = args.option("mode") {
        session.state.set_mode(GroupMode::parse(mode));
    }

    let currency = session.config.currency.clone();
    let name = session
        .state
        .document
        .settings
        .business_name_or(&session.config.business_name)
        .to_string();
    section(&name);

    let cards = session.state.period_summaries(today);
    print_summary("Today", &cards.today, &currency);
    print_summary("This week", &cards.week, &currency);
    print_summary("This month", &cards.month, &currency);
    print_summary("This year", &cards.year, &currency);

    let report = session.state.report();
    section(&report.title);
    print_summary(
        &format!("{} entries", report.entry_count),
        &report.summary,
        &currency,
    );
    println!("  Grouped {}:", report.mode);
    for bucket in &report.buckets {
        print_bucket(bucket, &currency);
    }
    Ok(())
}

fn print_summary(label: &str, summary: &Summary, currency: &str) {
    let profit = format!("{} {}", currency, format_amount(summary.profit));
    let profit = if summary.profit < 0.0 {
        profit.red()
    } else {
        profit.green()
    };
    println!(
        "  {:<12} income {} {}  expense {} {}  profit {}",
        label,
        currency,
        format_amount(summary.income),
        currency,
        format_amount(summary.expense),
        profit
    );
}

fn print_bucket(bucket: &BucketSummary, currency: &str) {
    println!(
        "    {:<16} income {} {}  expense {} {}  profit {} {}",
        bucket.label,
        currency,
        format_amount(bucket.income),
        currency,
        format_amount(bucket.expense),
        currency,
        format_amount(bucket.profit)
    );
}

fn print_entry(entry: &LedgerEntry, currency: &str) {
    let amount = format!("{} {}", currency, format_amount(entry.amount));
    let amount = if entry.is_income() {
        amount.green()
    } else {
        amount.red()
    };
    let mut line = format!("  {}  {:<8} {}", entry.date, entry.kind.as_str(), amount);
    if !entry.category.is_empty() {
        line.push_str(&format!("  [{}]", entry.category));
    }
    if !entry.note.is_empty() {
        line.push_str(&format!("  {}", entry.note));
    }
    line.push_str(&format!("  ({})", entry.id.dimmed()));
    println!("{line}");
}

fn section(title: &str) {
    println!("{}", format!("=== {} ===", title.trim()).bold());
}

fn success(message: &str) {
    println!("{} {message}", "[ok]".green());
}

fn warning(message: &str) {
    eprintln!("{} {message}", "[!]".yellow());
}

fn print_usage() {
    eprintln!(
        "Usage: shop_ledger_cli [--pin <pin>] <command>\n\
         Commands:\n  \
         summary [--from YYYY-MM-DD] [--to YYYY-MM-DD] [--all-time] [--mode daily|weekly|monthly|quarterly|yearly|all]\n  \
         add <date> <income|expense> <amount> [--category C] [--note N] [--payment P]\n  \
         edit <id> <date> <income|expense> <amount> [--category C] [--note N] [--payment P]\n  \
         delete <id>\n  \
         close-day <date>\n  \
         reopen-day <date>\n  \
         missing [--days N]\n  \
         recent [--limit N]\n  \
         change-pin <current> <new> <confirm>\n  \
         export\n  \
         sign-in <access-token> [expires-in-seconds]\n  \
         sign-out\n  \
         version"
    );
}
