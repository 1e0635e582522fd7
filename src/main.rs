//! CLI entry point for `planemail`.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use planemail::accounts::AccountStore;
use planemail::aggregate::Aggregator;
use planemail::config::{self, Config};
use planemail::export::{self, Destination, ExportFormat};
use planemail::extract::{AirportTable, FlightExtractor};
use planemail::mailbox::{self, Mailbox};
use planemail::model::account::{Account, Credential};
use planemail::parser::body::decode_body;
use planemail::query::{DateRange, SearchQuery, SubjectFilter};
use planemail::scan::{self, Scanner};

/// Find flight confirmations in your mailboxes and export a flight log.
#[derive(Parser)]
#[command(name = "planemail", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan accounts for flights and export them
    Scan {
        /// Only these accounts (comma-separated emails); default all
        #[arg(short, long, value_delimiter = ',')]
        accounts: Vec<String>,
        /// Date range "YYYY-MM-DD YYYY-MM-DD"
        #[arg(short, long, value_name = "START END")]
        range: Option<String>,
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,
        #[arg(short, long, value_enum)]
        destination: Option<Destination>,
        /// Directory for exported files
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop at the first account that fails instead of skipping it
        #[arg(long)]
        fail_fast: bool,
    },
    /// Show one message by id or subject, with its decoded bodies
    Inspect {
        /// Message id, or a subject to search for (oldest match wins)
        needle: String,
        #[arg(short, long, value_delimiter = ',')]
        accounts: Vec<String>,
    },
    /// Manage accounts
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },
    /// Show or initialise the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Subcommand)]
enum AccountsAction {
    /// List configured accounts
    List,
    /// Add (or replace) a Gmail account
    AddGmail {
        email: String,
        /// OAuth access token with the gmail.readonly scope
        #[arg(long, env = "PLANEMAIL_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// Add (or replace) a local MBOX archive
    AddMbox { email: String, path: PathBuf },
    /// Remove an account
    Remove { email: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config, accounts and log file locations
    Path,
    /// Write the default configuration (does not overwrite)
    Init,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Scan {
            accounts,
            range,
            format,
            destination,
            output,
            fail_fast,
        } => cmd_scan(
            &config,
            &accounts,
            range.as_deref(),
            format.unwrap_or(config.export.format),
            destination.unwrap_or(config.export.destination),
            output.or_else(|| config.export.output_dir.clone()),
            fail_fast,
        ),
        Commands::Inspect { needle, accounts } => cmd_inspect(&config, &needle, &accounts),
        Commands::Accounts { action } => cmd_accounts(&config, action),
        Commands::Config { action } => cmd_config(&config, action),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_file = config::log_file_path(config);
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_name = log_file.file_name().unwrap_or_default();
        let file_appender = tracing_appender::rolling::never(&log_dir, file_name);
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn load_accounts(config: &Config, selection: &[String]) -> anyhow::Result<Vec<Account>> {
    let store = AccountStore::load(config::accounts_file_path(config))?;
    let accounts = store.select(selection)?;
    if accounts.is_empty() {
        anyhow::bail!(
            "No accounts configured (add one with `planemail accounts add-gmail` or `add-mbox`)"
        );
    }
    Ok(accounts)
}

fn spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {pos} messages ({elapsed})")
            .expect("valid template"),
    );
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn cmd_scan(
    config: &Config,
    selection: &[String],
    range: Option<&str>,
    format: ExportFormat,
    destination: Destination,
    output: Option<PathBuf>,
    fail_fast: bool,
) -> anyhow::Result<()> {
    let accounts = load_accounts(config, selection)?;
    let range = range.map(DateRange::parse).transpose()?;

    let query = SearchQuery::builder()
        .keywords(config.search.keywords.iter().cloned())
        .travel_category(config.search.travel_category)
        .date_range(range.map(|r| r.to_string()).as_deref())
        .build();
    info!(query = %query, "Search query");

    let custom_airports;
    let airports = match &config.extract.airports_file {
        Some(path) => {
            custom_airports = AirportTable::from_csv_path(path)?.merged_with(AirportTable::builtin())?;
            &custom_airports
        }
        None => AirportTable::builtin(),
    };
    let extractor = FlightExtractor::new(airports);
    let filter = SubjectFilter::new(&config.search.subject_blacklist);
    let scanner = Scanner::new(&extractor, &filter, config.search.page_size);

    let mut aggregator = Aggregator::new();
    for account in &accounts {
        info!(account = %account.email, kind = account.kind(), "Scanning account");
        let pb = spinner(&account.email);
        let result = mailbox::open(account, config).and_then(|mut mb| {
            scanner.scan(mb.as_mut(), &query, Some(&|n| pb.set_position(n)))
        });
        pb.finish_and_clear();

        match result {
            Ok(records) => {
                info!(account = %account.email, records = records.len(), "Account scanned");
                aggregator.ingest(&account.email, records);
            }
            Err(e) if fail_fast => {
                return Err(e).with_context(|| format!("Scanning {}", account.email));
            }
            Err(e) => {
                warn!(account = %account.email, error = %e, "Scan failed, skipping account");
                eprintln!("Skipping {}: {e}", account.email);
            }
        }
    }

    let entities = aggregator.into_entities();
    info!(flights = entities.len(), "Aggregation complete");

    let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
    let mut stdout = std::io::stdout().lock();
    if let Some(path) = export::export(&entities, format, destination, &output_dir, &mut stdout)? {
        eprintln!("Data saved to {}", path.display());
    }
    Ok(())
}

fn cmd_inspect(config: &Config, needle: &str, selection: &[String]) -> anyhow::Result<()> {
    let accounts = load_accounts(config, selection)?;

    let mut opened: Vec<(String, Box<dyn Mailbox>)> = Vec::new();
    for account in &accounts {
        match mailbox::open(account, config) {
            Ok(mb) => opened.push((account.email.clone(), mb)),
            Err(e) => warn!(account = %account.email, error = %e, "Could not open mailbox"),
        }
    }

    let found = scan::find_message(
        opened
            .iter_mut()
            .map(|(label, mb)| (label.clone(), mb.as_mut() as &mut dyn Mailbox)),
        needle,
        config.search.page_size,
    )?;

    let Some((account, message)) = found else {
        anyhow::bail!("No message matching '{needle}' in any account");
    };

    let body = decode_body(message.payload.as_ref());
    let mut out = std::io::stdout().lock();
    writeln!(out, "Account: {account}")?;
    writeln!(out, "Id: {}", message.id)?;
    writeln!(out, "From: {}", message.header("From").unwrap_or(""))?;
    writeln!(out, "To: {}", message.header("To").unwrap_or(""))?;
    writeln!(out, "Subject: {}", message.subject())?;
    writeln!(out, "\n--- Raw text/plain data ---\n{}", body.raw_plain.as_deref().unwrap_or(""))?;
    writeln!(out, "\n--- Plain text ---\n{}", body.plain.as_deref().unwrap_or("(none)"))?;
    writeln!(out, "\n--- HTML ---\n{}", body.html.as_deref().unwrap_or("(none)"))?;
    Ok(())
}

fn cmd_accounts(config: &Config, action: AccountsAction) -> anyhow::Result<()> {
    let mut store = AccountStore::load(config::accounts_file_path(config))?;

    match action {
        AccountsAction::List => {
            if store.accounts().is_empty() {
                println!("No accounts configured ({})", store.path().display());
            }
            for account in store.accounts() {
                match &account.credential {
                    Credential::Gmail { .. } => println!("{}\tgmail", account.email),
                    Credential::Mbox { path } => {
                        println!("{}\tmbox\t{}", account.email, path.display())
                    }
                }
            }
            return Ok(());
        }
        AccountsAction::AddGmail { email, token } => {
            store.add(Account::gmail(&email, token));
            println!("Account for {email} added successfully.");
        }
        AccountsAction::AddMbox { email, path } => {
            if !path.is_file() {
                anyhow::bail!("MBOX file not found: {}", path.display());
            }
            store.add(Account::mbox(&email, path));
            println!("Account for {email} added successfully.");
        }
        AccountsAction::Remove { email } => {
            if !store.remove(&email) {
                anyhow::bail!("No account named '{email}'");
            }
            println!("Account {email} removed.");
        }
    }

    store.save()?;
    Ok(())
}

fn cmd_config(config: &Config, action: ConfigAction) -> anyhow::Result<()> {
    let path = config::config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    match action {
        ConfigAction::Path => {
            println!("config:   {}", path.display());
            println!("accounts: {}", config::accounts_file_path(config).display());
            println!("log:      {}", config::log_file_path(config).display());
        }
        ConfigAction::Init => {
            if path.exists() {
                anyhow::bail!("Config already exists: {}", path.display());
            }
            config::save_config(&Config::default())?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "planemail", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::stdout().write_all(&buf)?;
    Ok(())
}
