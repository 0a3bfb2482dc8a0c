//! mysql-sqlite-migrate CLI - transfer a MySQL/MariaDB database to SQLite.

use clap::{ArgAction, Parser};
use mysql_sqlite_migrate::{
    Collation, Config, MysqlConfig, Orchestrator, SqliteConfig, TransferError, TransferOptions,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// -h and -V are taken by --mysql-host and --vacuum, so the automatic
// help/version shorts are disabled; --help and --version stay.
#[derive(Parser)]
#[command(name = "mysql-sqlite-migrate")]
#[command(about = "Transfer a MySQL/MariaDB database to a SQLite file")]
#[command(version = version_table())]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Output SQLite database file
    #[arg(short = 'f', long)]
    sqlite_file: PathBuf,

    /// Source MySQL database name
    #[arg(short = 'd', long)]
    mysql_database: String,

    /// Source MySQL user
    #[arg(short = 'u', long)]
    mysql_user: String,

    /// MySQL password (prefer -p to avoid the password in shell history)
    #[arg(long)]
    mysql_password: Option<String>,

    /// Prompt for the MySQL password
    #[arg(short = 'p', long)]
    prompt_mysql_password: bool,

    /// MySQL host
    #[arg(short = 'h', long, default_value = "localhost")]
    mysql_host: String,

    /// MySQL port
    #[arg(short = 'P', long, default_value_t = 3306)]
    mysql_port: u16,

    /// MySQL session character set
    #[arg(long, default_value = "utf8mb4")]
    mysql_charset: String,

    /// MySQL session collation
    #[arg(long)]
    mysql_collation: Option<String>,

    /// Disable TLS to the source
    #[arg(short = 'S', long)]
    skip_ssl: bool,

    /// Transfer only these tables (space separated). Implies
    /// --without-foreign-keys. Cannot be combined with
    /// --exclude-mysql-tables.
    #[arg(short = 't', long, num_args = 1..)]
    mysql_tables: Vec<String>,

    /// Transfer all tables except these (space separated). Implies
    /// --without-foreign-keys. Cannot be combined with --mysql-tables.
    #[arg(short = 'e', long, num_args = 1..)]
    exclude_mysql_tables: Vec<String>,

    /// Materialize views as regular tables
    #[arg(short = 'T', long)]
    mysql_views_as_tables: bool,

    /// Transfer only this many rows from each table
    #[arg(short = 'L', long)]
    limit_rows: Option<u64>,

    /// Collating sequence for TEXT-affine columns
    #[arg(short = 'C', long, default_value_t = Collation::Binary)]
    collation: Collation,

    /// Prefix index names with their table name
    #[arg(short = 'K', long)]
    prefix_indices: bool,

    /// Do not transfer foreign keys
    #[arg(short = 'X', long)]
    without_foreign_keys: bool,

    /// Do not create tables, transfer data only
    #[arg(short = 'Z', long)]
    without_tables: bool,

    /// Do not transfer data, create tables only
    #[arg(short = 'W', long)]
    without_data: bool,

    /// Create STRICT tables when the SQLite build supports them
    #[arg(short = 'M', long)]
    strict: bool,

    /// Read and write rows in chunks of this size
    #[arg(short = 'c', long)]
    chunk: Option<usize>,

    /// Transfer JSON columns as TEXT
    #[arg(long)]
    json_as_text: bool,

    /// Run VACUUM on the output file after the transfer
    #[arg(short = 'V', long)]
    vacuum: bool,

    /// Buffer whole MySQL resultsets client-side instead of streaming
    #[arg(long)]
    use_buffered_cursors: bool,

    /// Log file
    #[arg(short = 'l', long)]
    log_file: Option<PathBuf>,

    /// Quiet: display errors only
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Print the full error chain on failure
    #[arg(long)]
    debug: bool,

    /// Print help
    #[arg(long = "help", action = ArgAction::Help)]
    _help: Option<bool>,

    /// Print engine and dependency versions
    #[arg(long = "version", action = ArgAction::Version)]
    _version: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let debug = cli.debug;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if debug {
                eprintln!("{}", e.format_detailed());
            } else {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), TransferError> {
    setup_logging(cli.quiet, cli.debug, cli.log_file.as_deref())?;

    let password = if cli.mysql_password.is_none() && cli.prompt_mysql_password {
        Some(
            rpassword::prompt_password("MySQL password: ")
                .map_err(|e| TransferError::Config(format!("could not read password: {}", e)))?,
        )
    } else {
        cli.mysql_password
    };

    let config = Config {
        mysql: MysqlConfig {
            host: cli.mysql_host,
            port: cli.mysql_port,
            database: cli.mysql_database,
            user: cli.mysql_user,
            password,
            charset: cli.mysql_charset,
            collation: cli.mysql_collation,
            ssl_disabled: cli.skip_ssl,
        },
        sqlite: SqliteConfig {
            file: cli.sqlite_file,
        },
        options: TransferOptions {
            tables: cli.mysql_tables,
            exclude_tables: cli.exclude_mysql_tables,
            limit_rows: cli.limit_rows,
            collation: cli.collation,
            prefix_indices: cli.prefix_indices,
            without_foreign_keys: cli.without_foreign_keys,
            without_tables: cli.without_tables,
            without_data: cli.without_data,
            views_as_tables: cli.mysql_views_as_tables,
            strict: cli.strict,
            json_as_text: cli.json_as_text,
            chunk_size: cli.chunk,
            buffered: cli.use_buffered_cursors,
            vacuum: cli.vacuum,
            quiet: cli.quiet,
        },
    };

    let orchestrator = Orchestrator::new(config)?;

    // Dropping the run future on Ctrl-C unwinds its scope guards, which
    // re-enables foreign-key enforcement before the connections close.
    let result = tokio::select! {
        result = orchestrator.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted. Exiting...");
            return Err(TransferError::Interrupted);
        }
    };

    if !cli.quiet {
        println!("\nTransfer completed!");
        println!("  Duration: {:.2}s", result.duration_seconds);
        println!("  Tables: {}/{}", result.tables_done, result.tables_total);
        println!("  Rows: {}", result.rows_transferred);
    }

    Ok(())
}

fn setup_logging(
    quiet: bool,
    debug: bool,
    log_file: Option<&std::path::Path>,
) -> Result<(), TransferError> {
    let level = if debug {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = fmt::layer().with_target(false);
    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}

/// Two-column version table: the engine and what it links against.
fn version_table() -> &'static str {
    Box::leak(format!(
        "{engine}\n\n\
         | software             | version |\n\
         |----------------------|---------|\n\
         | mysql-sqlite-migrate | {engine} |\n\
         | sqlite               | {sqlite} |\n\
         | os                   | {os} {arch} |",
        engine = env!("CARGO_PKG_VERSION"),
        sqlite = rusqlite::version(),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
    )
    .into_boxed_str())
}
