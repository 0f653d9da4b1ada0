//!
//! interlink CLI - Operator access to the interlink core
//!
//! Commands:
//! - interlink query <sql>: Run a statement and print its materialized rows
//! - interlink exec <sql>: Run a statement and print the affected row count
//! - interlink users list|get|add|delete: Manage user records
//!
//! The database target comes from `--target`, else from `interlink.toml`
//! (given with `--config` or discovered from the working directory).
//!

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use interlink::{
    Connector, HandleRegistry, InterlinkConfig, InterlinkError, MaterializedResult, UserStore,
};

#[derive(Parser)]
#[command(name = "interlink")]
#[command(author, version, about = "Handle-based database bridge", long_about = None)]
struct Cli {
    /// Path to interlink.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database target, overrides the config file
    #[arg(long, global = true)]
    target: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print the result
    Query {
        /// SQL text
        sql: String,

        /// Print rows as JSON records instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Run a statement and print the affected row count
    Exec {
        /// SQL text
        sql: String,
    },

    /// Manage user records
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users, optionally one page at a time
    List {
        #[arg(long)]
        page_size: Option<u32>,

        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show one user
    Get { id: i64 },

    /// Create a user
    Add { username: String, email: String },

    /// Delete a user
    Delete { id: i64 },
}

fn main() {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(target) = cli.target {
        config.database.target = target;
    }

    init_logging(&config, cli.verbose);

    let registry = Arc::new(HandleRegistry::new());
    let connector = Connector::new(
        config.database.target.clone(),
        Arc::new(config.sqlite_driver()),
        Arc::clone(&registry),
    );

    let outcome = connector
        .connect()
        .and_then(|_| run_command(&connector, cli.command));
    let closed = connector.close();
    registry.shutdown();

    if let Err(e) = outcome.and(closed) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<InterlinkConfig, InterlinkError> {
    if let Some(path) = explicit {
        return InterlinkConfig::load(path);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match InterlinkConfig::discover(&cwd) {
        Some(path) => InterlinkConfig::load(&path),
        None => Ok(InterlinkConfig::default()),
    }
}

fn init_logging(config: &InterlinkConfig, verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(tracing::Level::INFO)
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn run_command(connector: &Connector, command: Commands) -> Result<(), InterlinkError> {
    match command {
        Commands::Query { sql, json } => {
            let result = connector.query(&sql, &[])?;
            if json {
                print_json(&result.to_records());
            } else {
                print_table(&result);
            }
            result.close();
        }
        Commands::Exec { sql } => {
            let affected = connector.execute(&sql, &[])?;
            println!("{} row(s) affected", affected);
        }
        Commands::Users { action } => {
            let store = UserStore::new(connector.connection_ref());
            store.ensure_schema()?;
            run_user_action(&store, action)?;
        }
    }
    Ok(())
}

fn run_user_action(store: &UserStore, action: UserAction) -> Result<(), InterlinkError> {
    match action {
        UserAction::List { page_size, page } => {
            let users = match page_size {
                Some(size) => store.list_page(size, page)?,
                None => store.list()?,
            };
            print_json(&users);
        }
        UserAction::Get { id } => {
            print_json(&store.get(id)?);
        }
        UserAction::Add { username, email } => {
            print_json(&store.create(&username, &email)?);
        }
        UserAction::Delete { id } => {
            if store.delete(id)? == 0 {
                return Err(InterlinkError::UserNotFound { id });
            }
            println!("deleted user {}", id);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Error encoding JSON: {}", e),
    }
}

fn print_table(result: &MaterializedResult) {
    println!("{}", result.column_names().join("\t"));
    for row in result.rows() {
        println!("{}", row.join("\t"));
    }
    eprintln!("({} row(s))", result.row_count());
}
