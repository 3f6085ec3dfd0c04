use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::Colorize;
use gpctl::commands::{self, LoadArgs, QueryArgs};
use gpctl::config::{Session, Settings};
use gpctl::db::PgConnector;
use gpctl::prompt::{PASSWORD_MESSAGE, Prompter, TerminalPrompter};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gpctl")]
#[command(about = "A tool for interacting with Greenplum", long_about = None)]
struct Cli {
    /// Config file (default is $HOME/.gpctl)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the connection to Greenplum is set up properly
    TestConn,
    /// Bulk load a CSV file into a table
    Load {
        /// The CSV file to load
        #[arg(short, long)]
        file: PathBuf,
        /// The table to load data into, formatted <schema>.<table>, e.g. perf_cap.quotes_daily
        #[arg(short, long)]
        table: String,
        /// Truncate the table before loading the file
        #[arg(long)]
        truncate: bool,
    },
    /// Send a query to Greenplum and write the results to a file or stdout
    Query {
        /// The SQL file to run
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Where to save the results as CSV. If not provided, results are printed to stdout
        #[arg(short = 'o', long = "outputLocation")]
        output_location: Option<PathBuf>,
        /// Inline SQL statement (not used yet, use --file)
        #[arg(long)]
        query: Option<String>,
    },
    /// Generate shell completions
    Completions {
        /// Shell type for completions
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.to_string().bright_red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Some(Commands::Completions { shell }) => generate_completions(shell),
        None => {
            start_session(config, &TerminalPrompter)?;
            println!("Welcome to gpctl!");
        }
        Some(Commands::TestConn) => {
            let session = start_session(config, &TerminalPrompter)?;
            commands::test_conn::run(&session, &PgConnector).await?;
        }
        Some(Commands::Load {
            file,
            table,
            truncate,
        }) => {
            let session = start_session(config, &TerminalPrompter)?;
            let args = LoadArgs {
                file,
                table,
                truncate,
            };
            commands::load::run(&args, &session, &PgConnector, &TerminalPrompter).await?;
        }
        Some(Commands::Query {
            file,
            output_location,
            query,
        }) => {
            let session = start_session(config, &TerminalPrompter)?;
            let args = QueryArgs {
                file,
                output: output_location,
                query,
            };
            commands::query::run(&args, &session, &PgConnector).await?;
        }
    }

    Ok(())
}

// Loads the settings and asks for the password; runs before every command.
fn start_session(config: Option<&Path>, prompter: &impl Prompter) -> Result<Session> {
    let (settings, file) = Settings::load(config)?;
    if let Some(path) = file.filter(|p| p.is_file()) {
        println!("Using config file: {}", path.display());
    }

    let password = prompter.password(PASSWORD_MESSAGE)?;
    Ok(Session::new(&settings, password)?)
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
