mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(about = "Declare infrastructure as code, deploy it as a stack", long_about = None)]
#[command(version)]
struct Cli {
    /// Project directory holding stack configuration and state
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the bundled programs
    List,
    /// Print the resource graph a program declares
    Graph {
        /// Program name
        program: String,
        /// Stack name (also read from STACKFLOW_STACK)
        #[arg(short = 's', long = "stack", env = "STACKFLOW_STACK")]
        stack: Option<String>,
    },
    /// Deploy a program to a stack
    Up {
        /// Program name
        program: String,
        /// Stack name (also read from STACKFLOW_STACK)
        #[arg(short = 's', long = "stack", env = "STACKFLOW_STACK")]
        stack: Option<String>,
    },
    /// Show the exports of a deployed stack
    Outputs {
        /// Stack reference: organization/project/stack
        reference: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every resource of a stack
    Destroy {
        /// Program name
        program: String,
        /// Stack name (also read from STACKFLOW_STACK)
        #[arg(short = 's', long = "stack", env = "STACKFLOW_STACK")]
        stack: Option<String>,
        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `graph` and `outputs --json` stay pipeable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match cli.command {
        Commands::List => commands::list::handle(),
        Commands::Graph { program, stack } => {
            commands::graph::handle(&cli.root, &program, stack)?;
        }
        Commands::Up { program, stack } => {
            commands::up::handle(&cli.root, &program, stack).await?;
        }
        Commands::Outputs { reference, json } => {
            commands::outputs::handle(&cli.root, &reference, json).await?;
        }
        Commands::Destroy {
            program,
            stack,
            yes,
        } => {
            commands::destroy::handle(&cli.root, &program, stack, yes).await?;
        }
    }

    Ok(())
}
