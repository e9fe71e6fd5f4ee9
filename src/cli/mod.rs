pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "counsel")]
#[command(about = "Counsel CLI - development tooling for the Counsel API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Mint a JWT signed with the configured secret")]
    Token(commands::token::TokenArgs),

    #[command(about = "Show the resource registry")]
    Resources {
        #[arg(help = "Only show this resource segment, e.g. leave-requests")]
        segment: Option<String>,
    },

    #[command(about = "Print the effective configuration")]
    Config,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token(args) => commands::token::handle(args, output_format),
        Commands::Resources { segment } => commands::resources::handle(segment.as_deref(), output_format),
        Commands::Config => commands::config::handle(output_format),
    }
}
