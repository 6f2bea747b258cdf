use clap::{Parser, Subcommand};
use client::game::{load_questions, ClientRole};
use client::network::Client;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// WebSocket URL of the quiz server
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    role: RoleArgs,
}

#[derive(Subcommand, Debug)]
enum RoleArgs {
    /// Run the game as the host
    Host {
        /// JSON file with the questions for each round
        #[arg(short, long)]
        questions: PathBuf,
    },
    /// Join the game as a player
    Player {
        /// Name to join with; the server may add a suffix if it is taken
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let (role, questions) = match args.role {
        RoleArgs::Host { questions } => {
            let questions = load_questions(&questions)?;
            info!("Loaded {} questions", questions.len());
            (ClientRole::Host, questions)
        }
        RoleArgs::Player { name } => (
            ClientRole::Player {
                requested_name: name,
            },
            Vec::new(),
        ),
    };

    let mut client = Client::connect(&args.server, role, questions).await?;
    client.run().await?;

    Ok(())
}
