use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use chatrelay::connector::api::{self, Container, ContainerConfig};
use chatrelay::connector::terminal;
use chatrelay::{ClientArgs, Commands, ConversationController, HttpChatTransport, ModelCatalog};

#[derive(Parser)]
#[command(name = "chatrelay")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            mock_upstream,
        } => {
            let container = Arc::new(Container::new(ContainerConfig::from_env(mock_upstream)));
            api::serve(container, SocketAddr::new(host, port)).await?;
        }

        Commands::Chat { client } => {
            terminal::run_interactive(controller(&client)).await?;
        }

        Commands::Ask { prompt, client } => {
            terminal::run_single(controller(&client), &prompt).await?;
        }

        Commands::Models => {
            let catalog = ModelCatalog::default();
            println!("Available models:\n");
            for entry in catalog.entries() {
                println!("  {:<10} {}", entry.alias, entry.upstream_id);
                if !entry.fallbacks.is_empty() {
                    println!("  {:<10} fallbacks: {}", "", entry.fallbacks.join(", "));
                }
            }
        }
    }

    Ok(())
}

fn controller(args: &ClientArgs) -> ConversationController {
    let transport = Arc::new(HttpChatTransport::new(&args.url));
    ConversationController::new(transport, &args.model)
        .with_timeout(Duration::from_secs(args.timeout_secs))
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn client_defaults() {
        let cli = Cli::try_parse_from(["chatrelay", "ask", "hello"]).unwrap();
        match cli.command {
            Commands::Ask { prompt, client } => {
                assert_eq!(prompt, "hello");
                assert_eq!(client.model, "mistral");
                assert_eq!(client.timeout_secs, 60);
                assert_eq!(client.url, "http://127.0.0.1:3000/api/chat");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn serve_rejects_bad_host() {
        let res = Cli::try_parse_from(["chatrelay", "serve", "--host", "not-an-ip"]);
        assert!(res.is_err());
    }
}
