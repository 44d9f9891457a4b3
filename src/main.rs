use std::io::IsTerminal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gptchat::connector::adapter::web;
use gptchat::connector::api::controller::ChatController;
use gptchat::connector::api::{Container, ContainerConfig, Router};
use gptchat::Commands;

#[derive(Parser)]
#[command(name = "gptchat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API key for terminal commands (falls back to OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Provider base URL (falls back to OPENAI_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Default model (falls back to OPENAI_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Answer locally with an echo client instead of calling a provider
    #[arg(long, global = true)]
    mock: bool,

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
    // Replies go to stdout; keep logs off it.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(ContainerConfig {
        api_key: cli.api_key,
        base_url: cli.base_url,
        model: cli.model,
        timeout_secs: cli.timeout_secs,
        mock: cli.mock,
    })?;

    match cli.command {
        Commands::Chat => {
            let interactive = std::io::stdin().is_terminal();
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut output = std::io::stdout();
            ChatController::new(&container)
                .run(input, &mut output, interactive)
                .await?;
        }
        Commands::Serve { port, public } => {
            let ip = if public {
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            } else {
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            };
            info!(
                "Serving chat with {} at {}",
                container.model(),
                container.base_url()
            );
            web::serve(container.web_state(), SocketAddr::new(ip, port)).await?;
        }
        command => {
            let router = Router::new(&container);
            let output = router.route(command).await?;
            println!("{}", output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["gptchat", "ask", "hello", "--mock", "-p", "abc"]).unwrap();

        assert!(cli.mock);
        match cli.command {
            Commands::Ask {
                text,
                parent_message_id,
            } => {
                assert_eq!(text, "hello");
                assert_eq!(parent_message_id.as_deref(), Some("abc"));
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn serve_defaults_to_port_3000() {
        let cli = Cli::try_parse_from(["gptchat", "serve"]).unwrap();

        assert!(matches!(
            cli.command,
            Commands::Serve {
                port: 3000,
                public: false
            }
        ));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["gptchat", "index", "."]).is_err());
    }
}
