//! FX CLI
//!
//! Command-line client for the exchange server and the reference rate feed.

mod config;
mod shell;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use exchange_rates::{CurrencyCode, list_currencies};
use fx_feed::HttpRateFeed;
use fx_session::{RateRefreshService, SessionController, TcpTransport};
use fx_types::{Amount, Intent, RateFeedState};

use config::Config;
use shell::ShellCommand;

type Session = SessionController<TcpTransport>;

#[derive(Parser)]
#[command(name = "fx")]
#[command(author, version, about = "Currency exchange client", long_about = None)]
struct Cli {
    /// Exchange server address (host:port)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Base URL of the reference rate feed
    #[arg(long, global = true)]
    feed_url: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "FX_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported currencies
    Currencies {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the server and show remaining attempts
    Connect,
    /// Ask the server for an exchange rate
    Rate {
        from: CurrencyCode,
        to: CurrencyCode,
    },
    /// Convert an amount on the server
    Convert {
        amount: Amount,
        from: CurrencyCode,
        to: CurrencyCode,
    },
    /// Follow the reference rate feed until interrupted
    Watch {
        /// Currency to display
        #[arg(long, default_value = "EUR")]
        to: CurrencyCode,
    },
    /// Interactive session
    Shell {
        /// Initially selected currency
        #[arg(long, default_value = "EUR")]
        to: CurrencyCode,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,fx_cli=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = Config::from_env()?;
    if let Some(server) = cli.server {
        config.server_addr = server;
    }
    if let Some(feed_url) = cli.feed_url {
        config.feed_url = feed_url;
    }
    tracing::debug!("Using server {} and feed {}", config.server_addr, config.feed_url);

    match cli.command {
        Commands::Currencies { json } => print_currencies(json)?,

        Commands::Connect => {
            let result = session(&config).connect().await;
            let status = shell::connect_status(&result);
            println!("{}", status);
            if !status.is_connected() {
                std::process::exit(1);
            }
            println!("{}", result?);
        }

        Commands::Rate { from, to } => {
            let reply = session(&config).execute(Intent::rate(from, to)).await?;
            println!("{}", reply);
        }

        Commands::Convert { amount, from, to } => {
            let reply = session(&config)
                .execute(Intent::convert(amount, from, to))
                .await?;
            println!("{}", reply);
        }

        Commands::Watch { to } => watch(&config, to).await,

        Commands::Shell { to } => run_shell(&config, to).await?,
    }

    Ok(())
}

fn session(config: &Config) -> Session {
    SessionController::new(TcpTransport::new(config.transport()), config.session())
}

fn refresh_service(config: &Config) -> RateRefreshService<HttpRateFeed> {
    let feed = HttpRateFeed::with_timeout(&config.feed_url, config.feed_timeout);
    RateRefreshService::new(feed, config.refresh())
}

fn print_currencies(json: bool) -> Result<()> {
    if json {
        let list: Vec<_> = list_currencies()
            .iter()
            .map(|c| {
                serde_json::json!({
                    "code": c.code,
                    "name": c.code.display_name(),
                    "icon": c.display_icon_ref,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        for c in list_currencies() {
            println!(
                "{}  {:<20} {}",
                c.code,
                c.code.display_name(),
                c.display_icon_ref
            );
        }
    }
    Ok(())
}

async fn watch(config: &Config, selected: CurrencyCode) {
    let handle = refresh_service(config).spawn();
    let mut updates = handle.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", updates.borrow_and_update().display_line(selected));
            }
        }
    }

    handle.stop().await;
}

async fn run_shell(config: &Config, mut selected: CurrencyCode) -> Result<()> {
    let session = session(config);
    let handle = refresh_service(config).spawn();
    let mut updates = handle.subscribe();
    let mut feed_open = true;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Server {} (type 'help' for commands)", config.server_addr);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed(), if feed_open => {
                if changed.is_err() {
                    feed_open = false;
                    continue;
                }
                println!("[feed] {}", updates.borrow_and_update().display_line(selected));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match shell::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        println!("{:#}", e);
                        continue;
                    }
                };
                match command {
                    ShellCommand::Quit => break,
                    ShellCommand::Help => println!("{}", shell::HELP),
                    ShellCommand::Currencies => print_currencies(false)?,
                    ShellCommand::Status => println!("{}", session.block_status()),
                    ShellCommand::Feed => print_feed(&handle.latest(), selected),
                    ShellCommand::Select(code) => {
                        selected = code;
                        print_feed(&handle.latest(), selected);
                    }
                    ShellCommand::Connect => {
                        let result = session.connect().await;
                        let status = shell::connect_status(&result);
                        println!("{}", status);
                        if status.is_connected() {
                            print_reply(result);
                        }
                    }
                    ShellCommand::Send(intent) => print_reply(session.execute(intent).await),
                }
            }
        }
    }

    handle.stop().await;
    Ok(())
}

fn print_reply(result: Result<String, fx_types::SessionError>) {
    match result {
        Ok(reply) => println!("{}", reply),
        Err(e) => println!("{}", e),
    }
}

fn print_feed(state: &RateFeedState, selected: CurrencyCode) {
    println!("{}", state.display_line(selected));
}
