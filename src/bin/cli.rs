//! AniDB UDP CLI
//!
//! Command-line interface for poking the AniDB UDP API.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use anidb_udp::protocol::commands;
use anidb_udp::{Client, CommandResult, Config, Result};

/// AniDB UDP CLI
#[derive(Parser, Debug)]
#[command(name = "anidb-cli")]
#[command(about = "CLI for the AniDB UDP API")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(short, long, default_value = "api.anidb.net")]
    server: String,

    /// Server port
    #[arg(short, long, default_value = "9000")]
    port: u16,

    /// Local UDP port to bind
    #[arg(short, long, default_value = "9000")]
    local_port: u16,

    /// API key (needed for --encrypt)
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping {
        /// Ask the server to report our public port
        #[arg(long)]
        nat: bool,
    },

    /// Log in, report the outcome, then log out
    Auth {
        /// Account name
        #[arg(short, long)]
        user: String,

        /// Account password
        #[arg(short = 'P', long)]
        pass: String,

        /// Enable encryption before logging in
        #[arg(long)]
        encrypt: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,anidb_udp=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("anidb-cli v{}", anidb_udp::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder()
        .server_host(&args.server)
        .server_port(args.port)
        .local_port(args.local_port)
        .build();

    let client = Client::new(config);
    if let Some(api_key) = &args.api_key {
        client.set_api_key(api_key.as_str())?;
    }
    client.connect_default()?;

    match args.command {
        Commands::Ping { nat } => {
            let mut ping = commands::ping();
            if nat {
                ping.set_optional("nat", "1")?;
            }
            print_result("PING", &client.send(ping)?);
        }
        Commands::Auth {
            user,
            pass,
            encrypt,
        } => {
            if encrypt {
                print_result("ENCRYPT", &client.send(commands::encrypt(&user))?);
            }
            let auth = commands::auth(client.config(), &user, &pass);
            print_result("AUTH", &client.send(auth)?);
            if client.session().is_logged_in() {
                print_result("LOGOUT", &client.send(commands::logout())?);
            }
        }
    }

    client.disconnect();
    Ok(())
}

fn print_result(command: &str, result: &CommandResult) {
    match result {
        CommandResult::Generic {
            code,
            data: Some(data),
        } => println!("{}: {} {}", command, code, data),
        CommandResult::Auth {
            code,
            session_key: Some(_),
        } => println!("{}: {} (session started)", command, code),
        CommandResult::Encrypt {
            code,
            salt: Some(_),
        } => println!("{}: {} (encryption enabled)", command, code),
        other => println!("{}: {}", command, other.return_code()),
    }
}
