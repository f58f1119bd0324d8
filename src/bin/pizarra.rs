//! pizarra CLI - Command line client for the pizarra clipboard server
//!
//! Sends and receives ephemeral text and files through a running server.
//! Content is printed to stdout so commands compose with pipes; everything
//! else goes to stderr.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pizarra::client::{
    receive, send_file, send_text, ApiClient, ClientError, ReceiveOptions, Received, SendOptions,
    DEFAULT_CHUNK_SIZE,
};

#[derive(Parser)]
#[command(name = "pizarra")]
#[command(about = "Share ephemeral text and files through a pizarra server")]
#[command(version)]
struct Cli {
    /// Server base URL (e.g. http://localhost:3000)
    #[arg(long, global = true, env = "PIZARRA_API")]
    api: Option<String>,

    /// Verbose logging on stderr (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send text or a file, printing the key to fetch it with
    Send {
        /// Text to send; stdin is read when neither this nor --file is given
        text: Option<String>,

        /// Send a file instead of text
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// TTL in seconds (server defaults apply when omitted)
        #[arg(long)]
        ttl: Option<u64>,

        /// Upload window size in bytes; larger files are chunked
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Receive the entry behind a key
    Receive {
        key: String,

        /// Destination path for file entries
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing destination
        #[arg(long)]
        force: bool,
    },

    /// Delete the entry behind a key
    Delete { key: String },

    /// Reset an entry's TTL
    Touch {
        key: String,

        /// New TTL in seconds (server defaults apply when omitted)
        #[arg(long)]
        ttl: Option<u64>,

        /// The key names a file entry
        #[arg(long)]
        file: bool,
    },

    /// Check that the server is reachable
    Ping,

    /// Flush every entry on the server
    Flush,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_url = cli
        .api
        .as_deref()
        .context("no server configured; pass --api or set PIZARRA_API")?;
    let api = ApiClient::new(base_url)?;

    match cli.command {
        Commands::Send {
            text,
            file,
            ttl,
            chunk_size,
        } => {
            if let Some(path) = file {
                let options = SendOptions { ttl, chunk_size };
                let receipt = send_file(&api, &path, &options).await?;
                if receipt.chunked {
                    eprintln!(
                        "{} ({} bytes in {} chunks)",
                        receipt.name, receipt.size, receipt.chunks
                    );
                } else {
                    eprintln!("{} ({} bytes)", receipt.name, receipt.size);
                }
                println!("{}", receipt.key);
            } else {
                let content = match text {
                    Some(text) => text,
                    None => read_stdin()?,
                };
                if content.is_empty() {
                    anyhow::bail!("nothing to send");
                }
                let stored = send_text(&api, &content, ttl).await?;
                println!("{}", stored.key);
            }
        }

        Commands::Receive { key, output, force } => {
            let options = ReceiveOptions { output, force };
            match receive(&api, &key, &options).await {
                Ok(Received::Text { content, .. }) => println!("{}", content),
                Ok(Received::File { path, size, chunks }) => {
                    eprintln!("{} ({} bytes in {} chunks)", path.display(), size, chunks);
                }
                Err(ClientError::Reassembly { total, failures }) => {
                    eprintln!(
                        "reassembly failed: {} of {} chunks unavailable",
                        failures.len(),
                        total
                    );
                    for failure in &failures {
                        eprintln!(
                            "  chunk {} ({}): {}",
                            failure.index, failure.key, failure.cause
                        );
                    }
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Commands::Delete { key } => {
            match api.delete_message(&key).await {
                Ok(()) => {}
                // File entries are refused on the messages endpoint.
                Err(ClientError::Forbidden { .. }) => api.delete_file(&key).await?,
                Err(err) => return Err(err.into()),
            }
            eprintln!("deleted {}", key);
        }

        Commands::Touch { key, ttl, file } => {
            let stored = if file {
                api.touch_file(&key, ttl).await?
            } else {
                api.touch_message(&key, ttl).await?
            };
            eprintln!("{} expires in {}s", stored.key, stored.ttl);
        }

        Commands::Ping => {
            let status = api.status().await?;
            println!("{} (server v{})", status.ack, status.version);
            if let Some(client) = status.client {
                println!("seen as {}:{}", client.host, client.port);
            }
        }

        Commands::Flush => {
            let flushed = api.flush().await?;
            eprintln!("flushed {} records", flushed);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let directive = match verbose {
        0 => "pizarra=warn",
        1 => "pizarra=info",
        _ => "pizarra=debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| directive.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_stdin() -> anyhow::Result<String> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("failed to read stdin")?;
    Ok(content.trim_end().to_string())
}
