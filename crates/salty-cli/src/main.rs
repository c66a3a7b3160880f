//! Salty CLI tools: key generation, key inspection, relay handshake probe.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use salty_client::Connector;
use salty_common::{ClientConfig, LogConfig};
use salty_core::PeerStatus;
use salty_crypto::{KeyPair, Role};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "salty")]
#[command(about = "Salty signaling tools")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Initiator,
    Responder,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Initiator => Role::Initiator,
            RoleArg::Responder => Role::Responder,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new permanent key pair
    Keygen {
        /// Output file for the hex secret key
        #[arg(short, long, default_value = "salty.key")]
        output: PathBuf,
    },

    /// Print the public key (the relay path component) of a key file
    ShowKey {
        /// Secret key file
        #[arg(short, long)]
        key: PathBuf,
    },

    /// Connect to a relay and run the handshake once
    Probe {
        /// JSON client configuration
        #[arg(short, long, env = "SALTY_CONFIG")]
        config: Option<PathBuf>,

        /// Relay base URL
        #[arg(short, long, env = "SALTY_URL")]
        url: Option<String>,

        #[arg(short, long, value_enum, default_value = "responder")]
        role: RoleArg,

        /// Permanent key file. A throwaway key is used when omitted.
        #[arg(short, long, env = "SALTY_KEY")]
        key: Option<PathBuf>,

        /// Relay permanent public key (hex)
        #[arg(long, env = "SALTY_SERVER_KEY")]
        server_key: Option<String>,

        /// Send the relay permanent key as `your_key`
        #[arg(long)]
        explicit_permanent_key: bool,

        /// Per-step timeout in milliseconds
        #[arg(long, env = "SALTY_TIMEOUT_MS")]
        timeout_ms: Option<u64>,

        /// Requested ping interval in seconds
        #[arg(long)]
        ping_interval: Option<u32>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Keygen { output } => {
            salty_common::init_tracing(&LogConfig::default());

            let keypair = KeyPair::generate();
            keypair
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;

            println!("Secret key: {}", output.display());
            println!("Public key: {}", keypair.public_key_hex());
        }
        Command::ShowKey { key } => {
            let keypair = KeyPair::load(&key)?;
            println!("{}", keypair.public_key_hex());
        }
        Command::Probe {
            config,
            url,
            role,
            key,
            server_key,
            explicit_permanent_key,
            timeout_ms,
            ping_interval,
        } => {
            let mut config = match config {
                Some(path) => ClientConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => ClientConfig::default(),
            };
            if let Some(url) = url {
                config.url = url;
            }
            if server_key.is_some() {
                config.server_permanent_key = server_key;
            }
            if explicit_permanent_key {
                config.explicit_permanent_key = true;
            }
            if let Some(timeout_ms) = timeout_ms {
                config.timeout_ms = timeout_ms;
            }
            if ping_interval.is_some() {
                config.ping_interval = ping_interval;
            }

            salty_common::init_tracing(&config.log);

            let keypair = match key {
                Some(path) => KeyPair::load(&path)?,
                None => KeyPair::generate(),
            };
            info!(public_key = %keypair.public_key_hex(), "using permanent key");

            let connector = Connector::from_config(role.into(), Arc::new(keypair), &config)?;

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;

            rt.block_on(async {
                let channel = connector.connect(&config.url).await?;
                let session = channel.session();

                println!("Connected to {}", config.url);
                println!("Address:     {}", session.address);
                println!("Relay key:   {}", hex::encode(session.server_session_key));
                match &session.peers {
                    PeerStatus::Responders(responders) => {
                        let list: Vec<String> =
                            responders.iter().map(|a| a.to_string()).collect();
                        println!("Responders:  [{}]", list.join(", "));
                    }
                    PeerStatus::InitiatorConnected(connected) => {
                        let state = if *connected { "connected" } else { "absent" };
                        println!("Initiator:   {state}");
                    }
                }
                println!(
                    "Relay proof: {}",
                    if session.signed_keys_verified {
                        "verified"
                    } else {
                        "not verified (no relay key configured)"
                    }
                );

                channel.close().await?;
                Ok::<(), anyhow::Error>(())
            })?;
        }
        Command::Version => {
            println!("salty {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
