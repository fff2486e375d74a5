use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// Inferencia inference gateway
#[derive(Debug, Parser)]
#[command(name = "inferencia", about = "OpenAI-compatible gateway for local inference servers")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "./inferencia.toml", env = "INFERENCIA_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "INFERENCIA_LISTEN")]
    pub listen: Option<SocketAddr>,
}
