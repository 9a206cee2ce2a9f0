use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

/// Castlefall room server: deals secret words to players over websockets.
#[derive(Debug, Parser)]
#[command(name = "castlefall-server", version, about, long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "CASTLEFALL_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "CASTLEFALL_PORT", default_value_t = 8372)]
    pub port: u16,

    /// Directory of word lists, one word per line
    #[arg(
        short,
        long,
        env = "CASTLEFALL_WORDLISTS",
        default_value = "wordlists",
        value_name = "DIR"
    )]
    pub wordlists: PathBuf,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Level used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
