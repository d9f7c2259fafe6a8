use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_CONFIG: &str = "errata.toml";

/// errata demo service
#[derive(Debug, Parser)]
#[command(name = "errata", about = "JSON error responses for fallible HTTP handlers")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ERRATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long, env = "ERRATA_LISTEN")]
    pub listen: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from(["errata", "-c", "/etc/errata.toml", "--listen", "127.0.0.1:8080"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/errata.toml")));
        assert_eq!(args.listen, Some(SocketAddr::from(([127, 0, 0, 1], 8080))));
    }

    #[test]
    fn invalid_listen_address_rejected() {
        assert!(Args::try_parse_from(["errata", "--listen", "localhost"]).is_err());
    }
}
