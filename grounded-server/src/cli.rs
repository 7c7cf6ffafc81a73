use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "grounded",
    about = "Grounded Gateway - cited answers from web search and document stores",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    #[arg(short, long, env = "GROUNDED_CONFIG", help = "Path to a JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "GROUNDED_PORT", help = "Override the configured port")]
    pub port: Option<u16>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_parse() {
        assert!(Cli::try_parse_from(["grounded"]).is_ok());
    }

    #[test]
    fn test_explicit_flags() {
        let cli = Cli::try_parse_from(["grounded", "--config", "/etc/grounded.json", "-p", "9000", "-l", "debug"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/grounded.json")));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["grounded", "--port", "99999"]).is_err());
    }
}
