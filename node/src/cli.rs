//! # CLI Interface
//!
//! Defines the command-line argument structure for `willvault-node` using
//! `clap` derive. Subcommands: `run`, `init`, `commit`, `sign`, `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use willvault_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};

/// WillVault vault host.
///
/// Serves one guardian-threshold vault over HTTP: the owner locks a document
/// commitment, guardians confirm release, and observers follow along over a
/// WebSocket or scrape Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "willvault-node",
    about = "WillVault guardian-threshold vault host",
    version,
    propagate_version = true
)]
pub struct WillVaultCli {
    /// Log output format: "pretty" or "json".
    #[arg(
        long,
        global = true,
        env = "WILLVAULT_LOG_FORMAT",
        default_value = "pretty"
    )]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a genesis file and serve the vault.
    Run(RunArgs),
    /// Generate owner and guardian keys plus a matching genesis file.
    Init(InitArgs),
    /// Print the commitment of a document.
    Commit(CommitArgs),
    /// Produce a signed call for `POST /lock` or `POST /confirm`.
    Sign(SignArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the genesis file (JSON).
    #[arg(long, short = 'g', env = "WILLVAULT_GENESIS", default_value = "genesis.json")]
    pub genesis: PathBuf,

    /// Port for the REST and WebSocket API.
    #[arg(long, env = "WILLVAULT_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "WILLVAULT_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}

/// Most guardian keys `init` will generate in one run.
pub const MAX_INIT_GUARDIANS: u32 = 256;

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Directory that receives the key files and `genesis.json`.
    #[arg(long, short = 'd', default_value = "willvault")]
    pub dir: PathBuf,

    /// Number of guardian keys to generate, at most 256.
    #[arg(
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..=MAX_INIT_GUARDIANS as i64)
    )]
    pub guardians: u32,

    /// Confirmations required for release. Must not exceed `--guardians`.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub threshold: u32,

    /// Replace existing files in `dir`.
    #[arg(long)]
    pub force: bool,
}

/// Hash function used for a document commitment.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitScheme {
    /// Domain-separated BLAKE3. The default.
    Blake3,
    /// Plain SHA-256, for stores that content-address with it.
    Sha256,
}

/// Arguments for the `commit` subcommand.
#[derive(Parser, Debug)]
pub struct CommitArgs {
    /// The (already encrypted) document to commit to.
    pub file: PathBuf,

    /// Commitment scheme.
    #[arg(long, value_enum, default_value_t = CommitScheme::Blake3)]
    pub scheme: CommitScheme,
}

/// Arguments for the `sign` subcommand.
#[derive(Parser, Debug)]
pub struct SignArgs {
    /// File holding the signer's hex-encoded secret key.
    #[arg(long, short = 'k')]
    pub key: PathBuf,

    /// Genesis file the vault id is read from.
    #[arg(long, short = 'g', env = "WILLVAULT_GENESIS", default_value = "genesis.json")]
    pub genesis: PathBuf,

    /// Vault id to sign for. Overrides the genesis file.
    #[arg(long)]
    pub vault_id: Option<String>,

    /// The call to sign.
    #[command(subcommand)]
    pub call: SignCall,
}

/// Calls that can be signed.
#[derive(Subcommand, Debug)]
pub enum SignCall {
    /// Lock the vault to a commitment. Owner only.
    Lock {
        /// Commitment to lock, as printed by `commit`.
        #[arg(long)]
        data_hash: String,
    },
    /// Confirm release. Guardians only.
    Confirm,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        WillVaultCli::command().debug_assert();
    }

    #[test]
    fn parses_sign_lock() {
        let cli = WillVaultCli::try_parse_from([
            "willvault-node",
            "sign",
            "--key",
            "owner.key",
            "--vault-id",
            "v1",
            "lock",
            "--data-hash",
            "0xabc",
        ])
        .unwrap();
        match cli.command {
            Commands::Sign(args) => {
                assert_eq!(args.vault_id.as_deref(), Some("v1"));
                assert!(matches!(args.call, SignCall::Lock { ref data_hash } if data_hash == "0xabc"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn init_guardian_count_is_bounded() {
        let parse = |guardians: &str, threshold: &str| {
            WillVaultCli::try_parse_from([
                "willvault-node",
                "init",
                "--guardians",
                guardians,
                "--threshold",
                threshold,
            ])
        };

        assert!(parse("4000000000", "2").is_err());
        assert!(parse("257", "2").is_err());
        assert!(parse("0", "1").is_err());
        assert!(parse("3", "0").is_err());

        match parse("256", "200").unwrap().command {
            Commands::Init(args) => {
                assert_eq!(args.guardians, 256);
                assert_eq!(args.threshold, 200);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn commit_scheme_defaults_to_blake3() {
        let cli = WillVaultCli::try_parse_from(["willvault-node", "commit", "doc.enc"]).unwrap();
        match cli.command {
            Commands::Commit(args) => assert_eq!(args.scheme, CommitScheme::Blake3),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
