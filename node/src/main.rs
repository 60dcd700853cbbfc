// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # WillVault Node
//!
//! Entry point for the `willvault-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves one vault over HTTP/WS.
//!
//! Subcommands:
//!
//! - `run`     : load `genesis.json` and serve the vault
//! - `init`    : generate owner/guardian keys and a genesis file
//! - `commit`  : print a document's commitment
//! - `sign`    : produce a signed `lock` or `confirm` call
//! - `version` : print build version information

mod api;
mod cli;
mod genesis;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use willvault_contracts::shared::SharedVault;
use willvault_protocol::config::EVENT_CHANNEL_CAPACITY;
use willvault_protocol::crypto::{DataHash, VaultKeypair};
use willvault_protocol::identity::{SignedCall, VaultCall};

use cli::{Commands, CommitScheme, SignCall, WillVaultCli};
use genesis::Genesis;
use logging::LogFormat;
use metrics::VaultMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WillVaultCli::parse();
    let log_format = LogFormat::from_str_lossy(&cli.log_format);

    match cli.command {
        Commands::Run(args) => run_node(args, log_format).await,
        Commands::Init(args) => init_vault(args, log_format),
        Commands::Commit(args) => commit_document(args),
        Commands::Sign(args) => sign_call(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Loads the genesis file and serves the API and metrics endpoints until
/// a shutdown signal arrives.
async fn run_node(args: cli::RunArgs, log_format: LogFormat) -> Result<()> {
    logging::init_logging(
        "willvault_node=info,willvault_contracts=info,tower_http=debug",
        log_format,
    );

    let genesis = Genesis::load(&args.genesis)?;
    tracing::info!(
        vault_id = %genesis.vault_id,
        owner = %genesis.owner,
        guardians = genesis.guardians.len(),
        threshold = genesis.threshold,
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        "starting willvault-node"
    );

    // --- Vault ---
    let vault = genesis
        .build_vault()
        .context("genesis does not describe a valid vault")?;
    let vault = SharedVault::new(vault, EVENT_CHANNEL_CAPACITY);

    // --- Metrics ---
    let vault_metrics =
        Arc::new(VaultMetrics::new().context("failed to register prometheus metrics")?);
    vault_metrics.observe_status(&vault.release_status());

    // --- Application state ---
    let app_state = api::AppState {
        vault_id: genesis.vault_id.clone(),
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            willvault_protocol::config::PROTOCOL_VERSION,
        ),
        vault,
        metrics: Arc::clone(&vault_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&vault_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("willvault-node stopped");
    Ok(())
}

/// Generates the owner and guardian keypairs and a genesis file that ties
/// them together under a fresh vault id.
fn init_vault(args: cli::InitArgs, log_format: LogFormat) -> Result<()> {
    logging::init_logging("willvault_node=info", log_format);

    let dir = &args.dir;
    let genesis_path = dir.join("genesis.json");
    if genesis_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            genesis_path.display()
        );
    }

    check_threshold(args.guardians, args.threshold)?;

    let owner = VaultKeypair::generate();
    let guardians: Vec<VaultKeypair> = (0..args.guardians)
        .map(|_| VaultKeypair::generate())
        .collect();
    let genesis = Genesis {
        vault_id: uuid::Uuid::new_v4().to_string(),
        owner: owner.address(),
        guardians: guardians.iter().map(|k| k.address()).collect(),
        threshold: args.threshold,
    };
    // Refuse to write keys for a vault that could never be constructed.
    genesis.validate()?;

    tracing::info!(dir = %dir.display(), vault_id = %genesis.vault_id, "initializing vault");
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;

    write_key(&dir.join("owner.key"), &owner)?;
    for (i, guardian) in guardians.iter().enumerate() {
        write_key(&dir.join(format!("guardian-{}.key", i + 1)), guardian)?;
    }
    genesis.save(&genesis_path)?;

    println!("Vault initialized successfully.");
    println!("  Directory : {}", dir.display());
    println!("  Vault id  : {}", genesis.vault_id);
    println!("  Owner     : {}", genesis.owner);
    for (i, g) in genesis.guardians.iter().enumerate() {
        println!("  Guardian {} : {}", i + 1, g);
    }
    println!("  Threshold : {} of {}", genesis.threshold, genesis.guardians.len());

    Ok(())
}

/// Rejects a threshold no set of `guardians` could ever meet. Runs before
/// any key is generated.
fn check_threshold(guardians: u32, threshold: u32) -> Result<()> {
    if threshold == 0 || threshold > guardians {
        anyhow::bail!(
            "threshold must be between 1 and the guardian count ({}), got {}",
            guardians,
            threshold
        );
    }
    Ok(())
}

/// Writes a hex secret key. On Unix the file is created with mode 0600, so
/// no other user can read it at any point.
fn write_key(path: &Path, keypair: &VaultKeypair) -> Result<()> {
    // An existing file would keep its old mode.
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove old key {}", path.display()))?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create key file {}", path.display()))?;
    file.write_all(keypair.secret_key_hex().as_bytes())
        .with_context(|| format!("failed to write key to {}", path.display()))?;

    tracing::info!(address = %keypair.address(), path = %path.display(), "keypair generated");
    Ok(())
}

/// Prints the commitment of a document file.
fn commit_document(args: cli::CommitArgs) -> Result<()> {
    let document = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let hash = match args.scheme {
        CommitScheme::Blake3 => DataHash::commit(&document),
        CommitScheme::Sha256 => DataHash::commit_sha256(&document),
    };
    println!("{}", hash);
    Ok(())
}

/// Signs a call with a key file and prints it as JSON.
fn sign_call(args: cli::SignArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.key)
        .with_context(|| format!("failed to read key file {}", args.key.display()))?;
    let keypair = VaultKeypair::from_hex(&raw)
        .with_context(|| format!("invalid key in {}", args.key.display()))?;

    let vault_id = match args.vault_id {
        Some(id) => id,
        None => Genesis::load(&args.genesis)?.vault_id,
    };

    let call = match args.call {
        SignCall::Lock { data_hash } => VaultCall::Lock {
            data_hash: data_hash
                .parse::<DataHash>()
                .with_context(|| format!("invalid data hash {data_hash:?}"))?,
        },
        SignCall::Confirm => VaultCall::Confirm,
    };

    let signed = SignedCall::sign(&keypair, &vault_id, call);
    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("willvault-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol       {}", willvault_protocol::config::PROTOCOL_VERSION);
    println!("signing        {}", willvault_protocol::config::SIGNING_ALGORITHM);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
