//! # Command Line Interface
//!
//! `meshroot` runs the rotation controller by default. The other commands run a
//! single pass against the roots file, which is handy when preparing a rotation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;
use crate::observability::{init_observability, log_config_info};
use crate::providers::DefaultProviderResolver;
use crate::store::{FileRootStore, RootEvent, RootStore};
use crate::trust::{resolve_desired_roots, CertificateManager, Controller, Reconciler, TrustState};
use crate::{APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "meshroot")]
#[command(about = "Trust root rotation controller for service mesh control planes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Root declarations file override
    #[arg(short, long)]
    pub roots_file: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the roots file and keep the trust state converged
    Run,

    /// Validate the roots file and show which roots would sign and validate
    Check {
        /// Print the declarations and desired roles as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reconcile once and print the resulting trust state
    Once,

    /// Reconcile once and issue a leaf certificate from the signing root
    Issue {
        /// Workload identity, e.g. `bookstore.default`
        identity: String,

        /// Certificate validity in hours
        #[arg(long)]
        validity_hours: Option<u64>,
    },
}

/// Run CLI commands
pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(roots_file) = cli.roots_file {
        config.reconciler.roots_file = roots_file;
    }
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }

    init_observability(&config.observability)?;
    info!(app_name = APP_NAME, version = VERSION, "Starting meshroot");
    log_config_info(&config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_controller(&config).await,
        Commands::Check { json } => check_roots(&config, json).await,
        Commands::Once => {
            let (_, reconciler) = build_reconciler(&config);
            let outcome = reconciler.reconcile(&RootEvent::resync()).await?;
            println!("Outcome: {}", outcome);
            print_trust_state(reconciler.state());
            Ok(())
        }
        Commands::Issue { identity, validity_hours } => {
            let validity = validity_hours.map(validity_from_hours).transpose()?;
            let (_, reconciler) = build_reconciler(&config);
            reconciler.reconcile(&RootEvent::resync()).await?;

            let manager = CertificateManager::new(
                reconciler.state().clone(),
                config.reconciler.default_certificate_validity(),
            );
            let certificate = manager.issue_certificate(&identity, validity).await?;

            println!("# issuer: {}", certificate.issuer_id);
            println!("# serial: {}", certificate.serial_number);
            println!("# expires: {}", certificate.expires_at.to_rfc3339());
            print!("{}", certificate.certificate_pem);
            print!("{}", certificate.private_key.expose_secret());
            Ok(())
        }
    }
}

fn validity_from_hours(hours: u64) -> anyhow::Result<Duration> {
    hours
        .checked_mul(3600)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow::anyhow!("--validity-hours {} is out of range", hours))
}

fn build_reconciler(config: &AppConfig) -> (Arc<FileRootStore>, Arc<Reconciler>) {
    let store = Arc::new(FileRootStore::new(&config.reconciler.roots_file));
    let reconciler = Arc::new(Reconciler::new(
        store.clone(),
        Arc::new(DefaultProviderResolver::new()),
        Arc::new(TrustState::new()),
    ));
    (store, reconciler)
}

async fn run_controller(config: &AppConfig) -> anyhow::Result<()> {
    let (store, reconciler) = build_reconciler(config);
    let cancel = CancellationToken::new();

    let watcher = store.watch(config.reconciler.watch_interval(), cancel.clone());
    let controller = tokio::spawn(
        Controller::new(reconciler)
            .with_resync_interval(config.reconciler.resync_interval())
            .run(cancel.clone()),
    );

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, stopping controller");
    cancel.cancel();

    let (watcher, controller) = tokio::join!(watcher, controller);
    watcher.context("Roots file watcher panicked")?;
    controller.context("Controller task panicked")?;

    info!("meshroot stopped");
    Ok(())
}

async fn check_roots(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let store = FileRootStore::new(&config.reconciler.roots_file);
    let roots = store.list_roots().await?;

    if json {
        let desired = resolve_desired_roots(roots.clone());
        let report = serde_json::json!({
            "roots": roots,
            "signing": desired.as_ref().ok().map(|d| d.signing.name.clone()),
            "validating": desired.as_ref().ok().map(|d| d.validating.name.clone()),
            "error": desired.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        desired?;
        return Ok(());
    }

    println!();
    println!("{:<40} {:<10} {:<25} {:<10}", "Root", "Intent", "Trust Domain", "Provider");
    println!("{}", "-".repeat(88));
    for root in &roots {
        println!(
            "{:<40} {:<10} {:<25} {:<10}",
            root.name,
            root.intent.as_str(),
            root.trust_domain,
            root.provider.kind().as_str()
        );
    }
    println!();

    let desired = resolve_desired_roots(roots)?;
    println!("Signing root:    {}", desired.signing.name);
    println!("Validating root: {}", desired.validating.name);
    Ok(())
}

fn print_trust_state(state: &TrustState) {
    match state.snapshot() {
        Some(pair) => {
            println!("Signing:    {} ({})", pair.signing().id(), pair.signing().fingerprint());
            println!("Validating: {} ({})", pair.validating().id(), pair.validating().fingerprint());
        }
        None => println!("No trust state installed"),
    }
}
