//! Delegation Node
//!
//! Entry point wiring the base ledger, the ephemeral executor, and the
//! commitment relayer into one process. The node drives base-layer slots
//! and periodic checkpoint commits until shut down.

use anyhow::Result;
use clap::Parser;
use delegation_node::{DelegationNode, NodeConfig};
use solana_sdk::{signature::Keypair, signer::Signer};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Two-layer delegated account ledger node
#[derive(Parser, Debug)]
#[command(name = "delegation-node")]
#[command(about = "Base ledger with ephemeral delegation and commitment reconciliation", long_about = None)]
struct Args {
    /// Base-layer slot time in milliseconds
    #[arg(long, default_value = "400")]
    slot_time_ms: u64,

    /// Slots between checkpoint passes
    #[arg(long, default_value = "100")]
    checkpoint_interval: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NodeConfig {
        slot_time_ms: args.slot_time_ms,
        checkpoint_interval_slots: args.checkpoint_interval,
    };

    let validator_keypair = Keypair::new();

    tracing::info!("Starting delegation node");
    tracing::info!("  Validator identity: {}", validator_keypair.pubkey());
    tracing::info!("  Slot time: {}ms", config.slot_time_ms);
    tracing::info!(
        "  Checkpoint interval: {} slots",
        config.checkpoint_interval_slots
    );

    let node = Arc::new(DelegationNode::new(validator_keypair, config));

    // Spawn the checkpoint loop
    let loop_node = node.clone();
    let checkpoint_handle = tokio::spawn(async move {
        loop_node.run_checkpoint_loop().await;
    });

    tracing::info!("Node running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down...");
    node.stop();
    checkpoint_handle.abort();

    tracing::info!("Node stopped at slot {}", node.base().current_slot());

    Ok(())
}
