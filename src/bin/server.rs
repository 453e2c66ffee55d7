/*! Wireworld simulator server binary. */
use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use wireworld::config::ServerConfig;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Wireworld simulator server")]
struct Opt {
    /// Port to listen on.
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// Verbosity (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write the resolved configuration as JSON to this path before
    /// starting, as a sidecar for scripts that want to inspect or
    /// replay the effective settings.
    #[arg(long)]
    dump_config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        log::error!("{e}");
        std::process::exit(exit_code_for(&e));
    }
}

async fn run() -> Result<()> {
    let opt = Opt::parse();
    stderrlog::new()
        .module(module_path!())
        .module("wireworld")
        .quiet(false)
        .verbosity(opt.verbose as usize)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    if let Some(path) = &opt.dump_config {
        let cfg = ServerConfig::with_port(opt.port);
        let json = serde_json::to_string_pretty(&cfg).context("serializing server config")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("writing config sidecar to {}", path.display()))?;
        info!("wrote config sidecar to {}", path.display());
    }

    let listener = wireworld::server::bind(opt.port).await?;
    info!("listening on {}", listener.local_addr()?);

    let (tx, rx) = tokio::sync::watch::channel(false);
    ctrlc::set_handler(move || {
        log::warn!("got Ctrl-C, shutting down");
        let _ = tx.send(true);
    })?;

    wireworld::server::serve(listener, rx).await;
    Ok(())
}

/// `1` for a bind/connect/I/O/setup failure, `2` for a protocol error
/// surfaced to the top level. The server's own `run_session` never lets a
/// protocol error escape past its own task, so in practice this binary
/// only ever exits `1`; the mapping exists so the exit-code contract is
/// uniform with the client binary.
fn exit_code_for(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<wireworld::Error>() {
        Some(wireworld::Error::Protocol(_)) => 2,
        _ => 1,
    }
}
