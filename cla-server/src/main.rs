use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

mod config;
mod sink;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => tracing_subscriber::EnvFilter::try_new(log_level)?,
    };
    let verbose = filter
        .max_level_hint()
        .is_some_and(|level| level > tracing_subscriber::filter::LevelFilter::INFO);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .init();
    Ok(())
}

async fn wait_for_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut term_handler =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = term_handler.recv() => info!("Received terminate signal, stopping..."),
            r = tokio::signal::ctrl_c() => {
                r?;
                info!("Received CTRL+C, stopping...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received CTRL+C, stopping...");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = config::load(args.config)?;
    init_logging(&config.log_level)?;

    info!(
        "{} version {} starting...",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let sink: Arc<dyn bpwire_cla::Sink> = Arc::new(sink::LoggingSink);
    let mut listeners = Vec::new();
    for listener in config.listeners {
        listeners.push(match listener {
            config::ListenerConfig::Tcpcl(tcpcl) => {
                info!("Starting TCPCLv3 listener as {}", tcpcl.local_eid);
                bpwire_cla::tcpcl::listen(tcpcl, sink.clone()).await?
            }
            config::ListenerConfig::Mtcp(mtcp) => {
                info!("Starting MTCP listener");
                bpwire_cla::mtcp::listen(mtcp, sink.clone()).await?
            }
        });
    }
    if listeners.is_empty() {
        anyhow::bail!("No listeners configured");
    }

    info!("Started successfully");
    wait_for_signal().await?;

    for listener in &listeners {
        listener.shutdown().await;
    }
    info!("Stopped");
    Ok(())
}
