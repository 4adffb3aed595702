use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use segaline::config::Config;
use segaline::files::FileServer;
use segaline::server;

const DEFAULT_CONFIG: &str = "segaline.yaml";

#[derive(Parser)]
#[command(name = "segaline")]
#[command(about = "HTTP/1.x static file server", long_about = None)]
struct Args {
    /// Directory to serve files from
    file_root: Option<PathBuf>,

    /// Directory holding error.html
    template_root: Option<PathBuf>,

    /// YAML configuration file [default: segaline.yaml when present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segaline=info".into()),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    let default_config = PathBuf::from(DEFAULT_CONFIG);
    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)?,
        None if default_config.is_file() => Config::from_file(&default_config)?,
        None => Config::load(),
    };
    if let Some(root) = args.file_root {
        cfg.static_files.root = root;
    }
    if let Some(template_root) = args.template_root {
        cfg.static_files.template_root = template_root;
    }
    if let Some(listen) = args.listen {
        cfg.server.listen_addr = listen;
    }

    tracing::info!(
        identity = %cfg.server_identity(),
        root = %cfg.static_files.root.display(),
        template_root = %cfg.static_files.template_root.display(),
        read_timeout_secs = cfg.server.read_timeout_secs,
        "Configuration loaded"
    );

    let handler = Arc::new(FileServer::new(
        cfg.static_files.root.clone(),
        cfg.static_files.template_root.clone(),
        cfg.server_identity(),
    ));

    tokio::select! {
        res = server::listener::run(&cfg, handler) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
