use anyhow::{anyhow, Context};
use clap::Parser;
use imguru::config::Config;
use imguru::proxy::ImguruProxy;
use pingora_core::server::configuration::Opt;
use pingora_core::server::Server;
use std::path::PathBuf;

/// imguru - signed image transform edge proxy built on Pingora
#[derive(Parser, Debug)]
#[command(name = "imguru")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Upgrade workers gracefully
    #[arg(long)]
    upgrade: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load and validate configuration before anything starts listening
    let config = Config::from_file(&args.config)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    config
        .validate()
        .map_err(|e| anyhow!(e))
        .context("Invalid configuration")?;

    imguru::logging::init_subscriber(config.server.log_format)
        .map_err(|e| anyhow!(e))
        .context("Failed to initialize logging subsystem")?;

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        origin = %config.edge.origin,
        route = %config.edge.route,
        verify_requests = config.edge.verify_requests,
        volumes = config.volumes.len(),
        "Configuration loaded successfully"
    );

    let opt = Opt {
        daemon: args.daemon,
        test: args.test,
        upgrade: args.upgrade,
        ..Default::default()
    };

    let mut server = Server::new(Some(opt))
        .map_err(|e| anyhow!("Failed to create Pingora server: {}", e))?;
    server.bootstrap();

    let listen_addr = config.server.listen_addr();
    let threads = config.server.threads;
    let proxy = ImguruProxy::new(config).map_err(|e| anyhow!(e))?;

    let mut proxy_service = pingora_proxy::http_proxy_service(&server.configuration, proxy);
    proxy_service.threads = Some(threads);
    proxy_service.add_tcp(&listen_addr);

    tracing::info!(
        address = %listen_addr,
        threads = threads,
        "Starting imguru edge proxy"
    );

    server.add_service(proxy_service);

    // Blocks until shutdown
    server.run_forever();
}
