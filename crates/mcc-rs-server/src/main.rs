mod capability;
mod config;
mod connection;
mod error;
mod net;
mod permissions;
mod session;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use capability::CapabilityTable;
use config::ServerConfig;
use connection::ConnectionHandler;
use net::NetEvent;
use tokio::io::AsyncBufReadExt;
use tracing::info;

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "server.toml".into());
    let config = Arc::new(match ServerConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            std::process::exit(1);
        }
    });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "MCC-RS Server v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.address,
        config.server.port
    );
    info!("Name: {}", config.server.name);
    info!("MOTD: {}", config.server.motd);
    info!("Max players: {}", config.server.max_players);
    info!(
        "World: {} ({}x{}x{})",
        config.world.name, config.world.width, config.world.height, config.world.length
    );

    let addr: SocketAddr = match format!("{}:{}", config.server.address, config.server.port).parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Invalid bind address: {e}");
            std::process::exit(1);
        }
    };

    let capabilities = Arc::new(CapabilityTable::standard(&config.extensions.disabled));
    info!(
        "Extensions: {}",
        capabilities
            .iter()
            .map(|(ext, version)| format!("{}/{version}", ext.name()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let mut handler = match ConnectionHandler::new(config.clone(), capabilities, shutdown_tx.clone()) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Failed to create world: {e}");
            std::process::exit(1);
        }
    };

    let listener = match net::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    // Handle Ctrl+C
    let shutdown_tx_ctrlc = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx_ctrlc.send(true);
    });

    // Console REPL: read lines from stdin
    let (console_tx, mut console_rx) = tokio::sync::mpsc::channel::<String>(32);
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let (event_tx, mut events) = tokio::sync::mpsc::channel::<NetEvent>(1024);
    tokio::spawn(net::accept_loop(
        listener,
        event_tx,
        config.server.send_queue_len,
        shutdown_rx.clone(),
    ));

    // Everything below runs on this one task; the handler is never shared.
    let mut ping_interval =
        tokio::time::interval(Duration::from_secs(config.server.ping_interval_secs.max(1)));
    let mut shutdown_rx_handler = shutdown_rx.clone();
    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(e) => handler.handle_event(e),
                    None => break, // accept loop gone
                }
            }
            _ = ping_interval.tick() => {
                handler.liveness_tick();
            }
            Some(line) = console_rx.recv() => {
                handler.handle_console_command(&line);
            }
            _ = shutdown_rx_handler.changed() => {
                if *shutdown_rx_handler.borrow() {
                    handler.shutdown("Server shutting down");
                    break;
                }
            }
        }
        handler.pump();
    }

    // Let writer tasks flush the disconnect packets.
    tokio::time::sleep(Duration::from_millis(250)).await;
    info!("Server shut down.");
}
