use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::broadcast;

use toaster::config::Settings;
use toaster::presentation::{Gesture, HeadlessHost};
use toaster::tasks::{ToasterHandle, ToasterService};
use toaster::telemetry::init_tracing;
use toaster::toast::{HoverPolicy, ToastEvent, ToastId, ToastKind};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_tracing(&settings.logging)?;
    tracing::info!("Configuration loaded");

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (service, handle) = ToasterService::new(&settings, Arc::new(HeadlessHost::new()), shutdown_rx)?;

    // Start the registry owner in background
    let service_handle = tokio::spawn(service.run());

    // Render change notifications as JSON lines
    let mut events = handle.subscribe();
    let render_handle = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ToastEvent::Progress { .. }) => {}
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode toast event"),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Renderer lagged behind toast events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        result = read_commands(handle.clone()) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Command reader failed");
            }
        }
        _ = shutdown_signal() => {}
    }

    let _ = shutdown_tx.send(());
    drop(handle);

    tracing::info!("Waiting for background tasks to finish...");
    let _ = tokio::join!(service_handle, render_handle);

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Read commands from stdin, one per line:
///
/// ```text
/// info|success|warning|error <message> [| <title> [| <duration_ms>]]
/// close|enter|leave <id>
/// policy pause|pause-all|disabled
/// clear
/// ```
async fn read_commands(handle: ToasterHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));

        let outcome = match verb {
            "close" | "enter" | "leave" => match rest.trim().parse::<ToastId>() {
                Ok(id) => {
                    let gesture = match verb {
                        "close" => Gesture::Close(id),
                        "enter" => Gesture::PointerEnter(id),
                        _ => Gesture::PointerLeave(id),
                    };
                    handle.gesture(gesture).await.map_err(anyhow::Error::from)
                }
                Err(e) => Err(anyhow::anyhow!("invalid toast id: {}", e)),
            },
            "policy" => match rest.trim().parse::<HoverPolicy>() {
                Ok(policy) => handle.set_hover_policy(policy).await.map_err(anyhow::Error::from),
                Err(e) => Err(e.into()),
            },
            "clear" => handle.clear().await.map(|_| ()).map_err(anyhow::Error::from),
            kind => match kind.parse::<ToastKind>() {
                Ok(kind) => add_toast(&handle, kind, rest).await,
                Err(e) => Err(e.into()),
            },
        };

        if let Err(e) = outcome {
            tracing::warn!(error = %e, command = %line, "Command rejected");
        }
    }

    Ok(())
}

async fn add_toast(handle: &ToasterHandle, kind: ToastKind, args: &str) -> Result<()> {
    let mut parts = args.splitn(3, '|').map(str::trim);
    let message = parts.next().unwrap_or_default();
    let title = parts.next().filter(|t| !t.is_empty());
    let duration_ms = parts.next().map(str::parse::<i64>).transpose()?;

    let id = handle.add(kind, message, title, duration_ms).await?;
    tracing::debug!(toast_id = %id, "Toast requested from stdin");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
