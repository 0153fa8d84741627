use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use poem::{Server, listener::TcpListener};
use tokio::main;

use booking_mailer::{
    application::services::mail_transport::MailTransport,
    config::{Config, TransportKind},
    infrastructure::mail::{InMemoryMailTransport, SmtpMailTransport},
    logging,
    presentation::http::{build_app, endpoints::root::ApiState},
};

#[main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_parse().context("failed to load configuration")?;
    logging::init(config.log_level.as_deref());

    let transport: Arc<dyn MailTransport> = match (config.mail.transport, &config.mail.smtp) {
        (TransportKind::Smtp, Some(smtp)) => {
            tracing::info!(
                host = %smtp.host,
                port = smtp.port,
                tls = ?smtp.tls,
                "using smtp transport"
            );
            Arc::new(
                SmtpMailTransport::from_settings(smtp)
                    .context("failed to build smtp transport")?,
            )
        }
        _ => {
            tracing::warn!("using in-memory transport, emails will not leave this process");
            Arc::new(InMemoryMailTransport::new())
        }
    };

    match transport.verify().await {
        Ok(()) => tracing::info!(transport = transport.name(), "mail transport is ready"),
        Err(err) => tracing::warn!(
            transport = transport.name(),
            error = %err,
            "mail transport verification failed, continuing anyway"
        ),
    }

    tracing::info!(
        max_attempts = config.delivery.max_attempts,
        backoff_base_ms = config.delivery.backoff_base.as_millis() as u64,
        request_timeout_secs = config.delivery.request_timeout.as_secs(),
        "delivery policy loaded"
    );

    let state = Arc::new(ApiState::from_config(transport, &config));
    let app = build_app(state, &config.http);

    tracing::info!("Starting server at {}", config.http.server_url());

    Server::new(TcpListener::bind(config.http.bind_address()))
        .run_with_graceful_shutdown(app, shutdown_signal(), Some(Duration::from_secs(10)))
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
