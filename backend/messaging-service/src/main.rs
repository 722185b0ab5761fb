use messaging_service::{config::Config, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();
    let config = Config::from_env()?;
    tracing::info!(
        service = %config.service_name,
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        "starting messaging service"
    );

    let (_state, mut events) = AppState::in_memory(config);

    let drain = tokio::spawn(async move {
        while let Some(message) = events.recv().await {
            tracing::debug!(
                event_type = message.envelope.data.event_type(),
                event_id = %message.envelope.event_id,
                partition_key = %message.partition_key(),
                receivers = message.receivers.len(),
                "fan-out event"
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    drain.abort();
    Ok(())
}
