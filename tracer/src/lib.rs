use tracing::subscriber::set_global_default;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// Installs the process-wide `tracing` subscriber. `service_name` is attached
/// to every event as a static field so multi-binary logs stay attributable.
pub fn init_tracing(service_name: &'static str, log_level: Option<&str>) {
    let env_filter = EnvFilter::new(log_level.unwrap_or("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().pretty();
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_level(true)
        .with_current_span(true)
        .with_thread_names(true);

    let subscriber = Registry::default().with(env_filter).with(json_layer);

    set_global_default(subscriber.with(stdout_layer))
        .expect("failed to set default tracing subscriber");

    tracing::info!(service = service_name, "tracing initialized");
}

#[cfg(test)]
mod tests {}
