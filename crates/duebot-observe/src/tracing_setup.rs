//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! let filter = duebot_observe::verbosity_filter(1, false);
//! duebot_observe::init_tracing(filter, false, false).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use std::sync::OnceLock;

/// Kept so the exporter can be flushed on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Default filter directive for the CLI verbosity flags.
pub fn verbosity_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "info,sqlx=warn",
        1 => "debug,sqlx=warn,hyper=info,reqwest=info",
        _ => "trace",
    }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. `json_logs` switches
/// the console output to one JSON object per event. When `enable_otel` is
/// true, spans are also exported to stdout through OpenTelemetry.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(
    default_filter: &str,
    json_logs: bool,
    enable_otel: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    };

    let otel_layer = enable_otel.then(|| {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("duebot");
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(otel_layer)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Flush pending spans and shut down the tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(verbosity_filter(0, true), "error");
        assert!(verbosity_filter(0, false).starts_with("info"));
        assert!(verbosity_filter(1, true).starts_with("debug"));
        assert_eq!(verbosity_filter(3, false), "trace");
    }

    #[test]
    fn test_filters_parse() {
        for v in 0..3 {
            assert!(EnvFilter::try_new(verbosity_filter(v, false)).is_ok());
        }
    }

    #[test]
    fn test_shutdown_without_otel_is_noop() {
        shutdown_tracing();
    }
}
