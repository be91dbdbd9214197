use biometrics::{Collector, Counter, Moments};
use tracing_subscriber::EnvFilter;

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("campus.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("campus.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("campus.client.request_duration_seconds");

pub(crate) static EXCHANGES_STARTED: Counter = Counter::new("campus.exchange.started");
pub(crate) static EXCHANGES_ANSWERED: Counter = Counter::new("campus.exchange.answered");
pub(crate) static EXCHANGES_FAILED: Counter = Counter::new("campus.exchange.failed");
pub(crate) static SUBMISSIONS_IGNORED: Counter = Counter::new("campus.exchange.ignored");

pub(crate) static RENDER_FAULTS: Counter = Counter::new("campus.render.faults");

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "campus_assistant=warn";

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&EXCHANGES_STARTED);
    collector.register_counter(&EXCHANGES_ANSWERED);
    collector.register_counter(&EXCHANGES_FAILED);
    collector.register_counter(&SUBMISSIONS_IGNORED);

    collector.register_counter(&RENDER_FAULTS);
}

/// Install the process-wide tracing subscriber.
///
/// Logs go to stderr so they never interleave with the conversation on
/// stdout.  `RUST_LOG` overrides the default `campus_assistant=warn` filter.
/// Calling this more than once is harmless.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
