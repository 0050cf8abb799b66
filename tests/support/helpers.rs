use handlecheck::MatchHandler;
use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

/// Match handler that records every forwarded handle in arrival order.
#[derive(Default)]
pub struct RecordingHandler {
    matched: Vec<String>,
}

impl RecordingHandler {
    pub fn matched(&self) -> &[String] {
        &self.matched
    }
}

impl MatchHandler for RecordingHandler {
    fn on_match(&mut self, handle: &str) {
        self.matched.push(handle.to_owned());
    }
}
