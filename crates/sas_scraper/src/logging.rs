use std::collections::VecDeque;
use std::sync::Once;

use tracing::Level;

static INIT: Once = Once::new();

/// Emits `tracing` events tagged with a stack of context prefixes, e.g. the
/// article title and the summarization method of the pair being processed.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_new_prefixes(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.clear();
        self.prefixes.push_back(prefix.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push_back(prefix.into());
        self
    }

    fn render(&self, message: &str) -> String {
        let mut line: String = self.prefixes.iter().map(|p| format!("[{}] ", p)).collect();
        line.push_str(message);
        line
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}", self.render(message));
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}", self.render(message));
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}", self.render(message));
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}", self.render(message));
    }
}

/// Installs the global fmt subscriber once. `verbose` lowers the level to
/// DEBUG.
pub fn init_logging(verbose: bool) -> Logger {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .try_init();
        });
    }
    Logger::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_rendered_in_order() {
        let logger = Logger::new().with_prefix("Cell paper").with_prefix("BART");
        assert_eq!(logger.render("done"), "[Cell paper] [BART] done");

        let reset = logger.with_new_prefixes("Other");
        assert_eq!(reset.render("x"), "[Other] x");
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(false);
        init_logging(true).info("still fine");
        init_logging(true).with_prefix("debug").debug("hidden at info level");
    }
}
