use serde::{Deserialize, Serialize};

/// Tuning for a migration run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushOptions {
    /// Maximum number of sink writes in flight. Zero is treated as one.
    pub concurrency: usize,
    /// Report progress every this many processed objects. Zero reports only
    /// the final line.
    pub progress_interval: u64,
    /// Abort the run with `Interrupted` on Ctrl-C.
    ///
    /// The first run to listen replaces the default SIGINT action for the
    /// rest of the process. Afterwards Ctrl-C outside a run does nothing, so
    /// long-lived callers that push repeatedly need their own listener.
    pub handle_interrupt: bool,
}

impl PushOptions {
    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

impl Default for PushOptions {
    fn default() -> Self {
        Self {
            concurrency: 512,
            progress_interval: 100,
            handle_interrupt: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let o = PushOptions::default();
        assert_eq!(o.concurrency, 512);
        assert_eq!(o.progress_interval, 100);
        assert!(o.handle_interrupt);
    }

    #[test]
    fn zero_concurrency_still_makes_progress() {
        let o = PushOptions { concurrency: 0, ..PushOptions::default() };
        assert_eq!(o.effective_concurrency(), 1);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let o: PushOptions = toml::from_str("concurrency = 8").unwrap();
        assert_eq!(o.concurrency, 8);
        assert_eq!(o.progress_interval, 100);
        assert!(o.handle_interrupt);
    }
}
