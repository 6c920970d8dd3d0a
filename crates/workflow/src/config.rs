//! Workflow configuration (spec §6): retry/timeout/backoff defaults shared
//! by every task that doesn't override them, overlaid from environment
//! variables the same way [`skein_log::Config`] overlays `SKEIN_LOG`.

/// Engine-wide defaults. Individual [`crate::TaskDefinition`]s may override
/// `retry_count`/`timeout_ms` per task; `retry_delay_ms`/`retry_delay_multiplier`
/// and `max_iterations` are workflow-wide only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowConfig {
    /// Cap on loop-pattern iterations (consumed by `skein-agent-graph`).
    pub max_iterations: u32,
    /// Default retry count when a task does not specify its own.
    pub max_retries: u32,
    /// Default per-task timeout in milliseconds.
    pub timeout_ms: u64,
    /// Backoff seed between attempts.
    pub retry_delay_ms: u64,
    /// Backoff growth factor between attempts.
    pub retry_delay_multiplier: f64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_retries: 0,
            timeout_ms: 30_000,
            retry_delay_ms: 0,
            retry_delay_multiplier: 1.0,
        }
    }
}

impl WorkflowConfig {
    /// Overlay `SKEIN_MAX_RETRIES`, `SKEIN_TIMEOUT_MS`, `SKEIN_RETRY_DELAY_MS`,
    /// and `SKEIN_RETRY_DELAY_MULTIPLIER` onto this config, in that order,
    /// ignoring any variable that is unset or fails to parse.
    #[must_use]
    pub fn with_env_overlay(mut self) -> Self {
        if let Some(v) = parse_env("SKEIN_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Some(v) = parse_env("SKEIN_TIMEOUT_MS") {
            self.timeout_ms = v;
        }
        if let Some(v) = parse_env("SKEIN_RETRY_DELAY_MS") {
            self.retry_delay_ms = v;
        }
        if let Some(v) = parse_env("SKEIN_RETRY_DELAY_MULTIPLIER") {
            self.retry_delay_multiplier = v;
        }
        self
    }

    /// Serialize as the `workflowConfig` field of a persisted snapshot.
    #[must_use]
    pub fn to_value(self) -> serde_json::Value {
        serde_json::json!({
            "maxIterations": self.max_iterations,
            "maxRetries": self.max_retries,
            "timeoutMs": self.timeout_ms,
            "retryDelayMs": self.retry_delay_ms,
            "retryDelayMultiplier": self.retry_delay_multiplier,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_zero_retries_and_no_backoff() {
        let cfg = WorkflowConfig::default();
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.retry_delay_multiplier, 1.0);
    }

    #[test]
    fn env_overlay_reads_all_four_variables() {
        // SAFETY: test runs single-threaded within this process's env mutation window.
        unsafe {
            std::env::set_var("SKEIN_MAX_RETRIES", "5");
            std::env::set_var("SKEIN_TIMEOUT_MS", "1000");
            std::env::set_var("SKEIN_RETRY_DELAY_MS", "200");
            std::env::set_var("SKEIN_RETRY_DELAY_MULTIPLIER", "2.5");
        }
        let cfg = WorkflowConfig::default().with_env_overlay();
        unsafe {
            std::env::remove_var("SKEIN_MAX_RETRIES");
            std::env::remove_var("SKEIN_TIMEOUT_MS");
            std::env::remove_var("SKEIN_RETRY_DELAY_MS");
            std::env::remove_var("SKEIN_RETRY_DELAY_MULTIPLIER");
        }
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.timeout_ms, 1000);
        assert_eq!(cfg.retry_delay_ms, 200);
        assert_eq!(cfg.retry_delay_multiplier, 2.5);
    }

    #[test]
    fn missing_env_vars_leave_defaults_untouched() {
        let cfg = WorkflowConfig::default().with_env_overlay();
        assert_eq!(cfg, WorkflowConfig::default());
    }
}
