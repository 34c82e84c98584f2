//! Session configuration.

use std::time::Duration;

/// Tunables for an onboarding session.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Quiet period before an edit is flushed to storage. Every mutation
    /// restarts the window (trailing-edge coalescing).
    pub save_debounce: Duration,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_secs(1),
        }
    }
}
