use std::time::Duration;

/// `step * attempt`, optionally capped
pub struct LinearBackoff {
    step: Duration,
    max: Option<Duration>,
    current_attempt: u32,
}

impl LinearBackoff {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            max: None,
            current_attempt: 0,
        }
    }

    pub fn with_max(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }

    /// Delay before the retry that follows the given 1-based attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.step.saturating_mul(attempt);
        match self.max {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        self.current_attempt += 1;
        self.delay_for(self.current_attempt)
    }

    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }

    pub fn current_attempt(&self) -> u32 {
        self.current_attempt
    }
}
