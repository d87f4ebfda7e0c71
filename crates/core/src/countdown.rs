/// Lifecycle of an attempt's countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    Idle,
    Running,
    Expired,
}

/// What a single one-second tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No limit configured, or the countdown was cancelled.
    Idle,
    Running { remaining: u32 },
    /// Reported exactly once, on the tick that reached zero.
    Expired,
    /// Tick arrived after expiry.
    Suppressed,
}

/// Per-attempt countdown in whole seconds.
///
/// Ticks are fed in by the caller (a real interval or a test loop), so the
/// state machine stays deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    limit_secs: Option<u32>,
    remaining_secs: Option<u32>,
    state: CountdownState,
}

impl Countdown {
    #[must_use]
    pub fn new(limit_secs: Option<u32>) -> Self {
        Self {
            limit_secs,
            remaining_secs: None,
            state: CountdownState::Idle,
        }
    }

    #[must_use]
    pub fn untimed() -> Self {
        Self::new(None)
    }

    /// Start (or restart) from the full limit. No-op without a limit.
    pub fn start(&mut self) {
        if let Some(limit) = self.limit_secs {
            self.remaining_secs = Some(limit);
            self.state = CountdownState::Running;
        }
    }

    /// Stop counting; the remaining time is kept for display.
    pub fn cancel(&mut self) {
        if self.state == CountdownState::Running {
            self.state = CountdownState::Idle;
        }
    }

    pub fn tick(&mut self) -> Tick {
        match self.state {
            CountdownState::Idle => Tick::Idle,
            CountdownState::Expired => Tick::Suppressed,
            CountdownState::Running => {
                let remaining = self.remaining_secs.unwrap_or(0).saturating_sub(1);
                self.remaining_secs = Some(remaining);
                if remaining == 0 {
                    self.state = CountdownState::Expired;
                    Tick::Expired
                } else {
                    Tick::Running { remaining }
                }
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> CountdownState {
        self.state
    }

    #[must_use]
    pub fn limit_secs(&self) -> Option<u32> {
        self.limit_secs
    }

    /// `None` for untimed attempts.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.limit_secs
            .map(|limit| self.remaining_secs.unwrap_or(limit))
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.limit_secs.is_some()
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }
}
