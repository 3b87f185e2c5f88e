//! Periodic synthetic keystroke that keeps the host from locking

use crate::config::KeepAwakeConfig;

/// Decides when the next keep-awake tap is due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAwake {
    enabled: bool,
    period_us: u32,
    last_us: Option<u32>,
}

impl KeepAwake {
    pub const fn new(config: &KeepAwakeConfig) -> Self {
        Self {
            enabled: config.enabled_at_boot,
            period_us: config.period_ms.saturating_mul(1000),
            last_us: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable, the period restarts on the next poll
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.last_us = None;
    }

    /// Check if a tap should be sent now
    pub fn poll(&mut self, now_us: u32) -> bool {
        if !self.enabled {
            return false;
        }
        match self.last_us {
            Some(last) if now_us.wrapping_sub(last) < self.period_us => false,
            Some(_) => {
                self.last_us = Some(now_us);
                true
            },
            None => {
                self.last_us = Some(now_us);
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: KeepAwakeConfig = KeepAwakeConfig { period_ms: 10, enabled_at_boot: true };

    #[test]
    fn disabled_never_fires() {
        let mut ka = KeepAwake::new(&KeepAwakeConfig { enabled_at_boot: false, ..CONFIG });
        assert!(!ka.is_enabled());
        assert!((0..100_000).step_by(20).all(|t| !ka.poll(t)));
    }

    #[test]
    fn fires_every_period() {
        let mut ka = KeepAwake::new(&CONFIG);
        let fired: std::vec::Vec<u32> = (1000..50_000).step_by(20).filter(|&t| ka.poll(t)).collect();
        assert_eq!(fired, [11_000, 21_000, 31_000, 41_000]);
    }

    #[test]
    fn enabling_restarts_period() {
        let mut ka = KeepAwake::new(&CONFIG);
        assert!(!ka.poll(0));
        assert!(!ka.poll(9_000));
        ka.set_enabled(true);
        assert!(!ka.poll(9_500));
        assert!(!ka.poll(19_000));
        assert!(ka.poll(19_500));
    }

    #[test]
    fn timer_wrap_around() {
        let mut ka = KeepAwake::new(&CONFIG);
        let start = u32::MAX - 5_000;
        assert!(!ka.poll(start));
        assert!(!ka.poll(start.wrapping_add(9_999)));
        assert!(ka.poll(start.wrapping_add(10_000)));
    }
}
