//! Glitch filter for a single pedal input
//!
//! A raw `true` sample means the pedal is physically down.

use crate::config::DEBOUNCE_RESET_US;

/// Debounced pedal position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Up,
    Down,
}

/// Accepts a level change after `N` consistent samples
///
/// On top of the sample window there is a refractory period of
/// [`DEBOUNCE_RESET_US`] after each accepted change, during which samples are
/// still recorded but no change is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlitchFilter<const N: u8> {
    samples: u8,
    level: Level,
    last_change_us: u32,
}

impl<const N: u8> GlitchFilter<N> {
    const MASK: u8 = (((1u16 << N) - 1) & 0xff) as u8;

    /// New filter in [`Level::Up`], panics if `N` is not in `1..=8`
    pub const fn new() -> Self {
        if N == 0 || N > 8 {
            panic!("Glitch filter window must be 1 to 8 samples");
        }
        Self {
            samples: 0,
            level: Level::Up,
            last_change_us: 0,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Shift in a new sample, return new level if it changed
    ///
    /// Time is a free-running microsecond counter that may wrap around.
    pub fn update(&mut self, sample: bool, now_us: u32) -> Option<Level> {
        self.samples = ((self.samples << 1) | sample as u8) & Self::MASK;

        if now_us.wrapping_sub(self.last_change_us) < DEBOUNCE_RESET_US {
            return None;
        }

        let next = match self.level {
            Level::Down if self.samples == 0 => Level::Up,
            Level::Up if self.samples == Self::MASK => Level::Down,
            _ => return None,
        };
        self.level = next;
        self.last_change_us = now_us;
        Some(next)
    }
}

impl<const N: u8> Default for GlitchFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::POLL_PERIOD_US;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    type Filter = GlitchFilter<5>;

    /// Feed samples at the poll period, starting at `start`; returns reported changes with time
    fn feed(filter: &mut Filter, start: u32, samples: &[u8]) -> std::vec::Vec<(u32, Level)> {
        samples.iter().enumerate()
            .filter_map(|(i, &s)| {
                let now = start.wrapping_add(i as u32 * POLL_PERIOD_US);
                filter.update(s != 0, now).map(|level| (now, level))
            })
            .collect()
    }

    #[test]
    fn window_mask() {
        assert_eq!(GlitchFilter::<5>::MASK, 0b11111);
        assert_eq!(GlitchFilter::<8>::MASK, 0xff);
        assert_eq!(GlitchFilter::<1>::MASK, 0b1);
    }

    #[test]
    fn press_after_five_samples() {
        let mut filter = Filter::new();
        let t0 = DEBOUNCE_RESET_US;
        assert!(feed(&mut filter, t0, &[1, 1, 1, 1]).is_empty());
        assert_eq!(filter.update(true, t0 + 4 * POLL_PERIOD_US), Some(Level::Down));
        assert_eq!(filter.level(), Level::Down);
    }

    #[test]
    fn single_glitch_is_ignored() {
        let mut filter = Filter::new();
        let t0 = DEBOUNCE_RESET_US;
        assert!(feed(&mut filter, t0, &[1, 0, 1, 1, 1, 1]).is_empty());
        assert_eq!(filter.level(), Level::Up);
        // Glitch leaves the window with the next sample
        let t = t0 + 6 * POLL_PERIOD_US;
        assert_eq!(feed(&mut filter, t, &[1]), [(t, Level::Down)]);
    }

    #[test]
    fn refractory_period() {
        let mut filter = Filter::new();
        // Stable high from time 0, but nothing may change before the refractory period ends
        let changes = feed(&mut filter, 0, &[1; 1001]);
        assert_eq!(changes, [(DEBOUNCE_RESET_US, Level::Down)]);

        // Released right away: must wait another full period from the last change
        let start = DEBOUNCE_RESET_US + POLL_PERIOD_US;
        let changes = feed(&mut filter, start, &[0; 1000]);
        assert_eq!(changes, [(2 * DEBOUNCE_RESET_US, Level::Up)]);
    }

    #[test]
    fn timer_wrap_around() {
        let mut filter = Filter::new();
        let start = u32::MAX - 10_000;
        let pressed = start.wrapping_add(4 * POLL_PERIOD_US);
        assert_eq!(feed(&mut filter, start, &[1; 5]), [(pressed, Level::Down)]);
        // Refractory period ends after the counter wrapped
        let changes = feed(&mut filter, pressed.wrapping_add(POLL_PERIOD_US), &[0; 2000]);
        assert_eq!(changes, [(pressed.wrapping_add(DEBOUNCE_RESET_US), Level::Up)]);
    }

    #[test]
    fn random_noise_respects_window_and_refractory() {
        let mut rng = StdRng::seed_from_u64(0x9e37_79b9);
        let mut filter = Filter::new();
        let mut history = std::vec::Vec::new();
        let mut last_change: Option<u32> = None;
        let mut level = Level::Up;
        let mut now = 0u32;

        for _ in 0..200_000 {
            // Long stable stretches with single-sample chatter
            if rng.gen_ratio(1, 3000) {
                level = if level == Level::Up { Level::Down } else { Level::Up };
            }
            let sample = (level == Level::Down) != rng.gen_ratio(1, 20);
            history.push(sample);
            if let Some(new) = filter.update(sample, now) {
                let tail = &history[history.len() - 5..];
                let expected = new == Level::Down;
                assert!(tail.iter().all(|s| *s == expected), "at {}: {:?}", now, tail);
                if let Some(prev) = last_change {
                    assert!(now - prev >= DEBOUNCE_RESET_US);
                }
                last_change = Some(now);
            }
            now += POLL_PERIOD_US;
        }
        assert!(last_change.is_some());
    }
}
