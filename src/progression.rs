use crate::constants::*;
use serde::{Deserialize, Serialize};

/// Experience curve shared by heroes (max level 20) and crafters (max
/// level 50). The threshold to leave `level` is `level^2 / 2 x 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCurve {
    pub max_level: u32,
}

impl LevelCurve {
    pub const fn new(max_level: u32) -> Self {
        Self { max_level }
    }

    pub const fn hero() -> Self {
        Self::new(MAX_HERO_LEVEL)
    }

    pub const fn crafter() -> Self {
        Self::new(MAX_CRAFTER_LEVEL)
    }

    pub fn threshold(&self, level: u32) -> u64 {
        let level = level as u64;
        level * level * 100 / 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub level: u32,
    pub exp: u64,
}

impl Progress {
    pub fn new() -> Self {
        Self { level: 1, exp: 0 }
    }

    pub fn with_level(level: u32, exp: u64) -> Self {
        Self { level, exp }
    }

    pub fn threshold(&self, curve: LevelCurve) -> u64 {
        curve.threshold(self.level)
    }

    /// Applies experience, levelling up at most once. Returns the
    /// unconsumed remainder past the level-up threshold. At max level all
    /// experience is absorbed and `exp` stays 0.
    pub fn receive_exp(&mut self, curve: LevelCurve, exp: u64) -> u64 {
        if self.level >= curve.max_level {
            self.exp = 0;
            return 0;
        }
        let threshold = self.threshold(curve);
        let total = self.exp + exp;
        if total >= threshold {
            self.level += 1;
            self.exp = 0;
            total - threshold
        } else {
            self.exp = total;
            0
        }
    }

    /// Applies experience through as many level-ups as it covers. Bounded
    /// by a fixed iteration cap so a degenerate curve cannot loop forever.
    /// Returns the number of levels gained.
    pub fn receive_exp_all(&mut self, curve: LevelCurve, total: u64) -> u32 {
        let start_level = self.level;
        let mut remainder = total;
        let mut iterations = 0;
        while remainder > 0 && self.level < curve.max_level && iterations < LEVEL_UP_ITERATION_CAP
        {
            remainder = self.receive_exp(curve, remainder);
            iterations += 1;
        }
        if self.level >= curve.max_level {
            self.exp = 0;
        }
        self.level - start_level
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_curve() {
        let curve = LevelCurve::hero();
        assert_eq!(curve.threshold(1), 50);
        assert_eq!(curve.threshold(2), 200);
        assert_eq!(curve.threshold(10), 5000);
    }

    #[test]
    fn test_receive_exp_accumulates_below_threshold() {
        let curve = LevelCurve::hero();
        let mut progress = Progress::new();
        assert_eq!(progress.receive_exp(curve, 30), 0);
        assert_eq!(progress.level, 1);
        assert_eq!(progress.exp, 30);
    }

    #[test]
    fn test_receive_exp_levels_once_and_returns_excess() {
        let curve = LevelCurve::hero();
        let mut progress = Progress::new();
        let excess = progress.receive_exp(curve, 80);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.exp, 0);
        assert_eq!(excess, 30);
    }

    #[test]
    fn test_receive_exp_all_multiple_levels() {
        let curve = LevelCurve::hero();
        let mut progress = Progress::new();
        // Level 1 -> 2 costs 50, 2 -> 3 costs 200; 20 left over.
        let gained = progress.receive_exp_all(curve, 270);
        assert_eq!(gained, 2);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.exp, 20);
    }

    #[test]
    fn test_receive_exp_all_stops_at_max_level() {
        let curve = LevelCurve::new(3);
        let mut progress = Progress::new();
        progress.receive_exp_all(curve, u64::MAX / 2);
        assert_eq!(progress.level, 3);
        assert_eq!(progress.exp, 0);
    }

    #[test]
    fn test_receive_exp_at_max_level_absorbs() {
        let curve = LevelCurve::new(2);
        let mut progress = Progress::with_level(2, 0);
        assert_eq!(progress.receive_exp(curve, 1000), 0);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.exp, 0);
    }

    #[test]
    fn test_iteration_cap_bounds_level_ups() {
        // More level-ups are covered than the cap allows; the loop must
        // stop at the cap instead of grinding on.
        let curve = LevelCurve::new(u32::MAX);
        let mut progress = Progress::new();
        let gained = progress.receive_exp_all(curve, u64::MAX);
        assert_eq!(gained, LEVEL_UP_ITERATION_CAP);
    }

    #[test]
    fn test_huge_exp_leaves_hero_at_max_with_zero_exp() {
        let curve = LevelCurve::hero();
        let mut progress = Progress::new();
        progress.receive_exp_all(curve, u64::MAX);
        assert_eq!(progress.level, MAX_HERO_LEVEL);
        assert_eq!(progress.exp, 0);
    }
}
