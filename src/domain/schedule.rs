//! Stake ramp schedule.
//!
//! The cycle target handed to the sizer is not the full target stake:
//! it is scaled by a monotone step function of minutes-to-race, so
//! exposure ramps up naturally as the race approaches. Because sizing
//! always computes `remaining = target − matched`, stake placed under
//! an earlier, smaller fraction is never reduced, only topped up.

use serde::Deserialize;

/// One step of the ramp: the fraction that applies when the race is at
/// most `within_minutes` away.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScheduleStep {
    /// Upper bound (inclusive) on minutes-to-race for this step.
    pub within_minutes: f64,
    /// Fraction of the full target stake sought at this distance.
    pub fraction: f64,
}

/// Monotone step function mapping minutes-to-race to a stake fraction.
#[derive(Debug, Clone)]
pub struct StakeSchedule {
    /// Steps sorted ascending by `within_minutes`.
    steps: Vec<ScheduleStep>,
}

impl StakeSchedule {
    /// Build a schedule from validated steps.
    ///
    /// # Panics
    /// Panics if `steps` is empty. The config loader rejects empty or
    /// non-monotone schedules before this is reached.
    pub fn new(mut steps: Vec<ScheduleStep>) -> Self {
        assert!(!steps.is_empty(), "stake schedule must have at least one step");
        steps.sort_by(|a, b| a.within_minutes.total_cmp(&b.within_minutes));
        Self { steps }
    }

    /// Fraction of the full target stake to seek at this distance from
    /// the race. Beyond the widest step the widest fraction applies.
    pub fn fraction(&self, minutes_to_race: f64) -> f64 {
        for step in &self.steps {
            if minutes_to_race <= step.within_minutes {
                return step.fraction;
            }
        }
        self.steps[self.steps.len() - 1].fraction
    }
}

impl Default for StakeSchedule {
    /// Quarter of the target beyond three hours out, ramping to the
    /// full target inside ten minutes.
    fn default() -> Self {
        Self::new(vec![
            ScheduleStep { within_minutes: 10.0, fraction: 1.0 },
            ScheduleStep { within_minutes: 30.0, fraction: 0.75 },
            ScheduleStep { within_minutes: 60.0, fraction: 0.5 },
            ScheduleStep { within_minutes: 180.0, fraction: 0.25 },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ramp() {
        let schedule = StakeSchedule::default();
        assert_eq!(schedule.fraction(240.0), 0.25);
        assert_eq!(schedule.fraction(90.0), 0.25);
        assert_eq!(schedule.fraction(45.0), 0.5);
        assert_eq!(schedule.fraction(15.0), 0.75);
        assert_eq!(schedule.fraction(5.0), 1.0);
    }

    #[test]
    fn test_fraction_monotone_as_race_approaches() {
        let schedule = StakeSchedule::default();
        let mut last = 0.0;
        for minutes in [500.0, 180.0, 60.0, 30.0, 10.0, 1.0] {
            let fraction = schedule.fraction(minutes);
            assert!(fraction >= last, "fraction must not shrink approaching the race");
            last = fraction;
        }
    }

    #[test]
    fn test_unsorted_steps_are_sorted() {
        let schedule = StakeSchedule::new(vec![
            ScheduleStep { within_minutes: 60.0, fraction: 0.5 },
            ScheduleStep { within_minutes: 10.0, fraction: 1.0 },
        ]);
        assert_eq!(schedule.fraction(5.0), 1.0);
        assert_eq!(schedule.fraction(30.0), 0.5);
    }

    #[test]
    fn test_in_play_minutes_use_tightest_step() {
        let schedule = StakeSchedule::default();
        assert_eq!(schedule.fraction(-1.0), 1.0);
    }
}
