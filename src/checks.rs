//! Named pass/fail assertions on responses, tallied across the whole run.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckTally {
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    /// Fraction of passing checks; 0.0 when nothing was checked.
    pub fn pass_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.passes as f64 / total as f64,
        }
    }

    fn record(&mut self, passed: bool) {
        if passed {
            self.passes += 1;
        } else {
            self.fails += 1;
        }
    }
}

/// Tallies keyed by check name, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Checks {
    tallies: Vec<(String, CheckTally)>,
}

impl Checks {
    pub fn record(&mut self, result: &CheckResult) {
        match self.tallies.iter_mut().find(|(name, _)| *name == result.name) {
            Some((_, tally)) => tally.record(result.passed),
            None => {
                let mut tally = CheckTally::default();
                tally.record(result.passed);
                self.tallies.push((result.name.clone(), tally));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<CheckTally> {
        self.tallies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tally)| *tally)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CheckTally)> {
        self.tallies.iter().map(|(name, tally)| (name.as_str(), *tally))
    }

    pub fn total(&self) -> CheckTally {
        self.tallies.iter().fold(CheckTally::default(), |acc, (_, t)| CheckTally {
            passes: acc.passes + t.passes,
            fails: acc.fails + t.fails,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}
