use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::slice;

use serde::{Deserialize, Serialize};

/// Aggregate counts for one epoch.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpochCounts {
    pub epoch: u32,
    /// Individuals that have ever been infected.
    pub hit_count: usize,
    /// Individuals infected at the end of the epoch.
    pub infected_count: usize,
}

impl EpochCounts {
    /// Tallies for a single individual, used as the unit of the per-epoch reduction.
    #[must_use]
    pub fn of_individual(hit: bool, infected: bool) -> Self {
        EpochCounts {
            epoch: 0,
            hit_count: usize::from(hit),
            infected_count: usize::from(infected),
        }
    }
}

// Partial sums from different partitions are combined with `+`. The epoch is not a count and is
// stamped after the reduction.
impl Add for EpochCounts {
    type Output = EpochCounts;

    fn add(self, other: EpochCounts) -> EpochCounts {
        EpochCounts {
            epoch: self.epoch.max(other.epoch),
            hit_count: self.hit_count + other.hit_count,
            infected_count: self.infected_count + other.infected_count,
        }
    }
}

impl AddAssign for EpochCounts {
    fn add_assign(&mut self, other: EpochCounts) {
        *self = *self + other;
    }
}

impl Sum for EpochCounts {
    fn sum<I: Iterator<Item = EpochCounts>>(iter: I) -> Self {
        iter.fold(EpochCounts::default(), Add::add)
    }
}

/// The ordered per-epoch counts of one run, starting at epoch 0.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochStatistics {
    epochs: Vec<EpochCounts>,
}

impl EpochStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        EpochStatistics {
            epochs: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, counts: EpochCounts) {
        self.epochs.push(counts);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    #[must_use]
    pub fn get(&self, epoch: usize) -> Option<&EpochCounts> {
        self.epochs.get(epoch)
    }

    /// Counts for the final epoch.
    #[must_use]
    pub fn last(&self) -> Option<&EpochCounts> {
        self.epochs.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, EpochCounts> {
        self.epochs.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[EpochCounts] {
        &self.epochs
    }

    /// The epoch with the most simultaneously infected individuals. Ties go to the earliest.
    #[must_use]
    pub fn peak_infected(&self) -> Option<&EpochCounts> {
        self.epochs
            .iter()
            .reduce(|peak, counts| {
                if counts.infected_count > peak.infected_count {
                    counts
                } else {
                    peak
                }
            })
    }

    /// Whether the sequence satisfies the invariants every run must uphold: epochs are numbered
    /// consecutively from zero, no epoch has more infected than hit individuals or more hit
    /// individuals than the population, and the hit count never decreases.
    #[must_use]
    pub fn is_consistent(&self, individual_count: usize) -> bool {
        let mut previous_hits = 0;
        for (index, counts) in self.epochs.iter().enumerate() {
            if counts.epoch as usize != index
                || counts.infected_count > counts.hit_count
                || counts.hit_count > individual_count
                || counts.hit_count < previous_hits
            {
                return false;
            }
            previous_hits = counts.hit_count;
        }
        true
    }
}

impl<'a> IntoIterator for &'a EpochStatistics {
    type Item = &'a EpochCounts;
    type IntoIter = slice::Iter<'a, EpochCounts>;

    fn into_iter(self) -> Self::IntoIter {
        self.epochs.iter()
    }
}

impl FromIterator<EpochCounts> for EpochStatistics {
    fn from_iter<I: IntoIterator<Item = EpochCounts>>(iter: I) -> Self {
        EpochStatistics {
            epochs: iter.into_iter().collect(),
        }
    }
}
