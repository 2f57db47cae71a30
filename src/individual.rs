//! Per-agent state and the infection state machine.
//!
//! An individual starts `Susceptible`, becomes `Infected` when exposure succeeds (or when seeded),
//! and becomes `Recovered` once it has been infected for longer than the disease duration.
//! `Recovered` is terminal: there is no re-infection.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::LocationId;
use crate::random::sample_from_slice;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfectionStatus {
    #[default]
    Susceptible,
    Infected,
    Recovered,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Individual {
    location: LocationId,
    infection_status: InfectionStatus,
    /// Epochs spent infected so far. Only meaningful while `Infected`.
    infected_duration: u32,
    /// Whether the individual has ever been infected. Never reset.
    ever_hit: bool,
}

impl Individual {
    /// A susceptible individual at `location`.
    #[must_use]
    pub fn new(location: LocationId) -> Self {
        Individual {
            location,
            infection_status: InfectionStatus::Susceptible,
            infected_duration: 0,
            ever_hit: false,
        }
    }

    #[must_use]
    pub fn location(&self) -> LocationId {
        self.location
    }

    #[must_use]
    pub fn infection_status(&self) -> InfectionStatus {
        self.infection_status
    }

    #[must_use]
    pub fn infected_duration(&self) -> u32 {
        self.infected_duration
    }

    #[must_use]
    pub fn is_susceptible(&self) -> bool {
        self.infection_status == InfectionStatus::Susceptible
    }

    #[must_use]
    pub fn is_infected(&self) -> bool {
        self.infection_status == InfectionStatus::Infected
    }

    /// Whether the individual has ever been infected, including if it has since recovered.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        self.ever_hit
    }

    /// Moves to a location drawn uniformly from `candidates`, which is expected to contain the
    /// current location so that staying put is possible. An empty slice leaves the location
    /// unchanged.
    pub fn move_within<R: Rng>(&mut self, candidates: &[LocationId], rng: &mut R) {
        if let Some(location) = sample_from_slice(rng, candidates) {
            self.location = location;
        }
    }

    /// Exposes a susceptible individual, infecting it with probability `infection_probability`.
    /// Returns whether the individual became infected. Does nothing, and returns `false`, for an
    /// individual that is not susceptible.
    ///
    /// Probabilities above 1 always infect; zero, negative and NaN probabilities never do.
    pub fn try_infect<R: Rng>(&mut self, infection_probability: f64, rng: &mut R) -> bool {
        if !self.is_susceptible() || infection_probability.is_nan() || infection_probability <= 0.0
        {
            return false;
        }
        if infection_probability >= 1.0 || rng.random_bool(infection_probability) {
            self.infect();
            return true;
        }
        false
    }

    /// Infects a susceptible individual unconditionally. Used for seed cases.
    pub fn infect(&mut self) {
        if self.is_susceptible() {
            self.infection_status = InfectionStatus::Infected;
            self.infected_duration = 0;
            self.ever_hit = true;
        }
    }

    /// Advances an infected individual by one epoch, recovering it once it has been infected for
    /// more than `disease_duration` epochs. Does nothing for other individuals.
    pub fn advance_epoch(&mut self, disease_duration: u32) {
        if !self.is_infected() {
            return;
        }
        self.infected_duration += 1;
        if self.infected_duration > disease_duration {
            self.infection_status = InfectionStatus::Recovered;
        }
    }
}
