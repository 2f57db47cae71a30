//! Simulation parameters.
//!
//! A [`SimulationConfig`] enumerates every option the engine recognizes. It can be assembled in
//! code with [`SimulationConfigBuilder`] (unset fields take their defaults), loaded from a JSON
//! file with [`SimulationConfig::from_json_file`] (missing keys take their defaults), and is
//! checked with [`SimulationConfig::validate`] before a simulation is constructed.
//!
//! ```json
//! {
//!     "individual_count": 5000,
//!     "total_epochs": 30,
//!     "worker_count": 4,
//!     "initial_infected_count": 3,
//!     "disease_duration_threshold": 7,
//!     "infection_probability": 0.8
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ContagionError;

/// How a susceptible individual is exposed to the infected individuals sharing its location.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExposureModel {
    /// One infection attempt per epoch if any co-located individual is infected.
    #[default]
    SingleExposure,
    /// One infection attempt per co-located infected individual, stopping at the first success.
    PerContact,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of individuals in the population.
    #[builder(default = "400")]
    pub individual_count: usize,

    /// Index of the last simulated epoch; epochs `0..=total_epochs` are run.
    #[builder(default = "60")]
    pub total_epochs: u32,

    /// Number of threads in the worker pool used by parallel execution.
    #[builder(default = "4")]
    pub worker_count: usize,

    /// Number of individuals infected before the first epoch.
    #[builder(default = "1")]
    pub initial_infected_count: usize,

    /// An infected individual recovers once it has been infected for more than this many epochs.
    #[builder(default = "7")]
    pub disease_duration_threshold: u32,

    /// Probability that a single exposure infects a susceptible individual.
    #[builder(default = "1.0")]
    pub infection_probability: f64,

    #[builder(default = "ExposureModel::SingleExposure")]
    pub exposure_model: ExposureModel,

    /// Base seed from which every random stream of a run is derived.
    #[builder(default = "0")]
    pub random_seed: u64,

    /// Number of times the driver repeats each execution when timing it.
    #[builder(default = "10")]
    pub repeat_count: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            individual_count: 400,
            total_epochs: 60,
            worker_count: 4,
            initial_infected_count: 1,
            disease_duration_threshold: 7,
            infection_probability: 1.0,
            exposure_model: ExposureModel::SingleExposure,
            random_seed: 0,
            repeat_count: 10,
        }
    }
}

impl SimulationConfig {
    /// Reads a configuration from a JSON file. Keys that are absent take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::Io`] if the file cannot be opened and [`ContagionError::Json`]
    /// if it does not hold a valid configuration object.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ContagionError> {
        let file = File::open(path)?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Checks every option against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] describing the first violation.
    pub fn validate(&self) -> Result<(), ContagionError> {
        if self.individual_count == 0 {
            return Err(ContagionError::invalid_configuration(
                "individual_count must be at least 1",
            ));
        }
        if self.worker_count == 0 {
            return Err(ContagionError::invalid_configuration(
                "worker_count must be at least 1",
            ));
        }
        if self.initial_infected_count > self.individual_count {
            return Err(ContagionError::invalid_configuration(format!(
                "initial_infected_count ({}) exceeds individual_count ({})",
                self.initial_infected_count, self.individual_count
            )));
        }
        if self.disease_duration_threshold == 0 {
            return Err(ContagionError::invalid_configuration(
                "disease_duration_threshold must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.infection_probability) {
            return Err(ContagionError::invalid_configuration(format!(
                "infection_probability ({}) must lie in [0, 1]",
                self.infection_probability
            )));
        }
        if self.repeat_count == 0 {
            return Err(ContagionError::invalid_configuration(
                "repeat_count must be at least 1",
            ));
        }
        Ok(())
    }
}
