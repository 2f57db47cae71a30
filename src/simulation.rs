//! The epoch loop.
//!
//! A [`Simulation`] owns the read-only state of a run (configuration, neighborhood index, worker
//! pool) and advances a [`Population`] through epochs `0..=total_epochs`. Every epoch consists of
//! three phases, each of which completes over the whole population before the next one starts:
//!
//! 1. **Movement.** Each individual moves within its neighborhood. Individuals only touch their
//!    own state.
//! 2. **Infection.** A table of infected individuals per location is built from the population as
//!    it stands at the start of the phase. Each susceptible individual is then exposed if its
//!    location holds at least one of those individuals. Infections made during the phase do not
//!    feed back into the same phase, so the result does not depend on iteration order.
//! 3. **Advance.** Infected individuals progress towards recovery and the hit and infected counts
//!    are reduced into the epoch's [`EpochCounts`].
//!
//! In [`ExecutionMode::Parallel`] each phase splits the population into `worker_count`
//! contiguous partitions, and each partition is processed by one task on the simulation's worker
//! pool. A task writes only to its own partition; the end of the parallel iterator is the barrier
//! between phases. Random draws come from streams keyed by individual index (see
//! [`crate::random`]), so serial and parallel runs of the same seed agree exactly.

use log::{debug, info, trace};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{ExposureModel, SimulationConfig};
use crate::define_rng;
use crate::error::ContagionError;
use crate::graph::{LocationGraph, LocationId};
use crate::individual::Individual;
use crate::neighborhood::NeighborhoodIndex;
use crate::random::{sample_index, RngStreams};
use crate::statistics::{EpochCounts, EpochStatistics};

define_rng!(PlacementRng);
define_rng!(MovementRng);
define_rng!(ExposureRng);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExecutionMode {
    /// All phases run on the calling thread over a single partition.
    Serial,
    /// Each phase is partitioned across the worker pool.
    Parallel,
}

/// The individuals of one run. Rebuilt from scratch for every run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Population {
    individuals: Vec<Individual>,
    /// Every individual's location is below this bound.
    location_count: usize,
}

impl Population {
    /// Places `config.individual_count` individuals uniformly at random over
    /// `0..location_count` and infects the first `config.initial_infected_count` of them.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] if more seed cases are requested than
    /// there are individuals, or if the population would be empty, and
    /// [`ContagionError::InvalidGraph`] if there are no locations.
    pub(crate) fn random(
        config: &SimulationConfig,
        location_count: usize,
        seed: u64,
    ) -> Result<Self, ContagionError> {
        if config.individual_count == 0 {
            return Err(ContagionError::invalid_configuration(
                "individual_count must be at least 1",
            ));
        }
        if config.initial_infected_count > config.individual_count {
            return Err(ContagionError::invalid_configuration(format!(
                "initial_infected_count ({}) exceeds individual_count ({})",
                config.initial_infected_count, config.individual_count
            )));
        }
        if location_count == 0 {
            return Err(ContagionError::invalid_graph("graph has no locations"));
        }

        let mut rng = RngStreams::<PlacementRng>::new(seed).setup();
        let mut individuals: Vec<Individual> = (0..config.individual_count)
            .map(|_| {
                // `location_count` is non-zero, so a location is always drawn.
                let index = sample_index(&mut rng, location_count).unwrap_or_default();
                Individual::new(LocationId(index as u32))
            })
            .collect();
        for individual in individuals.iter_mut().take(config.initial_infected_count) {
            individual.infect();
        }

        trace!(
            "placed {} individuals over {} locations, {} seed cases",
            individuals.len(),
            location_count,
            config.initial_infected_count
        );
        Ok(Population {
            individuals,
            location_count,
        })
    }

    /// Wraps individuals whose locations were chosen by the caller, checking that every
    /// location is below `location_count`.
    pub(crate) fn from_individuals(
        individuals: Vec<Individual>,
        location_count: usize,
    ) -> Result<Self, ContagionError> {
        if let Some(outside) = individuals
            .iter()
            .find(|individual| individual.location().index() >= location_count)
        {
            return Err(ContagionError::invalid_configuration(format!(
                "individual placed on location {} outside the graph",
                outside.location()
            )));
        }
        Ok(Population {
            individuals,
            location_count,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Current hit and infected counts, without advancing anything.
    #[must_use]
    pub fn counts(&self) -> EpochCounts {
        self.individuals
            .iter()
            .map(|individual| {
                EpochCounts::of_individual(individual.is_hit(), individual.is_infected())
            })
            .sum()
    }
}

/// The random streams used during one run.
#[derive(Copy, Clone)]
struct RunStreams {
    movement: RngStreams<MovementRng>,
    exposure: RngStreams<ExposureRng>,
}

impl RunStreams {
    fn new(seed: u64) -> Self {
        RunStreams {
            movement: RngStreams::new(seed),
            exposure: RngStreams::new(seed),
        }
    }
}

pub struct Simulation {
    config: SimulationConfig,
    neighborhoods: NeighborhoodIndex,
    pool: ThreadPool,
}

impl Simulation {
    /// Validates `config`, derives the neighborhood index from `graph` and starts the worker
    /// pool. The graph is not needed once this returns.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] or [`ContagionError::InvalidGraph`] if
    /// either input is unusable, and [`ContagionError::WorkerPool`] if the threads cannot be
    /// spawned.
    pub fn new(config: SimulationConfig, graph: &LocationGraph) -> Result<Self, ContagionError> {
        config.validate()?;
        let neighborhoods = NeighborhoodIndex::build(graph)?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_count)
            .thread_name(|index| format!("contagion-worker-{index}"))
            .build()?;

        debug!(
            "simulation ready: {} individuals, {} locations, {} workers",
            config.individual_count,
            neighborhoods.location_count(),
            config.worker_count
        );
        Ok(Simulation {
            config,
            neighborhoods,
            pool,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn neighborhoods(&self) -> &NeighborhoodIndex {
        &self.neighborhoods
    }

    /// A fresh random population for a run seeded with `seed`. Individuals are placed uniformly
    /// over the graph and the first `initial_infected_count` of them are infected.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] if more seed cases are requested than
    /// there are individuals.
    pub fn new_population(&self, seed: u64) -> Result<Population, ContagionError> {
        Population::random(&self.config, self.neighborhoods.location_count(), seed)
    }

    /// A population of individuals placed by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] if an individual stands on a location
    /// that is not in this simulation's graph.
    pub fn population_from(
        &self,
        individuals: Vec<Individual>,
    ) -> Result<Population, ContagionError> {
        Population::from_individuals(individuals, self.neighborhoods.location_count())
    }

    /// Checks that `population` fits this simulation's graph. Populations built by this
    /// simulation always do; one built by a simulation over a larger graph may not.
    ///
    /// # Errors
    ///
    /// Returns [`ContagionError::InvalidConfiguration`] if the population spans more locations
    /// than the graph has.
    pub fn check_population(&self, population: &Population) -> Result<(), ContagionError> {
        let location_count = self.neighborhoods.location_count();
        if population.location_count > location_count {
            return Err(ContagionError::invalid_configuration(format!(
                "population spans {} locations but the graph has {}",
                population.location_count, location_count
            )));
        }
        Ok(())
    }

    /// Runs every epoch with the configured random seed.
    ///
    /// # Panics
    ///
    /// Panics if `population` does not pass [`Self::check_population`].
    pub fn run(&self, population: &mut Population, mode: ExecutionMode) -> EpochStatistics {
        self.run_with_seed(population, mode, self.config.random_seed)
    }

    /// Like [`Self::run`], but reports a population that does not fit the graph as an error
    /// instead of panicking.
    ///
    /// # Errors
    ///
    /// See [`Self::check_population`].
    pub fn try_run(
        &self,
        population: &mut Population,
        mode: ExecutionMode,
    ) -> Result<EpochStatistics, ContagionError> {
        self.check_population(population)?;
        Ok(self.run(population, mode))
    }

    /// Runs epochs `0..=total_epochs`, drawing every random number from streams derived from
    /// `seed`, and returns one [`EpochCounts`] per epoch.
    ///
    /// # Panics
    ///
    /// Panics if `population` does not pass [`Self::check_population`].
    pub fn run_with_seed(
        &self,
        population: &mut Population,
        mode: ExecutionMode,
        seed: u64,
    ) -> EpochStatistics {
        let total_epochs = self.config.total_epochs;
        info!(
            "running {} epochs over {} individuals ({:?}, seed {})",
            u64::from(total_epochs) + 1,
            population.len(),
            mode,
            seed
        );

        let mut statistics = EpochStatistics::with_capacity(total_epochs as usize + 1);
        for epoch in 0..=total_epochs {
            statistics.push(self.run_epoch_with_seed(population, epoch, mode, seed));
        }

        if let Some(last) = statistics.last() {
            info!(
                "finished: {} hit, {} infected after epoch {}",
                last.hit_count, last.infected_count, last.epoch
            );
        }
        statistics
    }

    /// Runs the three phases of a single epoch using the configured random seed.
    ///
    /// # Panics
    ///
    /// Panics if `population` does not pass [`Self::check_population`].
    pub fn run_epoch(
        &self,
        population: &mut Population,
        epoch: u32,
        mode: ExecutionMode,
    ) -> EpochCounts {
        self.run_epoch_with_seed(population, epoch, mode, self.config.random_seed)
    }

    fn run_epoch_with_seed(
        &self,
        population: &mut Population,
        epoch: u32,
        mode: ExecutionMode,
        seed: u64,
    ) -> EpochCounts {
        if let Err(error) = self.check_population(population) {
            panic!("{error}");
        }
        let streams = RunStreams::new(seed);
        let individuals = population.individuals.as_mut_slice();

        trace!("epoch {epoch}: movement phase");
        self.movement_phase(individuals, epoch, mode, streams);
        trace!("epoch {epoch}: infection phase");
        self.infection_phase(individuals, epoch, mode, streams);
        trace!("epoch {epoch}: advance phase");
        let counts = EpochCounts {
            epoch,
            ..self.advance_phase(individuals, mode)
        };

        debug!(
            "epoch {}: {} hit, {} infected",
            epoch, counts.hit_count, counts.infected_count
        );
        counts
    }

    fn movement_phase(
        &self,
        individuals: &mut [Individual],
        epoch: u32,
        mode: ExecutionMode,
        streams: RunStreams,
    ) {
        let neighborhoods = &self.neighborhoods;
        self.for_each_partition(individuals, mode, |offset, partition| {
            for (index, individual) in (offset..).zip(partition.iter_mut()) {
                let mut rng = streams.movement.get(epoch, index);
                individual.move_within(&neighborhoods[individual.location()], &mut rng);
            }
        });
    }

    fn infection_phase(
        &self,
        individuals: &mut [Individual],
        epoch: u32,
        mode: ExecutionMode,
        streams: RunStreams,
    ) {
        // Built before any write of this phase; the only view of other individuals.
        let infected_here = self.infected_per_location(individuals, mode);
        let probability = self.config.infection_probability;
        let exposure_model = self.config.exposure_model;

        self.for_each_partition(individuals, mode, |offset, partition| {
            for (index, individual) in (offset..).zip(partition.iter_mut()) {
                if !individual.is_susceptible() {
                    continue;
                }
                let contacts = infected_here[individual.location().index()];
                if contacts == 0 {
                    continue;
                }
                let attempts = match exposure_model {
                    ExposureModel::SingleExposure => 1,
                    ExposureModel::PerContact => contacts,
                };
                let mut rng = streams.exposure.get(epoch, index);
                for _ in 0..attempts {
                    if individual.try_infect(probability, &mut rng) {
                        break;
                    }
                }
            }
        });
    }

    fn advance_phase(&self, individuals: &mut [Individual], mode: ExecutionMode) -> EpochCounts {
        let disease_duration = self.config.disease_duration_threshold;
        self.sum_over_partitions(individuals, mode, |_, partition| {
            partition
                .iter_mut()
                .map(|individual| {
                    individual.advance_epoch(disease_duration);
                    EpochCounts::of_individual(individual.is_hit(), individual.is_infected())
                })
                .sum()
        })
    }

    /// Number of infected individuals standing on each location.
    fn infected_per_location(&self, individuals: &[Individual], mode: ExecutionMode) -> Vec<u32> {
        let location_count = self.neighborhoods.location_count();
        let count_partition = |partition: &[Individual]| {
            let mut counts = vec![0_u32; location_count];
            for individual in partition.iter().filter(|individual| individual.is_infected()) {
                counts[individual.location().index()] += 1;
            }
            counts
        };

        match mode {
            ExecutionMode::Serial => count_partition(individuals),
            ExecutionMode::Parallel => {
                let chunk_size = self.partition_size(individuals.len());
                self.pool.install(|| {
                    individuals
                        .par_chunks(chunk_size)
                        .map(count_partition)
                        .reduce(
                            || vec![0_u32; location_count],
                            |mut total, partial| {
                                for (sum, count) in total.iter_mut().zip(partial) {
                                    *sum += count;
                                }
                                total
                            },
                        )
                })
            }
        }
    }

    /// Size of each contiguous partition when `len` individuals are split across the workers.
    fn partition_size(&self, len: usize) -> usize {
        len.div_ceil(self.config.worker_count).max(1)
    }

    /// Applies `op` to every partition of `individuals`. `op` receives the index of the
    /// partition's first individual and exclusive access to the partition.
    fn for_each_partition<F>(&self, individuals: &mut [Individual], mode: ExecutionMode, op: F)
    where
        F: Fn(usize, &mut [Individual]) + Send + Sync,
    {
        match mode {
            ExecutionMode::Serial => op(0, individuals),
            ExecutionMode::Parallel => {
                let chunk_size = self.partition_size(individuals.len());
                self.pool.install(|| {
                    individuals
                        .par_chunks_mut(chunk_size)
                        .enumerate()
                        .for_each(|(chunk, partition)| op(chunk * chunk_size, partition));
                });
            }
        }
    }

    /// Like [`Self::for_each_partition`], summing the partial counts returned by each partition.
    fn sum_over_partitions<F>(
        &self,
        individuals: &mut [Individual],
        mode: ExecutionMode,
        op: F,
    ) -> EpochCounts
    where
        F: Fn(usize, &mut [Individual]) -> EpochCounts + Send + Sync,
    {
        match mode {
            ExecutionMode::Serial => op(0, individuals),
            ExecutionMode::Parallel => {
                let chunk_size = self.partition_size(individuals.len());
                self.pool.install(|| {
                    individuals
                        .par_chunks_mut(chunk_size)
                        .enumerate()
                        .map(|(chunk, partition)| op(chunk * chunk_size, partition))
                        .sum()
                })
            }
        }
    }
}
