//! A data-parallel simulator of contagion spreading over a graph of locations
//!
//! A population of individuals occupies the vertices of a static, undirected
//! [`LocationGraph`]. Time advances in discrete epochs, and every epoch runs
//! three strictly ordered phases over the whole population:
//! * **movement**: each individual stays put or steps to an adjacent location,
//!   drawn uniformly from its [`NeighborhoodIndex`] entry.
//! * **infection**: each susceptible individual sharing a location with an
//!   individual that was infected at the start of the phase is exposed.
//! * **advance**: infected individuals progress towards recovery, and the
//!   number of individuals ever hit and currently infected is tallied into
//!   [`EpochStatistics`].
//!
//! The phases run either serially or partitioned across a fixed-size worker
//! pool. Each worker owns a contiguous slice of the population for writes and
//! reads other individuals only through snapshots taken at phase start, and
//! every random draw comes from a stream derived from the run seed and the
//! individual's index. Serial and parallel executions with the same seed
//! therefore produce identical statistics.
//!
//! ```no_run
//! use contagion::{ExecutionMode, LocationGraphBuilder, Simulation, SimulationConfigBuilder};
//!
//! # fn main() -> Result<(), contagion::ContagionError> {
//! let mut builder = LocationGraphBuilder::with_locations(3);
//! builder.add_edge(0, 1)?;
//! builder.add_edge(1, 2)?;
//! let graph = builder.build()?;
//!
//! let config = SimulationConfigBuilder::default()
//!     .individual_count(100)
//!     .total_epochs(30)
//!     .build()
//!     .unwrap();
//!
//! let simulation = Simulation::new(config, &graph)?;
//! let mut population = simulation.new_population(0)?;
//! let statistics = simulation.run(&mut population, ExecutionMode::Parallel);
//! println!("{:?}", statistics.last());
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod graph;
pub mod hashing;
pub mod individual;
pub mod log;
pub mod neighborhood;
pub mod random;
pub mod report;
pub mod runner;
pub mod simulation;
pub mod statistics;

pub use config::{ExposureModel, SimulationConfig, SimulationConfigBuilder};
pub use error::ContagionError;
pub use graph::{LocationGraph, LocationGraphBuilder, LocationId};
pub use individual::{Individual, InfectionStatus};
pub use neighborhood::NeighborhoodIndex;
pub use simulation::{ExecutionMode, Population, Simulation};
pub use statistics::{EpochCounts, EpochStatistics};

// Re-exports used by the `define_rng!` macro.
pub use paste;
pub use rand;
