//! Output files and console summaries of a finished run.

use std::ffi::OsStr;
use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;
use log::info;
use serde::Serialize;

use crate::error::ContagionError;
use crate::graph::LocationGraph;
use crate::statistics::EpochStatistics;

// Checks that the path is valid. Creates the file and all parent directories if
// they do not exist.
fn create_output_file(path: &Path, extension: &str) -> Result<File, ContagionError> {
    if path.extension().and_then(OsStr::to_str) != Some(extension) {
        return Err(ContagionError::invalid_configuration(format!(
            "{} must have a .{extension} extension",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Writes one `epoch,hit_count,infected_count` row per epoch.
///
/// # Errors
///
/// Returns an error if `path` does not end in `.csv` or the file cannot be written.
pub fn write_statistics_csv(
    path: impl AsRef<Path>,
    statistics: &EpochStatistics,
) -> Result<(), ContagionError> {
    let path = path.as_ref();
    let mut writer = Writer::from_writer(create_output_file(path, "csv")?);
    for counts in statistics {
        writer.serialize(counts)?;
    }
    writer.flush()?;
    info!("wrote {} epochs to {}", statistics.len(), path.display());
    Ok(())
}

/// Writes the graph as an undirected Graphviz document.
///
/// # Errors
///
/// Returns an error if `path` does not end in `.dot` or the file cannot be written.
pub fn write_graphviz(path: impl AsRef<Path>, graph: &LocationGraph) -> Result<(), ContagionError> {
    let path = path.as_ref();
    let mut out = BufWriter::new(create_output_file(path, "dot")?);
    writeln!(out, "graph {{")?;
    for location in graph.locations().filter(|&location| graph.degree(location) == 0) {
        writeln!(out, "  {location};")?;
    }
    for (a, b) in graph.edges() {
        writeln!(out, "  {a} -- {b};")?;
    }
    writeln!(out, "}}")?;
    out.flush()?;
    info!(
        "wrote {} locations and {} edges to {}",
        graph.location_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

/// Headline numbers of a run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct EpidemicSummary {
    pub individual_count: usize,
    pub epochs: usize,
    pub final_hit_count: usize,
    pub final_infected_count: usize,
    /// Fraction of the population that was ever infected.
    pub attack_rate: f64,
    pub peak_infected_count: usize,
    pub peak_epoch: u32,
}

impl EpidemicSummary {
    /// Returns `None` for a run with no epochs.
    #[must_use]
    pub fn from_statistics(individual_count: usize, statistics: &EpochStatistics) -> Option<Self> {
        let last = statistics.last()?;
        let peak = statistics.peak_infected()?;
        #[allow(clippy::cast_precision_loss)]
        let attack_rate = if individual_count == 0 {
            0.0
        } else {
            last.hit_count as f64 / individual_count as f64
        };
        Some(EpidemicSummary {
            individual_count,
            epochs: statistics.len(),
            final_hit_count: last.hit_count,
            final_infected_count: last.infected_count,
            attack_rate,
            peak_infected_count: peak.infected_count,
            peak_epoch: peak.epoch,
        })
    }
}

impl fmt::Display for EpidemicSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<22}{}", "individuals", self.individual_count)?;
        writeln!(f, "{:<22}{}", "epochs", self.epochs)?;
        writeln!(f, "{:<22}{}", "ever infected", self.final_hit_count)?;
        writeln!(f, "{:<22}{}", "infected at end", self.final_infected_count)?;
        writeln!(f, "{:<22}{:.1}%", "attack rate", self.attack_rate * 100.0)?;
        write!(
            f,
            "{:<22}{} (epoch {})",
            "peak infected", self.peak_infected_count, self.peak_epoch
        )
    }
}
