//! Loads a [`LocationGraph`] from an edge-list file.
//!
//! Every line holds one undirected edge: two non-negative integer location ids separated by
//! whitespace (any run of spaces or tabs), or by a comma for `.csv` files. Columns after the
//! second, such as weights, are ignored. Lines starting with `#` or `%` are comments and blank
//! lines are skipped.
//!
//! ```text
//! % antwerp street crossings
//! 0 1
//! 1 2
//! 2 7
//! ```

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::info;

use crate::error::ContagionError;
use crate::graph::{LocationGraph, LocationGraphBuilder};

/// Loads the edge list at `path`, picking the delimiter from the file extension.
///
/// # Errors
///
/// Returns [`ContagionError::Io`] if the file cannot be read and
/// [`ContagionError::InvalidGraph`] if a line is malformed or the file holds no edges.
pub fn load_edge_list(path: impl AsRef<Path>) -> Result<LocationGraph, ContagionError> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(OsStr::to_str) {
        Some("csv") => b',',
        _ => b' ',
    };
    let file = File::open(path)?;
    let graph = read_edge_list(file, delimiter)?;
    info!(
        "loaded {} locations and {} edges from {}",
        graph.location_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

/// Reads an edge list from `reader` using the given field delimiter. A whitespace delimiter
/// (`b' '` or `b'\t'`) accepts any run of spaces and tabs between fields.
///
/// # Errors
///
/// Returns [`ContagionError::InvalidGraph`] if a line is malformed or no edges are found.
pub fn read_edge_list(reader: impl Read, delimiter: u8) -> Result<LocationGraph, ContagionError> {
    let mut builder = LocationGraphBuilder::new();
    let mut buffered = BufReader::new(reader);
    let mut line = String::new();
    let mut line_number = 0;

    loop {
        line.clear();
        if buffered.read_line(&mut line)? == 0 {
            break;
        }
        line_number += 1;

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        let (a, b) = parse_edge(trimmed, delimiter).map_err(|message| {
            ContagionError::invalid_graph(format!("line {line_number}: {message}"))
        })?;
        builder.add_edge(a, b)?;
    }

    builder.build()
}

fn parse_edge(line: &str, delimiter: u8) -> Result<(u32, u32), String> {
    if delimiter.is_ascii_whitespace() {
        let mut fields = line.split_whitespace();
        return match (fields.next(), fields.next()) {
            (Some(a), Some(b)) => Ok((parse_location(a)?, parse_location(b)?)),
            _ => Err(format!("expected two location ids, found `{line}`")),
        };
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let record = match reader.records().next() {
        Some(record) => record.map_err(|e| e.to_string())?,
        None => return Err("expected an edge".to_string()),
    };
    if record.len() < 2 {
        return Err(format!("expected two location ids, found `{line}`"));
    }
    Ok((parse_location(&record[0])?, parse_location(&record[1])?))
}

fn parse_location(field: &str) -> Result<u32, String> {
    field
        .parse::<u32>()
        .map_err(|_| format!("`{field}` is not a location id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LocationId;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn reads_space_delimited_edges() {
        let input = "% comment\n0 1\n\n1 2\n# another comment\n2 0\n";
        let graph = read_edge_list(input.as_bytes(), b' ').unwrap();
        assert_eq!(graph.location_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.neighbors(LocationId(0)), &[LocationId(1), LocationId(2)]);
    }

    #[test]
    fn reads_tab_delimited_edges() {
        let graph = read_edge_list("0\t1\n1\t2\n".as_bytes(), b' ').unwrap();
        assert_eq!(graph.location_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbors(LocationId(1)), &[LocationId(0), LocationId(2)]);
    }

    #[test]
    fn collapses_repeated_whitespace() {
        let graph = read_edge_list("0  1\n1 \t 3\t0.25\n".as_bytes(), b' ').unwrap();
        assert_eq!(graph.location_count(), 4);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbors(LocationId(3)), &[LocationId(1)]);
    }

    #[test]
    fn loads_tab_separated_edges_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("streets.edges");
        fs::write(&path, "0\t1\n1\t2\n2\t0\n").unwrap();

        let graph = load_edge_list(&path).unwrap();
        assert_eq!(graph.location_count(), 3);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn ignores_extra_columns() {
        let input = "0,4,0.5\n4,2,1.0\n";
        let graph = read_edge_list(input.as_bytes(), b',').unwrap();
        assert_eq!(graph.location_count(), 5);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.neighbors(LocationId(1)).is_empty());
    }

    #[test]
    fn malformed_line_names_its_number() {
        let input = "0 1\n1 x\n";
        let error = read_edge_list(input.as_bytes(), b' ').unwrap_err();
        match error {
            ContagionError::InvalidGraph(message) => assert!(message.starts_with("line 2")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn single_column_is_rejected() {
        let error = read_edge_list("7\n".as_bytes(), b' ').unwrap_err();
        assert!(matches!(error, ContagionError::InvalidGraph(_)));
    }

    #[test]
    fn empty_input_is_an_invalid_graph() {
        let error = read_edge_list("# nothing here\n".as_bytes(), b' ').unwrap_err();
        assert!(matches!(error, ContagionError::InvalidGraph(_)));
    }

    #[test]
    fn loads_csv_files_by_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locations.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "0,1").unwrap();
        writeln!(file, "1,3").unwrap();
        drop(file);

        let graph = load_edge_list(&path).unwrap();
        assert_eq!(graph.location_count(), 4);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let error = load_edge_list(dir.path().join("missing.edges")).unwrap_err();
        assert!(matches!(error, ContagionError::Io(_)));
    }
}
