//! Diagnostic logging for the simulator.
//!
//! The engine narrates what it does through the `log` macros re-exported here: graph loading and
//! run boundaries at `info`, per-epoch counts at `debug`, and every phase of every epoch at
//! `trace`. Simulation results are not logged; they go through [`crate::report`].
//!
//! Nothing is printed until a level is chosen. The `contagion` binary takes `--log-level`, and
//! library users call [`set_log_level`], [`set_module_filter`] or [`apply_log_spec`]:
//!
//! ```rust
//! use contagion::log::{apply_log_spec, set_log_level, set_module_filter, LevelFilter};
//!
//! // Run boundaries only, but follow the epoch loop phase by phase.
//! set_log_level(LevelFilter::Info);
//! set_module_filter("contagion::simulation", LevelFilter::Trace);
//!
//! // The same thing in `--log-level` syntax.
//! apply_log_spec("info,contagion::simulation=trace").unwrap();
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn, LevelFilter};
#[cfg(feature = "logging")]
use log4rs::Handle;

use crate::error::ContagionError;
use crate::hashing::{HashMap, HashMapExt};

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The installed filters. Every change is pushed to the global logger by `set_config`, which
/// the enabled backend (`standard_logger` or `null_logger`) provides.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Applies to every module without its own filter. `Off` by default.
    pub(in crate::log) global_log_level: LevelFilter,
    /// Module path, e.g. `"contagion::simulation"`, to its maximum level.
    pub(in crate::log) module_filters: HashMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        LogConfiguration {
            global_log_level: LevelFilter::Off,
            module_filters: HashMap::new(),
            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    /// Records a module filter. Returns whether anything changed.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        self.module_filters.insert(module.to_string(), level) != Some(level)
    }

    /// Applies `spec` and reinstalls the logger once, whatever the number of filters.
    fn apply(&mut self, spec: &LogSpec) {
        for (module, level) in &spec.module_filters {
            self.insert_module_filter(module, *level);
        }
        self.global_log_level = spec.global_level();
        self.set_config();
    }
}

/// A parsed `--log-level` value: an optional bare level and any number of `module=level` pairs,
/// separated by commas.
#[derive(Debug, Default, PartialEq)]
pub struct LogSpec {
    pub global: Option<LevelFilter>,
    pub module_filters: Vec<(String, LevelFilter)>,
}

impl LogSpec {
    /// Module filters alone still need the root logger to let something through, so they imply
    /// a global level of `Error`.
    fn global_level(&self) -> LevelFilter {
        match self.global {
            Some(level) => level,
            None if self.module_filters.is_empty() => LevelFilter::Off,
            None => LevelFilter::Error,
        }
    }
}

impl FromStr for LogSpec {
    type Err = ContagionError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut parsed = LogSpec::default();
        for part in spec.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.split_once('=') {
                Some((module, level)) => parsed
                    .module_filters
                    .push((module.trim().to_string(), parse_level(level)?)),
                None => parsed.global = Some(parse_level(part)?),
            }
        }
        Ok(parsed)
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, ContagionError> {
    let level = level.trim();
    LevelFilter::from_str(level)
        .map_err(|_| ContagionError::invalid_configuration(format!("unknown log level `{level}`")))
}

fn log_configuration() -> MutexGuard<'static, LogConfiguration> {
    // A panic while holding the lock cannot leave the filters half-written.
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Shows every message. Same as `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Silences every module that has no filter of its own.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

pub fn set_log_level(level: LevelFilter) {
    let mut config = log_configuration();
    config.global_log_level = level;
    config.set_config();
}

/// Overrides the global level for `module_path` and everything below it.
pub fn set_module_filter(module_path: &str, level: LevelFilter) {
    set_module_filters(&[(module_path, level)]);
}

pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    let mut config = log_configuration();
    let mut changed = false;
    for (module, level) in module_filters {
        changed |= config.insert_module_filter(module, *level);
    }
    if changed {
        config.set_config();
    }
}

/// Drops the filter for `module_path`, which then follows the global level again.
pub fn remove_module_filter(module_path: &str) {
    let mut config = log_configuration();
    if config.module_filters.remove(module_path).is_some() {
        config.set_config();
    }
}

/// Parses and applies a `--log-level` value such as `"info"` or
/// `"warn,contagion::simulation=trace"`. Nothing is changed if any part fails to parse.
///
/// # Errors
///
/// Returns [`ContagionError::InvalidConfiguration`] naming the first unknown level.
pub fn apply_log_spec(spec: &str) -> Result<(), ContagionError> {
    let spec: LogSpec = spec.parse()?;
    log_configuration().apply(&spec);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The configuration is global, so these tests take turns.
    static SERIAL: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    fn reset() {
        let mut config = log_configuration();
        config.module_filters.clear();
        config.global_log_level = LevelFilter::Off;
        config.set_config();
    }

    #[test]
    fn global_level_round_trips() {
        let _turn = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        set_log_level(LevelFilter::Error);
        assert_eq!(log_configuration().global_log_level, LevelFilter::Error);
        error!("global level set to error");
        trace!("not emitted");

        enable_logging();
        assert_eq!(log_configuration().global_log_level, LevelFilter::Trace);
        disable_logging();
        assert_eq!(log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn module_filters_are_added_and_removed() {
        let _turn = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        reset();
        set_module_filters(&[
            ("contagion::simulation", LevelFilter::Error),
            ("contagion::graph", LevelFilter::Debug),
        ]);
        set_module_filter("contagion::graph", LevelFilter::Info);
        {
            let config = log_configuration();
            assert_eq!(config.module_filters.len(), 2);
            assert_eq!(
                config.module_filters.get("contagion::graph"),
                Some(&LevelFilter::Info)
            );
        }

        remove_module_filter("contagion::simulation");
        remove_module_filter("contagion::not_a_module");
        assert_eq!(
            log_configuration().module_filters.keys().collect::<Vec<_>>(),
            vec!["contagion::graph"]
        );
        reset();
    }

    #[test]
    fn parses_log_specs() {
        let spec: LogSpec = "warn, contagion::simulation=TRACE,".parse().unwrap();
        assert_eq!(spec.global, Some(LevelFilter::Warn));
        assert_eq!(
            spec.module_filters,
            vec![("contagion::simulation".to_string(), LevelFilter::Trace)]
        );

        let modules_only: LogSpec = "contagion::runner=info".parse().unwrap();
        assert_eq!(modules_only.global_level(), LevelFilter::Error);
        assert_eq!(LogSpec::default().global_level(), LevelFilter::Off);
        assert!("loud".parse::<LogSpec>().is_err());
    }

    #[test]
    fn invalid_spec_changes_nothing() {
        let _turn = SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        reset();
        apply_log_spec("warn,contagion::simulation=trace").unwrap();
        assert!(apply_log_spec("off,contagion::graph=chatty").is_err());
        {
            let config = log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Warn);
            assert_eq!(config.module_filters.len(), 1);
        }
        reset();
    }
}
