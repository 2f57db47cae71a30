//! Stands in for the console logger when the `logging` feature is disabled. Only the `log`
//! crate's own max-level check remains.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
