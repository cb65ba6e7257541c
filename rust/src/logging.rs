//! Verbosity-gated logging for the analysis engine.
//!
//! Each analysis carries a verbosity in its `AnalysisConfig`. Messages below
//! that verbosity are skipped before any formatting happens; the rest go to
//! the `log` facade under the `schedule_engine` target, so the host decides
//! where they end up.
//! - 0: SILENT (nothing)
//! - 1: CHANGES (proposed reschedules, detected conflicts, compression opportunities)
//! - 2: CHECKS (per-task decisions, skipped inputs)
//! - 3: DEBUG (full pass internals)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Whether a message of `level` passes the configured `verbosity`.
#[inline]
pub fn enabled(verbosity: u8, level: u8) -> bool {
    level > VERBOSITY_SILENT && verbosity >= level
}

/// Emit at CHANGES level as `log::info!`.
///
/// Used for: leveling proposals, conflicts found, optimization summaries.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHANGES) {
            ::log::info!(target: "schedule_engine", $($arg)*);
        }
    };
}

/// Emit at CHECKS level as `log::debug!`.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_CHECKS) {
            ::log::debug!(target: "schedule_engine", $($arg)*);
        }
    };
}

/// Emit at DEBUG level as `log::trace!`.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($verbosity, $crate::logging::VERBOSITY_DEBUG) {
            ::log::trace!(target: "schedule_engine", $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_levels() {
        assert!(!enabled(VERBOSITY_SILENT, VERBOSITY_CHANGES));
        assert!(enabled(VERBOSITY_CHANGES, VERBOSITY_CHANGES));
        assert!(!enabled(VERBOSITY_CHANGES, VERBOSITY_CHECKS));
        assert!(enabled(VERBOSITY_DEBUG, VERBOSITY_CHECKS));
        // Silent is a setting, never a message level
        assert!(!enabled(VERBOSITY_DEBUG, VERBOSITY_SILENT));
    }

    #[test]
    fn test_macros_accept_format_args() {
        for verbosity in [VERBOSITY_SILENT, VERBOSITY_DEBUG] {
            log_changes!(verbosity, "{} proposals", 1);
            log_checks!(verbosity, "candidate {}", "a");
            log_debug!(verbosity, "ES={:.1}", 2.0);
        }
    }
}
