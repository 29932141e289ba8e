//! Logging macros for the timeline engine with verbosity level control.
//!
//! Output goes to stderr and costs nothing when the level is disabled.
//! Verbosity levels:
//! - 0: SILENT (only errors)
//! - 1: CHANGES (store mutations, load/persist summaries)
//! - 2: PASSES (graph build and CPM pass summaries)
//! - 3: DEBUG (per-node timings)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_PASSES: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log an error regardless of verbosity.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        eprintln!("[timeline-cpm] error: {}", format_args!($($arg)*));
    };
}

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: created/updated/deleted entities, cascade counts, hydration.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!($($arg)*);
        }
    };
}

/// Log at PASSES level (verbosity >= 2).
///
/// Used for: graph sizes, boundary nodes, project duration.
#[macro_export]
macro_rules! log_passes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_PASSES {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}
