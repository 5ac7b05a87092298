//! Statistic logging of the solver and the scheduler.
//!
//! Statistics are written as `{prefix} {name}={value}` lines to a sink configured once per
//! process with [`configure_statistic_logging`]. Until then, logging a statistic does nothing.
use std::fmt::Display;
use std::io::stdout;
use std::io::Write;
use std::sync::Mutex;
use std::sync::OnceLock;

use convert_case::Case;
use convert_case::Casing;

pub use crate::engine::SolverStatistics;

struct StatisticSink {
    prefix: &'static str,
    after: Option<&'static str>,
    casing: Option<Case>,
    writer: Box<dyn Write + Send>,
}

static STATISTIC_SINK: OnceLock<Mutex<StatisticSink>> = OnceLock::new();

/// Configures where and how statistics are written. Only the first call has an effect.
///
/// `after` is a line written after each block of statistics; without a writer, statistics go to
/// stdout.
pub fn configure_statistic_logging(
    prefix: &'static str,
    after: Option<&'static str>,
    casing: Option<Case>,
    writer: Option<Box<dyn Write + Send>>,
) {
    let _ = STATISTIC_SINK.get_or_init(|| {
        Mutex::new(StatisticSink {
            prefix,
            after,
            casing,
            writer: writer.unwrap_or_else(|| Box::new(stdout())),
        })
    });
}

/// Whether [`configure_statistic_logging`] has been called.
pub fn should_log_statistics() -> bool {
    STATISTIC_SINK.get().is_some()
}

fn with_sink(write: impl FnOnce(&mut StatisticSink)) {
    if let Some(Ok(mut sink)) = STATISTIC_SINK.get().map(Mutex::lock) {
        write(&mut sink);
    }
}

fn statistic_name(name: impl Display, casing: Option<Case>) -> String {
    match casing {
        Some(casing) => name.to_string().to_case(casing),
        None => name.to_string(),
    }
}

/// Writes `{prefix} {name}={value}`.
pub fn log_statistic(name: impl Display, value: impl Display) {
    with_sink(|sink| {
        let name = statistic_name(name, sink.casing);
        let _ = writeln!(sink.writer, "{} {name}={value}", sink.prefix);
    });
}

/// Closes a block of statistics with the configured line, if any.
pub fn log_statistic_postfix() {
    with_sink(|sink| {
        if let Some(after) = sink.after {
            let _ = writeln!(sink.writer, "{after}");
        }
    });
}

/// A loggable statistic.
///
/// See [`create_statistics_struct!`] for creating a statistic struct automatically.
pub trait Statistic {
    fn log(&self, statistic_logger: StatisticLogger);
}

impl<Value: Display> Statistic for Value {
    fn log(&self, statistic_logger: StatisticLogger) {
        log_statistic(&statistic_logger.name, self);
    }
}

/// The name under which a [`Statistic`] is logged, e.g. `scheduler_solver_num_nodes`.
#[derive(Clone, Debug)]
pub struct StatisticLogger {
    name: String,
}

impl StatisticLogger {
    pub fn new(name: impl Display) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// The logger of a nested statistic.
    pub fn attach_to_prefix(&self, nested: impl Display) -> Self {
        Self::new(format_args!("{}_{nested}", self.name))
    }
}

/// Generates a struct of counters which logs every field under its own name.
#[macro_export]
macro_rules! create_statistics_struct {
    ($(#[$struct_documentation:meta])* $name:ident { $($(#[$variable_documentation:meta])* $field:ident : $type:ident),+ $(,)? }) => {
        $(#[$struct_documentation])*
        #[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
        pub struct $name {
            $($(#[$variable_documentation])* pub $field: $type),+
        }

        impl $crate::statistics::Statistic for $name {
            fn log(&self, statistic_logger: $crate::statistics::StatisticLogger) {
                $($crate::statistics::Statistic::log(
                    &self.$field,
                    statistic_logger.attach_to_prefix(stringify!($field)),
                ));+
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_names_are_joined_with_underscores() {
        let logger = StatisticLogger::new("scheduler").attach_to_prefix("solver");

        assert_eq!(
            logger.attach_to_prefix("num_nodes").name,
            "scheduler_solver_num_nodes"
        );
    }

    #[test]
    fn names_follow_the_configured_casing() {
        assert_eq!(statistic_name("num_nodes", None), "num_nodes");
        assert_eq!(statistic_name("num_nodes", Some(Case::Camel)), "numNodes");
        assert_eq!(statistic_name("numConflicts", Some(Case::Snake)), "num_conflicts");
    }
}
