use thiserror::Error;
use vmreconf::model::ModelingError;
use vmreconf::SchedulerError;

pub(crate) type BenchResult<T> = Result<T, BenchError>;

#[derive(Error, Debug)]
pub(crate) enum BenchError {
    #[error("IO error, more details: {0}")]
    IOError(#[from] std::io::Error),
    #[error("The instance could not be generated: {0}")]
    InvalidInstance(#[from] ModelingError),
    #[error("Scheduling failed, more details: {0}")]
    Scheduling(#[from] SchedulerError),
}
