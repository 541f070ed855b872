use thiserror::Error;

// Unified error type for gwflow

#[derive(Error, Debug)]
pub enum GwError {
    #[error("process count must be positive")]
    NoProcesses,
    #[error("cannot split {requested} interior points across {procs} processes")]
    EmptyPartition { requested: usize, procs: usize },
    #[error("analytical solution undefined: 4ac - b^2 = {0} must be positive")]
    IllPosedAnalytic(f64),
    #[error("conductivity k({x}) = {k} is not positive")]
    NonPositiveConductivity { x: f64, k: f64 },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("communication error: {0}")]
    Comm(String),
    #[error("run aborted by rank {0}")]
    Aborted(usize),
    #[error("factorization error: {0}")]
    Factor(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GwError>;
