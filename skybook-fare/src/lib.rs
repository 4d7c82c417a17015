pub mod estimator;
pub mod routes;

pub use estimator::{FareCoefficients, FareEstimate, FareEstimator, FareFactors, FareInput};

#[derive(Debug, thiserror::Error)]
pub enum FareError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
