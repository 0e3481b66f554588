use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("No arms available to select from")]
    NoArmsAvailable,
    #[error("Arm {0} not found")]
    ArmNotFound(usize),
    #[error("Sampling error: {0}")]
    SamplingError(String),
    #[error("Policy requires at least one arm")]
    InvalidArmCount,
    #[error("Horizon must be greater than zero")]
    InvalidHorizon,
    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,
    #[error("Horizon {horizon} is not a multiple of batch size {batch_size}")]
    IndivisibleHorizon { horizon: u64, batch_size: u64 },
}
