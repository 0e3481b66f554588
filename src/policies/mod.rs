pub mod batched;
pub mod epsilon_greedy;
pub mod errors;
pub mod kl;
pub mod kl_ucb;
pub mod many_arms;
pub mod thompson_sampling;
pub mod ucb;
mod policy;
mod rng;

pub use policy::{ArmStats, Phase, Policy, PolicyStats, PolicyType};
