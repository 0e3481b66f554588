//! Bernoulli multi-armed bandit policies with a common trait interface.
//!
//! Every policy tracks a fixed set of arms over a known horizon and exposes the
//! same loop: [`Policy::select`] picks the arm to pull next, [`Policy::update`]
//! feeds the observed reward back in. Rewards are Bernoulli: `1.0` is a
//! success, anything else counts as a failure.
//!
//! Available policies:
//! - [`Ucb`]: Hoeffding-style upper confidence bounds.
//! - [`KlUcb`]: KL-divergence confidence bounds, tighter for Bernoulli rewards.
//! - [`ThompsonSampling`]: Beta-Bernoulli posterior sampling.
//! - [`ManyArmsThompson`]: Thompson sampling that resamples only a sqrt-sized
//!   subset of arms per round, for regimes where arms outnumber pulls.
//! - [`EpsilonGreedy`]: uniform exploration with probability epsilon.
//! - [`ExploreThenCommit`]: batched explore-then-commit for settings where
//!   pulls are assigned in batches rather than one at a time.
//!
//! Policies are built directly or through [`PolicyType`], which validates the
//! parameters and boxes the policy behind the trait:
//!
//! ```
//! use bernoulli_bandits::{Policy, PolicyType};
//!
//! let mut policy = PolicyType::Ucb { num_arms: 3, horizon: 30 }.into_inner()?;
//!
//! // the first rounds pull each arm once
//! for reward in [1.0, 0.0, 0.0] {
//!     let arm_id = policy.select()?;
//!     policy.update(arm_id, reward)?;
//! }
//!
//! // afterwards the policy favors the best observed arm
//! assert_eq!(policy.select()?, 0);
//! # Ok::<(), bernoulli_bandits::PolicyError>(())
//! ```
//!
//! Boxed policies serialize with the concrete type tagged inline, so a
//! `Box<dyn Policy + Send>` round-trips through serde without the caller
//! knowing which policy it holds.

#![forbid(unsafe_code)]

pub mod policies;

pub use policies::batched::{BatchAssignment, BatchedPolicy, ExploreThenCommit};
pub use policies::epsilon_greedy::EpsilonGreedy;
pub use policies::errors::PolicyError;
pub use policies::kl_ucb::KlUcb;
pub use policies::many_arms::ManyArmsThompson;
pub use policies::thompson_sampling::ThompsonSampling;
pub use policies::ucb::Ucb;
pub use policies::{ArmStats, Phase, Policy, PolicyStats, PolicyType};
