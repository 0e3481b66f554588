use super::errors::PolicyError;
use super::policy::{first_argmax, ArmStats, PolicyStats};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One round of batched pulls: `arms[i]` is pulled `pulls[i]` times. The
/// counts always sum to the policy's batch size; zero counts are allowed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAssignment {
    pub arms: Vec<usize>,
    pub pulls: Vec<u64>,
}

impl Clone for Box<dyn BatchedPolicy + Send> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub trait CloneBoxedBatchedPolicy {
    fn clone_box(&self) -> Box<dyn BatchedPolicy + Send>;
}

/// Protocol for policies that commit a whole block of pulls per round and
/// receive the rewards grouped per arm afterwards.
#[typetag::serde(tag = "type")]
pub trait BatchedPolicy: Send + CloneBoxedBatchedPolicy {
    fn select_batch(&mut self) -> Result<BatchAssignment, PolicyError>;
    /// Applies every observed reward, in list order, for each pulled arm.
    fn update_batch(
        &mut self,
        rewards_by_arm: &HashMap<usize, Vec<f64>>,
    ) -> Result<(), PolicyError>;
    fn reset(&mut self);
    fn stats(&self) -> PolicyStats;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct BatchedArm {
    mean: f64,
    pulls: u64,
}

impl BatchedArm {
    fn record(&mut self, reward: f64) {
        self.pulls += 1;
        self.mean += (reward - self.mean) / self.pulls as f64;
    }

    fn stats(&self) -> ArmStats {
        ArmStats {
            pulls: self.pulls,
            mean_reward: self.mean,
        }
    }
}

/// Explore-then-commit over batches: spread roughly `sqrt(horizon)` pulls
/// round-robin across all arms, then hand every remaining batch to the best
/// empirical arm.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExploreThenCommit {
    num_arms: usize,
    horizon: u64,
    batch_size: u64,
    arms: Vec<BatchedArm>,
    explore_budget: f64,
    explored_pulls: u64,
    cursor: usize,
}

impl ExploreThenCommit {
    pub fn new(num_arms: usize, horizon: u64, batch_size: u64) -> Result<Self, PolicyError> {
        if num_arms == 0 {
            return Err(PolicyError::InvalidArmCount);
        }
        if horizon == 0 {
            return Err(PolicyError::InvalidHorizon);
        }
        if batch_size == 0 {
            return Err(PolicyError::InvalidBatchSize);
        }
        if horizon % batch_size != 0 {
            return Err(PolicyError::IndivisibleHorizon {
                horizon,
                batch_size,
            });
        }

        debug!(
            num_arms,
            horizon, batch_size, "created batched explore-then-commit policy"
        );

        Ok(Self {
            num_arms,
            horizon,
            batch_size,
            arms: vec![BatchedArm::default(); num_arms],
            explore_budget: (horizon as f64).sqrt(),
            explored_pulls: 0,
            cursor: 0,
        })
    }
}

impl CloneBoxedBatchedPolicy for ExploreThenCommit {
    fn clone_box(&self) -> Box<dyn BatchedPolicy + Send> {
        Box::new(self.clone())
    }
}

#[typetag::serde]
impl BatchedPolicy for ExploreThenCommit {
    fn select_batch(&mut self) -> Result<BatchAssignment, PolicyError> {
        if (self.explored_pulls as f64) < self.explore_budget {
            // distribute the batch cyclically, continuing from where the
            // previous round stopped; arms outside the cycle get a zero count
            let mut pulls = vec![0u64; self.num_arms];
            for _ in 0..self.batch_size {
                pulls[self.cursor] += 1;
                self.cursor = (self.cursor + 1) % self.num_arms;
            }
            self.explored_pulls += self.batch_size;

            if (self.explored_pulls as f64) >= self.explore_budget {
                debug!(explored = self.explored_pulls, "exploration budget exhausted");
            }

            Ok(BatchAssignment {
                arms: (0..self.num_arms).collect(),
                pulls,
            })
        } else {
            let best = first_argmax(self.arms.iter().map(|arm| arm.mean))
                .ok_or(PolicyError::NoArmsAvailable)?;

            Ok(BatchAssignment {
                arms: vec![best],
                pulls: vec![self.batch_size],
            })
        }
    }

    fn update_batch(
        &mut self,
        rewards_by_arm: &HashMap<usize, Vec<f64>>,
    ) -> Result<(), PolicyError> {
        for (&arm_id, rewards) in rewards_by_arm {
            let arm = self
                .arms
                .get_mut(arm_id)
                .ok_or(PolicyError::ArmNotFound(arm_id))?;
            for &reward in rewards {
                arm.record(reward);
            }
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.arms = vec![BatchedArm::default(); self.num_arms];
        self.explored_pulls = 0;
        self.cursor = 0;
        debug!("reset batched policy");
    }

    fn stats(&self) -> PolicyStats {
        PolicyStats {
            arms: self.arms.iter().map(|arm| arm.stats()).collect(),
        }
    }
}
