use super::errors::PolicyError;
use super::policy::{
    first_argmax, ArmStats, CloneBoxedPolicy, Phase, Policy, PolicyStats, PolicyType,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct UcbArm {
    mean: f64,
    pulls: u64,
    index: f64,
}

impl UcbArm {
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

// Hoeffding-style upper confidence bound over Bernoulli arms.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ucb {
    num_arms: usize,
    horizon: u64,
    arms: Vec<UcbArm>,
    phase: Phase,
    total_pulls: u64,
}

impl Ucb {
    pub fn new(num_arms: usize, horizon: u64) -> Result<Self, PolicyError> {
        if num_arms == 0 {
            return Err(PolicyError::InvalidArmCount);
        }
        if horizon == 0 {
            return Err(PolicyError::InvalidHorizon);
        }

        debug!(num_arms, horizon, "created ucb policy");

        Ok(Self {
            num_arms,
            horizon,
            arms: vec![UcbArm::default(); num_arms],
            phase: Phase::new(),
            total_pulls: 0,
        })
    }
}

impl CloneBoxedPolicy for Ucb {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

#[typetag::serde]
impl Policy for Ucb {
    fn policy_type(&self) -> PolicyType {
        PolicyType::Ucb {
            num_arms: self.num_arms,
            horizon: self.horizon,
        }
    }

    fn select(&mut self) -> Result<usize, PolicyError> {
        if let Some(arm_id) = self.phase.next_forced(self.num_arms) {
            return Ok(arm_id);
        }

        first_argmax(self.arms.iter().map(|arm| arm.index)).ok_or(PolicyError::NoArmsAvailable)
    }

    fn update(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.arms
            .get_mut(arm_id)
            .ok_or(PolicyError::ArmNotFound(arm_id))?
            .record(reward);
        self.total_pulls += 1;

        // refresh the index of every pulled arm; unpulled arms keep index zero
        let exploration = 2.0 * ((self.total_pulls + 1) as f64).ln();
        for arm in self.arms.iter_mut().filter(|arm| arm.pulls > 0) {
            arm.index = arm.mean + (exploration / arm.pulls as f64).sqrt();
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.arms = vec![UcbArm::default(); self.num_arms];
        self.phase = Phase::new();
        self.total_pulls = 0;
        debug!("reset ucb policy");
    }

    fn stats(&self) -> PolicyStats {
        PolicyStats {
            arms: self.arms.iter().map(|arm| arm.stats()).collect(),
        }
    }
}
