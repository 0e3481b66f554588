use super::errors::PolicyError;
use super::kl::solve_q_for_divergence;
use super::policy::{
    first_argmax, ArmStats, CloneBoxedPolicy, Phase, Policy, PolicyStats, PolicyType,
};

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct KlUcbArm {
    mean: f64,
    pulls: u64,
    index: f64,
}

impl KlUcbArm {
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

impl Default for KlUcbArm {
    fn default() -> Self {
        // fresh arms carry the most optimistic index
        Self {
            mean: 0.0,
            pulls: 0,
            index: 1.0,
        }
    }
}

// Upper confidence bounds from the Bernoulli divergence, solved numerically
// per arm on every update.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KlUcb {
    num_arms: usize,
    horizon: u64,
    arms: Vec<KlUcbArm>,
    phase: Phase,
    rounds: u64,
}

impl KlUcb {
    pub fn new(num_arms: usize, horizon: u64) -> Result<Self, PolicyError> {
        if num_arms == 0 {
            return Err(PolicyError::InvalidArmCount);
        }
        if horizon == 0 {
            return Err(PolicyError::InvalidHorizon);
        }

        debug!(num_arms, horizon, "created kl-ucb policy");

        Ok(Self {
            num_arms,
            horizon,
            arms: vec![KlUcbArm::default(); num_arms],
            phase: Phase::new(),
            rounds: 0,
        })
    }
}

impl CloneBoxedPolicy for KlUcb {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

#[typetag::serde]
impl Policy for KlUcb {
    fn policy_type(&self) -> PolicyType {
        PolicyType::KlUcb {
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
        self.rounds += 1;

        // the phase was already advanced by the preceding select, so the
        // update for the last forced pull takes the per-arm branch
        if self.phase.is_exploring() {
            let log_term = ((self.rounds + 2) as f64).ln();
            let level = (log_term + 3.0 * log_term.ln()) / 2.0;
            for arm in self.arms.iter_mut() {
                arm.index = solve_q_for_divergence(arm.mean, level);
            }
        } else {
            let log_term = ((self.rounds + 1) as f64).ln();
            let numerator = log_term + 3.0 * log_term.ln();
            for arm in self.arms.iter_mut() {
                arm.index = solve_q_for_divergence(arm.mean, numerator / arm.pulls as f64);
            }
        }

        Ok(())
    }

    fn reset(&mut self) {
        self.arms = vec![KlUcbArm::default(); self.num_arms];
        self.phase = Phase::new();
        self.rounds = 0;
        debug!("reset kl-ucb policy");
    }

    fn stats(&self) -> PolicyStats {
        PolicyStats {
            arms: self.arms.iter().map(|arm| arm.stats()).collect(),
        }
    }
}
