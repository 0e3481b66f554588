use super::errors::PolicyError;
use super::policy::{first_argmax, ArmStats, CloneBoxedPolicy, Policy, PolicyStats, PolicyType};
use super::rng::MaybeSeededRng;

use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(super) struct ThompsonArm {
    pub(super) pulls: u64,
    pub(super) successes: u64,
}

impl ThompsonArm {
    // Beta(1 + successes, 1 + failures) is the posterior under a uniform prior
    pub(super) fn posterior_sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<f64, PolicyError> {
        let sample = Beta::new(
            1.0 + self.successes as f64,
            1.0 + (self.pulls - self.successes) as f64,
        )
        .map_err(|e| PolicyError::SamplingError(e.to_string()))?
        .sample(rng);

        Ok(sample)
    }

    pub(super) fn record(&mut self, reward: f64) {
        self.pulls += 1;
        if reward == 1.0 {
            self.successes += 1;
        }
    }

    pub(super) fn stats(&self) -> ArmStats {
        ArmStats {
            pulls: self.pulls,
            mean_reward: if self.pulls == 0 {
                0.0
            } else {
                self.successes as f64 / self.pulls as f64
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThompsonSampling {
    num_arms: usize,
    horizon: u64,
    arms: Vec<ThompsonArm>,
    rng: MaybeSeededRng,
}

impl ThompsonSampling {
    pub fn new(num_arms: usize, horizon: u64, seed: Option<u64>) -> Result<Self, PolicyError> {
        if num_arms == 0 {
            return Err(PolicyError::InvalidArmCount);
        }
        if horizon == 0 {
            return Err(PolicyError::InvalidHorizon);
        }

        debug!(num_arms, horizon, ?seed, "created thompson sampling policy");

        Ok(Self {
            num_arms,
            horizon,
            arms: vec![ThompsonArm::default(); num_arms],
            rng: MaybeSeededRng::new(seed),
        })
    }
}

impl CloneBoxedPolicy for ThompsonSampling {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

#[typetag::serde]
impl Policy for ThompsonSampling {
    fn policy_type(&self) -> PolicyType {
        PolicyType::ThompsonSampling {
            num_arms: self.num_arms,
            horizon: self.horizon,
            seed: self.rng.seed,
        }
    }

    fn select(&mut self) -> Result<usize, PolicyError> {
        // sample every posterior and keep the best draw
        let rng = self.rng.get_rng();
        let mut samples = Vec::with_capacity(self.arms.len());
        for arm in &self.arms {
            samples.push(arm.posterior_sample(rng)?);
        }

        first_argmax(samples).ok_or(PolicyError::NoArmsAvailable)
    }

    fn update(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.arms
            .get_mut(arm_id)
            .ok_or(PolicyError::ArmNotFound(arm_id))?
            .record(reward);

        Ok(())
    }

    fn reset(&mut self) {
        self.arms = vec![ThompsonArm::default(); self.num_arms];
        debug!("reset thompson sampling policy");
    }

    fn stats(&self) -> PolicyStats {
        PolicyStats {
            arms: self.arms.iter().map(|arm| arm.stats()).collect(),
        }
    }
}
