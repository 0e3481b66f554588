use super::errors::PolicyError;
use super::policy::{first_argmax, ArmStats, CloneBoxedPolicy, Policy, PolicyStats, PolicyType};
use super::rng::MaybeSeededRng;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct EpsilonGreedyArm {
    mean: f64,
    pulls: u64,
}

impl EpsilonGreedyArm {
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

// Baseline policy: explore a uniformly random arm with probability epsilon,
// otherwise pull the best empirical arm.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpsilonGreedy {
    num_arms: usize,
    horizon: u64,
    epsilon: f64,
    arms: Vec<EpsilonGreedyArm>,
    rng: MaybeSeededRng,
}

impl EpsilonGreedy {
    pub fn new(
        num_arms: usize,
        horizon: u64,
        epsilon: f64,
        seed: Option<u64>,
    ) -> Result<Self, PolicyError> {
        if num_arms == 0 {
            return Err(PolicyError::InvalidArmCount);
        }
        if horizon == 0 {
            return Err(PolicyError::InvalidHorizon);
        }

        debug!(num_arms, horizon, epsilon, ?seed, "created epsilon greedy policy");

        Ok(Self {
            num_arms,
            horizon,
            epsilon,
            arms: vec![EpsilonGreedyArm::default(); num_arms],
            rng: MaybeSeededRng::new(seed),
        })
    }
}

impl CloneBoxedPolicy for EpsilonGreedy {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

#[typetag::serde]
impl Policy for EpsilonGreedy {
    fn policy_type(&self) -> PolicyType {
        PolicyType::EpsilonGreedy {
            num_arms: self.num_arms,
            horizon: self.horizon,
            epsilon: self.epsilon,
            seed: self.rng.seed,
        }
    }

    fn select(&mut self) -> Result<usize, PolicyError> {
        let rng = self.rng.get_rng();
        if rng.random::<f64>() < self.epsilon {
            return Ok(rng.random_range(0..self.num_arms));
        }

        first_argmax(self.arms.iter().map(|arm| arm.mean)).ok_or(PolicyError::NoArmsAvailable)
    }

    fn update(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError> {
        self.arms
            .get_mut(arm_id)
            .ok_or(PolicyError::ArmNotFound(arm_id))?
            .record(reward);

        Ok(())
    }

    fn reset(&mut self) {
        self.arms = vec![EpsilonGreedyArm::default(); self.num_arms];
        debug!("reset epsilon greedy policy");
    }

    fn stats(&self) -> PolicyStats {
        PolicyStats {
            arms: self.arms.iter().map(|arm| arm.stats()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 1234;

    fn make_policy(epsilon: f64) -> EpsilonGreedy {
        EpsilonGreedy::new(3, 30, epsilon, Some(SEED)).unwrap()
    }

    #[test]
    fn rejects_zero_arms() {
        assert!(matches!(
            EpsilonGreedy::new(0, 30, 0.1, Some(SEED)),
            Err(PolicyError::InvalidArmCount)
        ));
    }

    #[test]
    fn greedy_when_epsilon_is_zero() {
        let mut policy = make_policy(0.0);
        policy.arms[1].mean = 1.0;

        for _ in 0..10 {
            assert_eq!(policy.select().unwrap(), 1);
        }
    }

    #[test]
    fn ties_break_to_first_arm() {
        let mut policy = make_policy(0.0);
        assert_eq!(policy.select().unwrap(), 0);
    }

    #[test]
    fn always_explores_with_full_epsilon() {
        let mut policy = make_policy(1.0);
        policy.arms[0].mean = 1.0;

        let selections: Vec<usize> = (0..100).map(|_| policy.select().unwrap()).collect();
        assert!(selections.iter().all(|&arm_id| arm_id < 3));
        assert!(selections.iter().any(|&arm_id| arm_id != selections[0]));
    }

    #[test]
    fn update_tracks_running_mean() {
        let mut policy = make_policy(0.1);
        policy.update(0, 1.0).unwrap();
        policy.update(0, 0.0).unwrap();

        assert_eq!(policy.arms[0].pulls, 2);
        assert_eq!(policy.arms[0].mean, 0.5);
    }

    #[test]
    fn seeded_selection_is_deterministic() {
        let mut a = make_policy(0.5);
        let mut b = make_policy(0.5);

        for _ in 0..50 {
            let arm_a = a.select().unwrap();
            let arm_b = b.select().unwrap();
            assert_eq!(arm_a, arm_b);

            let reward = (arm_a == 0) as i32 as f64;
            a.update(arm_a, reward).unwrap();
            b.update(arm_b, reward).unwrap();
        }
    }

    #[test]
    fn policy_type_echoes_parameters() {
        let policy = make_policy(0.25);
        assert_eq!(
            policy.policy_type(),
            PolicyType::EpsilonGreedy {
                num_arms: 3,
                horizon: 30,
                epsilon: 0.25,
                seed: Some(SEED),
            }
        );
    }
}
