use super::epsilon_greedy::EpsilonGreedy;
use super::errors::PolicyError;
use super::kl_ucb::KlUcb;
use super::many_arms::ManyArmsThompson;
use super::thompson_sampling::ThompsonSampling;
use super::ucb::Ucb;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Serialize)]
pub struct PolicyStats {
    pub arms: Vec<ArmStats>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ArmStats {
    pub pulls: u64,
    pub mean_reward: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PolicyType {
    EpsilonGreedy {
        num_arms: usize,
        horizon: u64,
        epsilon: f64,
        seed: Option<u64>,
    },
    Ucb {
        num_arms: usize,
        horizon: u64,
    },
    KlUcb {
        num_arms: usize,
        horizon: u64,
    },
    ThompsonSampling {
        num_arms: usize,
        horizon: u64,
        seed: Option<u64>,
    },
    ManyArmsThompson {
        num_arms: usize,
        horizon: u64,
        seed: Option<u64>,
    },
}

impl PolicyType {
    /// Builds the boxed policy, validating the construction parameters.
    pub fn into_inner(self) -> Result<Box<dyn Policy + Send>, PolicyError> {
        match self {
            PolicyType::EpsilonGreedy {
                num_arms,
                horizon,
                epsilon,
                seed,
            } => Ok(Box::new(EpsilonGreedy::new(num_arms, horizon, epsilon, seed)?)),
            PolicyType::Ucb { num_arms, horizon } => Ok(Box::new(Ucb::new(num_arms, horizon)?)),
            PolicyType::KlUcb { num_arms, horizon } => {
                Ok(Box::new(KlUcb::new(num_arms, horizon)?))
            }
            PolicyType::ThompsonSampling {
                num_arms,
                horizon,
                seed,
            } => Ok(Box::new(ThompsonSampling::new(num_arms, horizon, seed)?)),
            PolicyType::ManyArmsThompson {
                num_arms,
                horizon,
                seed,
            } => Ok(Box::new(ManyArmsThompson::new(num_arms, horizon, seed)?)),
        }
    }
}

/// Forced-exploration state shared by the index policies. Every arm is handed
/// out once, in order, before the policy switches to its index rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Exploring { cursor: usize },
    Exploiting,
}

impl Phase {
    pub fn new() -> Self {
        Phase::Exploring { cursor: 0 }
    }

    /// Hands out the next forced arm, or `None` once every arm has been
    /// visited. The transition to `Exploiting` happens on the call that hands
    /// out the last arm, so the update that follows it already observes the
    /// exploiting state.
    pub fn next_forced(&mut self, num_arms: usize) -> Option<usize> {
        match *self {
            Phase::Exploring { cursor } => {
                if cursor + 1 >= num_arms {
                    debug!(num_arms, "forced exploration complete");
                    *self = Phase::Exploiting;
                } else {
                    *self = Phase::Exploring { cursor: cursor + 1 };
                }
                Some(cursor)
            }
            Phase::Exploiting => None,
        }
    }

    pub fn is_exploring(&self) -> bool {
        matches!(self, Phase::Exploring { .. })
    }
}

impl Default for Phase {
    fn default() -> Self {
        Phase::new()
    }
}

// Iterator::max_by keeps the last of equal elements; arm selection wants the
// first, so the scan only replaces on a strictly greater value.
pub(crate) fn first_argmax<I>(values: I) -> Option<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (arm_id, value) in values.into_iter().enumerate() {
        let replace = match best {
            Some((_, best_value)) => value > best_value,
            None => true,
        };
        if replace {
            best = Some((arm_id, value));
        }
    }

    best.map(|(arm_id, _)| arm_id)
}

impl Clone for Box<dyn Policy + Send> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

pub trait CloneBoxedPolicy {
    fn clone_box(&self) -> Box<dyn Policy + Send>;
}

#[typetag::serde(tag = "type")]
pub trait Policy: Send + CloneBoxedPolicy {
    fn policy_type(&self) -> PolicyType;
    /// Picks the arm to pull this round.
    fn select(&mut self) -> Result<usize, PolicyError>;
    /// Records the reward observed for the arm returned by the preceding
    /// `select`. Rewards are binary, 0.0 or 1.0.
    fn update(&mut self, arm_id: usize, reward: f64) -> Result<(), PolicyError>;
    /// Clears all learned state back to the freshly constructed policy. A
    /// seeded random source keeps its current stream position.
    fn reset(&mut self);
    fn stats(&self) -> PolicyStats;
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 1234;

    #[test]
    fn forced_phase_hands_out_each_arm_once() {
        let mut phase = Phase::new();
        assert!(phase.is_exploring());
        assert_eq!(phase.next_forced(3), Some(0));
        assert_eq!(phase.next_forced(3), Some(1));
        assert!(phase.is_exploring());
        assert_eq!(phase.next_forced(3), Some(2));
        assert!(!phase.is_exploring());
        assert_eq!(phase.next_forced(3), None);
    }

    #[test]
    fn forced_phase_flips_while_handing_out_last_arm() {
        let mut phase = Phase::new();
        assert_eq!(phase.next_forced(1), Some(0));
        assert_eq!(phase, Phase::Exploiting);
    }

    #[test]
    fn first_argmax_prefers_lowest_index_on_ties() {
        assert_eq!(first_argmax([0.0, 0.0, 0.0]), Some(0));
        assert_eq!(first_argmax([1.0, 2.0, 2.0]), Some(1));
        assert_eq!(first_argmax([3.0, 2.0, 3.0]), Some(0));
        assert_eq!(first_argmax(std::iter::empty()), None);
    }

    #[test]
    fn factory_builds_each_policy() {
        let types = vec![
            PolicyType::EpsilonGreedy {
                num_arms: 3,
                horizon: 30,
                epsilon: 0.1,
                seed: Some(SEED),
            },
            PolicyType::Ucb {
                num_arms: 3,
                horizon: 30,
            },
            PolicyType::KlUcb {
                num_arms: 3,
                horizon: 30,
            },
            PolicyType::ThompsonSampling {
                num_arms: 3,
                horizon: 30,
                seed: Some(SEED),
            },
            PolicyType::ManyArmsThompson {
                num_arms: 3,
                horizon: 30,
                seed: Some(SEED),
            },
        ];

        for policy_type in types {
            let policy = policy_type.clone().into_inner().unwrap();
            assert_eq!(policy.policy_type(), policy_type);
        }
    }

    #[test]
    fn factory_rejects_invalid_parameters() {
        let invalid = PolicyType::Ucb {
            num_arms: 0,
            horizon: 30,
        };
        assert!(matches!(
            invalid.into_inner(),
            Err(PolicyError::InvalidArmCount)
        ));

        let invalid = PolicyType::ThompsonSampling {
            num_arms: 3,
            horizon: 0,
            seed: None,
        };
        assert!(matches!(
            invalid.into_inner(),
            Err(PolicyError::InvalidHorizon)
        ));
    }

    #[test]
    fn boxed_policy_snapshot_round_trip() {
        let mut policy = PolicyType::Ucb {
            num_arms: 3,
            horizon: 30,
        }
        .into_inner()
        .unwrap();

        let arm_id = policy.select().unwrap();
        policy.update(arm_id, 1.0).unwrap();

        let snapshot = serde_json::to_string(&policy).unwrap();
        let restored: Box<dyn Policy + Send> = serde_json::from_str(&snapshot).unwrap();

        assert_eq!(
            restored.policy_type(),
            PolicyType::Ucb {
                num_arms: 3,
                horizon: 30,
            }
        );
        let stats = restored.stats();
        assert_eq!(stats.arms.len(), 3);
        assert_eq!(stats.arms[0].pulls, 1);
        assert_eq!(stats.arms[0].mean_reward, 1.0);
    }

    #[test]
    fn cloned_boxed_policy_is_independent() {
        let mut policy = PolicyType::ThompsonSampling {
            num_arms: 2,
            horizon: 10,
            seed: Some(SEED),
        }
        .into_inner()
        .unwrap();
        let clone = policy.clone();

        policy.update(0, 1.0).unwrap();
        assert_eq!(policy.stats().arms[0].pulls, 1);
        assert_eq!(clone.stats().arms[0].pulls, 0);
    }
}
