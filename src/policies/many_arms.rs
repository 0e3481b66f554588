use super::errors::PolicyError;
use super::policy::{first_argmax, CloneBoxedPolicy, Policy, PolicyStats, PolicyType};
use super::rng::MaybeSeededRng;
use super::thompson_sampling::ThompsonArm;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thompson Sampling for arm counts large enough that resampling every
/// posterior each round is too expensive.
///
/// Only the first `floor(sqrt(num_arms))` arms are resampled per round. All
/// other arms keep their previously sampled value, initially zero, and still
/// take part in the argmax with that stale draw.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ManyArmsThompson {
    num_arms: usize,
    horizon: u64,
    resample_count: usize,
    arms: Vec<ThompsonArm>,
    samples: Vec<f64>,
    rng: MaybeSeededRng,
}

impl ManyArmsThompson {
    pub fn new(num_arms: usize, horizon: u64, seed: Option<u64>) -> Result<Self, PolicyError> {
        if num_arms == 0 {
            return Err(PolicyError::InvalidArmCount);
        }
        if horizon == 0 {
            return Err(PolicyError::InvalidHorizon);
        }

        let resample_count = (num_arms as f64).sqrt().floor() as usize;
        debug!(
            num_arms,
            horizon, resample_count, ?seed, "created many-arms thompson policy"
        );

        Ok(Self {
            num_arms,
            horizon,
            resample_count,
            arms: vec![ThompsonArm::default(); num_arms],
            samples: vec![0.0; num_arms],
            rng: MaybeSeededRng::new(seed),
        })
    }
}

impl CloneBoxedPolicy for ManyArmsThompson {
    fn clone_box(&self) -> Box<dyn Policy + Send> {
        Box::new(self.clone())
    }
}

#[typetag::serde]
impl Policy for ManyArmsThompson {
    fn policy_type(&self) -> PolicyType {
        PolicyType::ManyArmsThompson {
            num_arms: self.num_arms,
            horizon: self.horizon,
            seed: self.rng.seed,
        }
    }

    fn select(&mut self) -> Result<usize, PolicyError> {
        // refresh the leading window only; stale draws stay in place
        let rng = self.rng.get_rng();
        for (slot, arm) in self
            .samples
            .iter_mut()
            .zip(&self.arms)
            .take(self.resample_count)
        {
            *slot = arm.posterior_sample(rng)?;
        }

        first_argmax(self.samples.iter().copied()).ok_or(PolicyError::NoArmsAvailable)
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
        self.samples = vec![0.0; self.num_arms];
        debug!("reset many-arms thompson policy");
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

    const DEFAULT_SEED: Option<u64> = Some(1234);

    #[test]
    fn resample_window_is_floor_sqrt() {
        assert_eq!(
            ManyArmsThompson::new(100, 1000, DEFAULT_SEED)
                .unwrap()
                .resample_count,
            10
        );
        assert_eq!(
            ManyArmsThompson::new(99, 1000, DEFAULT_SEED)
                .unwrap()
                .resample_count,
            9
        );
        assert_eq!(
            ManyArmsThompson::new(3, 1000, DEFAULT_SEED)
                .unwrap()
                .resample_count,
            1
        );
        assert_eq!(
            ManyArmsThompson::new(1, 1000, DEFAULT_SEED)
                .unwrap()
                .resample_count,
            1
        );
    }

    #[test]
    fn samples_start_at_zero() {
        let policy = ManyArmsThompson::new(100, 1000, DEFAULT_SEED).unwrap();
        assert!(policy.samples.iter().all(|&sample| sample == 0.0));
        // the all-tied starting vector resolves to the first arm
        assert_eq!(first_argmax(policy.samples.iter().copied()), Some(0));
    }

    #[test]
    fn selections_stay_inside_window_while_tail_is_stale() {
        let mut policy = ManyArmsThompson::new(100, 1000, DEFAULT_SEED).unwrap();

        for _ in 0..300 {
            let arm_id = policy.select().unwrap();
            assert!(arm_id < 10, "selected stale arm {arm_id}");
            policy.update(arm_id, 0.0).unwrap();
        }

        assert!(policy.samples[10..].iter().all(|&sample| sample == 0.0));
    }

    #[test]
    fn updates_outside_window_are_accepted() {
        let mut policy = ManyArmsThompson::new(100, 1000, DEFAULT_SEED).unwrap();
        policy.update(50, 1.0).unwrap();

        assert_eq!(policy.arms[50].pulls, 1);
        assert_eq!(policy.arms[50].successes, 1);
    }

    #[test]
    fn seeded_selection_is_deterministic() {
        let mut a = ManyArmsThompson::new(64, 1000, DEFAULT_SEED).unwrap();
        let mut b = ManyArmsThompson::new(64, 1000, DEFAULT_SEED).unwrap();

        for _ in 0..20 {
            let arm_a = a.select().unwrap();
            let arm_b = b.select().unwrap();
            assert_eq!(arm_a, arm_b);

            a.update(arm_a, 1.0).unwrap();
            b.update(arm_b, 1.0).unwrap();
        }
    }

    #[test]
    fn unknown_arm_is_rejected() {
        let mut policy = ManyArmsThompson::new(9, 100, DEFAULT_SEED).unwrap();
        assert!(matches!(
            policy.update(9, 1.0),
            Err(PolicyError::ArmNotFound(9))
        ));
    }

    #[test]
    fn reset_clears_retained_samples() {
        let mut policy = ManyArmsThompson::new(100, 1000, DEFAULT_SEED).unwrap();
        for _ in 0..5 {
            let arm_id = policy.select().unwrap();
            policy.update(arm_id, 1.0).unwrap();
        }
        assert!(policy.samples[..10].iter().any(|&sample| sample > 0.0));

        policy.reset();

        assert!(policy.samples.iter().all(|&sample| sample == 0.0));
        assert!(policy.arms.iter().all(|arm| arm.pulls == 0));
    }
}
