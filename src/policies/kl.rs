/// Exclusive upper bound of the bisection bracket, kept away from 1 where the
/// divergence blows up.
pub const BRACKET_MARGIN: f64 = 1e-5;

/// Absolute tolerance on the divergence value when solving for q.
pub const KL_TOLERANCE: f64 = 1e-4;

/// Bisection iteration cap. The bracket halves each step, so this is far past
/// f64 resolution; it exists to guarantee termination on unachievable targets.
pub const MAX_ITERATIONS: u32 = 100;

/// KL-divergence between two Bernoulli distributions with parameters `p` and
/// `q`, in nats.
///
/// Degenerate cases: `p == 0` gives `-ln(1-q)`, `p == 1` gives `-ln(q)`, and
/// `q` at 0 or 1 with `p` strictly inside gives positive infinity. Callers
/// must tolerate infinite results.
pub fn kl_divergence(p: f64, q: f64) -> f64 {
    if p == 0.0 {
        -(1.0 - q).ln()
    } else if p == 1.0 {
        -q.ln()
    } else if q == 0.0 || q == 1.0 {
        f64::INFINITY
    } else {
        p * (p / q).ln() + (1.0 - p) * ((1.0 - p) / (1.0 - q)).ln()
    }
}

/// Finds `q >= p` such that `kl_divergence(p, q)` is within [`KL_TOLERANCE`]
/// of `target`, by bisection over `[p, 1 - BRACKET_MARGIN]`.
///
/// The divergence is monotonically increasing in `q` on that interval. If the
/// target is not achievable inside the bracket the search runs to the
/// iteration cap and the last midpoint is returned as a best effort.
pub fn solve_q_for_divergence(p: f64, target: f64) -> f64 {
    if p == 1.0 {
        return 1.0;
    }

    let mut lo = p;
    // max() keeps the bracket ordered when p already sits past the margin
    let mut hi = (1.0 - BRACKET_MARGIN).max(p);

    if (kl_divergence(p, lo) - target).abs() <= KL_TOLERANCE {
        return lo;
    }
    if (kl_divergence(p, hi) - target).abs() <= KL_TOLERANCE {
        return hi;
    }

    let mut mid = 0.5 * (lo + hi);
    for _ in 0..MAX_ITERATIONS {
        let gap = kl_divergence(p, mid) - target;
        if gap.abs() <= KL_TOLERANCE {
            return mid;
        }
        if gap > 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }
        mid = 0.5 * (lo + hi);
    }

    mid
}
