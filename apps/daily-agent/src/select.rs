use crate::normalize::Candidate;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Generic placeholder returned when every other source is exhausted.
pub const FALLBACK_TOPIC: &str = "育児 トレンド";
pub const FALLBACK_SCORE: f64 = 40.0;

/// Selection tuning knobs. The mostly-greedy-with-bounded-randomness shape
/// is the contract; the exact percentages are configuration.
#[derive(Debug, Clone)]
pub struct Tuning {
    pub top_k: usize,
    pub sample_size: usize,
    /// Chance of picking uniformly among the `override_pool` best instead
    /// of the best sampled item.
    pub override_probability: f64,
    /// Uniform weight perturbation, as a fraction of the score, per draw.
    pub noise_fraction: f64,
    /// Keeps zero-score candidates drawable.
    pub weight_floor: f64,
    pub override_pool: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            top_k: 10,
            sample_size: 5,
            override_probability: 0.25,
            noise_fraction: 0.05,
            weight_floor: 0.1,
            override_pool: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub topic: String,
    pub score: f64,
}

/// Pick today's topic from ranked candidates.
///
/// Recently used terms are filtered out unless that would empty the list:
/// freshness never blocks selection outright. The survivors are ranked by
/// score, truncated to the top K, and sampled by noise-perturbed weight so
/// stable scores do not yield the same pick on every run. Empty input
/// returns the fixed sentinel.
///
/// Deterministic for a fixed RNG seed; production passes an entropy-seeded
/// `StdRng`.
pub fn select<R: Rng>(
    candidates: &[Candidate],
    recently_used: &HashSet<String>,
    tuning: &Tuning,
    rng: &mut R,
) -> Selection {
    if candidates.is_empty() {
        return Selection {
            topic: FALLBACK_TOPIC.to_string(),
            score: FALLBACK_SCORE,
        };
    }

    let mut fresh: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| !recently_used.contains(&c.term))
        .collect();
    if fresh.is_empty() {
        fresh = candidates.iter().collect();
    }

    // Stable sort: ties keep their prior order.
    fresh.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    // A zero top_k would leave nothing to pick from; keep at least one.
    fresh.truncate(tuning.top_k.max(1));

    let sampled = sample_weighted(&fresh, tuning, rng);
    let shortlist: &[&Candidate] = if sampled.is_empty() { &fresh } else { &sampled };

    // Highest score wins ties for the earliest-listed item.
    let mut chosen = shortlist[0];
    for c in shortlist[1..].iter().copied() {
        if c.score > chosen.score {
            chosen = c;
        }
    }

    if fresh.len() >= tuning.override_pool && rng.gen::<f64>() < tuning.override_probability {
        chosen = fresh[rng.gen_range(0..tuning.override_pool)];
    }

    Selection {
        topic: chosen.term.clone(),
        score: chosen.score,
    }
}

/// Draw up to `sample_size` candidates without replacement, weighted by
/// score with fresh uniform noise applied on every draw.
fn sample_weighted<'a, R: Rng>(
    ranked: &[&'a Candidate],
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<&'a Candidate> {
    let target = tuning.sample_size.min(ranked.len());
    let mut pool: Vec<&Candidate> = ranked.to_vec();
    let mut picks = Vec::with_capacity(target);

    while !pool.is_empty() && picks.len() < target {
        let weights: Vec<f64> = pool
            .iter()
            .map(|c| {
                let noise = rng.gen_range(-tuning.noise_fraction..tuning.noise_fraction);
                (c.score * (1.0 + noise)).max(tuning.weight_floor)
            })
            .collect();
        let total: f64 = weights.iter().sum();

        let roll = rng.gen_range(0.0..total);
        let mut acc = 0.0;
        let mut index = pool.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            acc += w;
            if acc >= roll {
                index = i;
                break;
            }
        }
        picks.push(pool.remove(index));
    }

    picks
}
