use crate::normalize::Candidate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Static backup vocabulary, the non-exit when live trend acquisition fails.
pub const BACKUP_QUERIES: [&str; 10] = [
    "離乳食 鉄分",
    "寝かしつけ 方法",
    "偏食 対処",
    "一歳 生活リズム",
    "保育園 入園準備",
    "イヤイヤ期 対処",
    "断乳 進め方",
    "仕上げ磨き コツ",
    "夜泣き 対策",
    "虫歯 予防",
];

pub const BACKUP_SCORE: f64 = 50.0;
const BACKUP_LIMIT: usize = 5;

/// Up to five shuffled backup terms at the constant score, preferring ones
/// not recently used; falls back to the full list when all of them are.
pub fn backup_candidates<R: Rng>(recently_used: &HashSet<String>, rng: &mut R) -> Vec<Candidate> {
    let mut pool: Vec<&str> = BACKUP_QUERIES
        .iter()
        .copied()
        .filter(|q| !recently_used.contains(*q))
        .collect();
    if pool.is_empty() {
        pool = BACKUP_QUERIES.to_vec();
    }

    pool.shuffle(rng);
    pool.into_iter()
        .take(BACKUP_LIMIT)
        .map(|q| Candidate {
            term: q.to_string(),
            score: BACKUP_SCORE,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_returns_at_most_five_backup_terms() {
        let mut rng = StdRng::seed_from_u64(0);
        let picks = backup_candidates(&HashSet::new(), &mut rng);
        assert_eq!(picks.len(), BACKUP_LIMIT);
        for pick in &picks {
            assert!(BACKUP_QUERIES.contains(&pick.term.as_str()));
            assert_eq!(pick.score, BACKUP_SCORE);
        }
    }

    #[test]
    fn test_prefers_terms_not_recently_used() {
        let recent: HashSet<String> = BACKUP_QUERIES[..6].iter().map(|q| q.to_string()).collect();

        let mut rng = StdRng::seed_from_u64(1);
        let picks = backup_candidates(&recent, &mut rng);
        assert_eq!(picks.len(), 4);
        for pick in &picks {
            assert!(!recent.contains(&pick.term));
        }
    }

    #[test]
    fn test_falls_back_to_full_list_when_all_recent() {
        let recent: HashSet<String> = BACKUP_QUERIES.iter().map(|q| q.to_string()).collect();

        let mut rng = StdRng::seed_from_u64(2);
        let picks = backup_candidates(&recent, &mut rng);
        assert_eq!(picks.len(), BACKUP_LIMIT);
    }
}
