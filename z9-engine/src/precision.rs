use serde::Serialize;

use z9_db::models::PICK_COUNT;

use crate::montecarlo::MonteCarloEngine;
use crate::stats::shannon_entropy;
use crate::store::DrawStore;
use crate::thermal::{ThermalClassifier, ThermalReading, ThermalStatus};
use crate::trend::PositionRootProfile;

/// Poids décroissants des positions dans le signal thermique.
pub const POSITION_WEIGHTS: [f64; PICK_COUNT] = [1.20, 1.15, 1.10, 1.05, 1.00, 0.95];

const W_SIGNAL: f64 = 0.40;
const W_PAIRS: f64 = 0.20;
const W_CORRELATION: f64 = 0.15;
const W_BALANCE: f64 = 0.10;
const W_ENTROPY: f64 = 0.05;
const W_MONTE_CARLO: f64 = 0.10;

/// Sous-scores (0..=100) et total pondéré d'une grille.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PrecisionBreakdown {
    pub signal: f64,
    pub pair_strength: f64,
    pub correlation: f64,
    pub balance: f64,
    pub entropy: f64,
    pub monte_carlo: f64,
    pub total: f64,
}

pub struct PrecisionScorer<'a> {
    store: &'a DrawStore,
    classifier: &'a ThermalClassifier<'a>,
    iterations: usize,
}

impl<'a> PrecisionScorer<'a> {
    pub fn new(store: &'a DrawStore, classifier: &'a ThermalClassifier<'a>, iterations: usize) -> Self {
        Self { store, classifier, iterations }
    }

    /// Lectures thermiques position par position (Unknown sans profil).
    pub fn readings(&self, numbers: &[u8; PICK_COUNT], profiles: &[PositionRootProfile]) -> [ThermalReading; PICK_COUNT] {
        std::array::from_fn(|i| match profiles.get(i) {
            Some(profile) => self.classifier.classify(numbers[i], profile),
            None => ThermalReading { status: ThermalStatus::Unknown, score: 0.0 },
        })
    }

    pub fn score(
        &self,
        numbers: &[u8; PICK_COUNT],
        profiles: &[PositionRootProfile],
        engine: &mut MonteCarloEngine,
    ) -> PrecisionBreakdown {
        let readings = self.readings(numbers, profiles);
        let signal = signal_score(&readings.map(|r| r.score));
        let pair_strength = pair_strength_score(self.store, numbers);
        let correlation = correlation_score(self.store, numbers);
        let balance = balance_score(numbers);
        let entropy = entropy_score(numbers);
        let monte_carlo = engine.simulate_candidate(numbers, self.iterations).score;

        let total = (signal * W_SIGNAL
            + pair_strength * W_PAIRS
            + correlation * W_CORRELATION
            + balance * W_BALANCE
            + entropy * W_ENTROPY
            + monte_carlo * W_MONTE_CARLO)
            .min(100.0);

        PrecisionBreakdown { signal, pair_strength, correlation, balance, entropy, monte_carlo, total }
    }
}

/// Moyenne pondérée par position, bonus ×1.1 si chaque score dépasse 50.
pub fn signal_score(scores: &[f64; PICK_COUNT]) -> f64 {
    let weight_sum: f64 = POSITION_WEIGHTS.iter().sum();
    let weighted: f64 = scores.iter().zip(POSITION_WEIGHTS.iter()).map(|(s, w)| s * w).sum();
    let mut signal = weighted / weight_sum;
    if scores.iter().all(|&s| s > 50.0) {
        signal *= 1.1;
    }
    signal.min(100.0)
}

fn pairs(numbers: &[u8; PICK_COUNT]) -> impl Iterator<Item = (u8, u8)> + '_ {
    (0..PICK_COUNT).flat_map(move |i| ((i + 1)..PICK_COUNT).map(move |j| (numbers[i], numbers[j])))
}

pub fn pair_strength_score(store: &DrawStore, numbers: &[u8; PICK_COUNT]) -> f64 {
    let values: Vec<f64> = pairs(numbers).map(|(a, b)| store.co_occurrence(a, b)).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (mean * 1000.0).min(100.0)
}

/// -15 par paire quasi jamais vue ensemble.
pub fn correlation_score(store: &DrawStore, numbers: &[u8; PICK_COUNT]) -> f64 {
    let rare = pairs(numbers).filter(|&(a, b)| store.co_occurrence(a, b) < 0.001).count();
    (100.0 - 15.0 * rare as f64).max(0.0)
}

pub fn balance_score(numbers: &[u8; PICK_COUNT]) -> f64 {
    let evens = numbers.iter().filter(|&&n| n % 2 == 0).count();
    if evens.abs_diff(3) > 1 { 80.0 } else { 100.0 }
}

pub fn entropy_score(numbers: &[u8; PICK_COUNT]) -> f64 {
    let h = shannon_entropy(numbers);
    if (2.0..=2.5).contains(&h) {
        100.0
    } else if (1.5..=2.8).contains(&h) {
        70.0
    } else {
        40.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsTable;
    use crate::config::MonteCarloConfig;
    use crate::store::make_test_draws;
    use crate::trend::PositionTrendAnalyzer;

    #[test]
    fn test_balance_score() {
        assert_eq!(balance_score(&[2, 4, 6, 8, 10, 12]), 80.0);
        assert_eq!(balance_score(&[1, 4, 9, 12, 17, 22]), 100.0);
        assert_eq!(balance_score(&[1, 3, 5, 7, 10, 12]), 100.0);
        assert_eq!(balance_score(&[1, 3, 5, 7, 9, 12]), 80.0);
    }

    #[test]
    fn test_entropy_score_distinct_numbers() {
        // 6 valeurs distinctes : log2(6) ≈ 2.585
        assert_eq!(entropy_score(&[1, 2, 3, 4, 5, 6]), 70.0);
    }

    #[test]
    fn test_signal_score_bonus() {
        assert!((signal_score(&[60.0; 6]) - 66.0).abs() < 1e-9);
        assert!((signal_score(&[50.0; 6]) - 50.0).abs() < 1e-9);
        assert_eq!(signal_score(&[100.0; 6]), 100.0);
        assert_eq!(signal_score(&[0.0; 6]), 0.0);
    }

    #[test]
    fn test_signal_score_weights() {
        let scores = [100.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let expected = 100.0 * 1.20 / 6.45;
        assert!((signal_score(&scores) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_pair_and_correlation_scores() {
        let store = DrawStore::load(&vec![[1, 2, 3, 4, 5, 6]; 10]).unwrap();
        assert_eq!(pair_strength_score(&store, &[1, 2, 3, 4, 5, 6]), 100.0);
        assert_eq!(correlation_score(&store, &[1, 2, 3, 4, 5, 6]), 100.0);
        assert_eq!(pair_strength_score(&store, &[10, 20, 30, 40, 50, 60]), 0.0);
        // 15 paires inconnues : plancher à 0
        assert_eq!(correlation_score(&store, &[10, 20, 30, 40, 50, 60]), 0.0);
        // 5 paires avec 60 inconnues
        assert_eq!(correlation_score(&store, &[1, 2, 3, 4, 5, 60]), 25.0);
    }

    #[test]
    fn test_score_bounded() {
        let store = DrawStore::from_records(make_test_draws(120));
        let mut engine = MonteCarloEngine::new(&store, MonteCarloConfig::default(), 42);
        let analytics = AnalyticsTable::compute(&store, &mut engine, 50);
        let profiles = PositionTrendAnalyzer::new(100).analyze(&store, &mut engine);
        let classifier = ThermalClassifier::new(&analytics);
        let scorer = PrecisionScorer::new(&store, &classifier, 100);

        for numbers in [[1, 3, 5, 7, 9, 11], [2, 14, 25, 37, 48, 60], [10, 19, 28, 37, 46, 55]] {
            let b = scorer.score(&numbers, &profiles, &mut engine);
            assert!((0.0..=100.0).contains(&b.total), "total = {}", b.total);
            for sub in [b.signal, b.pair_strength, b.correlation, b.balance, b.entropy, b.monte_carlo] {
                assert!((0.0..=100.0).contains(&sub));
            }
        }
    }

    #[test]
    fn test_score_weighted_sum() {
        let store = DrawStore::load(&vec![[1, 2, 3, 4, 5, 6]; 100]).unwrap();
        let mut engine = MonteCarloEngine::new(&store, MonteCarloConfig::default(), 7);
        let analytics = AnalyticsTable::compute(&store, &mut engine, 50);
        let profiles = PositionTrendAnalyzer::new(100).analyze(&store, &mut engine);
        let classifier = ThermalClassifier::new(&analytics);
        let scorer = PrecisionScorer::new(&store, &classifier, 100);

        let b = scorer.score(&[1, 2, 3, 4, 5, 6], &profiles, &mut engine);
        let expected = b.signal * 0.4 + b.pair_strength * 0.2 + b.correlation * 0.15
            + b.balance * 0.1 + b.entropy * 0.05 + b.monte_carlo * 0.1;
        assert!((b.total - expected.min(100.0)).abs() < 1e-9);
        assert_eq!(b.pair_strength, 100.0);
        assert_eq!(b.balance, 100.0);
    }

    #[test]
    fn test_missing_profiles_unknown() {
        let store = DrawStore::default();
        let analytics = {
            let mut engine = MonteCarloEngine::new(&store, MonteCarloConfig::default(), 1);
            AnalyticsTable::compute(&store, &mut engine, 10)
        };
        let classifier = ThermalClassifier::new(&analytics);
        let scorer = PrecisionScorer::new(&store, &classifier, 10);
        let readings = scorer.readings(&[1, 2, 3, 4, 5, 6], &[]);
        assert!(readings.iter().all(|r| r.score == 0.0));
    }
}
