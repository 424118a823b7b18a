use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use z9_db::models::PICK_COUNT;

use crate::montecarlo::MonteCarloEngine;
use crate::stats::distribution_entropy;
use crate::store::DrawStore;

/// Base de la pondération exponentielle par récence.
const RECENCY_BASE: f64 = 4.8;
const RECENCY_EXPONENT: f64 = 15.0;
/// Tirages récents observés pour la tendance (dénominateur fixe).
const TREND_SPAN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Trend::Rising => write!(f, "+"),
            Trend::Falling => write!(f, "-"),
            Trend::Stable => write!(f, "/"),
        }
    }
}

/// Inertie de la racine à une position du tirage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionRootProfile {
    /// 1..=6
    pub position: usize,
    pub dominant_root: u8,
    pub trend: Trend,
    pub strength: f64,
    /// Poids de récence normalisés, index = racine - 1.
    pub distribution: [f64; 9],
    /// 0..=100
    pub confidence: f64,
    pub mc_histogram: BTreeMap<u8, f64>,
    pub mc_root_distribution: Option<[f64; 9]>,
    pub mc_variance: f64,
    pub cyclic_attractor: Option<usize>,
}

pub struct PositionTrendAnalyzer {
    iterations: usize,
}

impl PositionTrendAnalyzer {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }

    /// Un profil par position, vide si l'historique est vide.
    pub fn analyze(&self, store: &DrawStore, engine: &mut MonteCarloEngine) -> Vec<PositionRootProfile> {
        if store.is_empty() {
            log::warn!("Historique vide : aucun profil de position");
            return Vec::new();
        }
        (0..PICK_COUNT)
            .map(|pos| self.analyze_position(store, engine, pos))
            .collect()
    }

    fn analyze_position(
        &self,
        store: &DrawStore,
        engine: &mut MonteCarloEngine,
        pos: usize,
    ) -> PositionRootProfile {
        let distribution = recency_distribution(store, pos);
        let dominant_root = argmax_root(&distribution);

        let hits = store
            .recent(TREND_SPAN)
            .iter()
            .filter(|d| d.root_at(pos) == dominant_root)
            .count();
        let (trend, strength) = classify_trend(hits as f64 / TREND_SPAN as f64);

        let entropy = distribution_entropy(&distribution);
        let base = distribution[(dominant_root - 1) as usize] * 0.6 + (1.0 - entropy / 9f64.log2()) * 0.4;

        let sim = engine.simulate_root_distribution(pos, dominant_root, self.iterations);
        let confidence = (base * 100.0 * 0.6 + sim.confidence * 100.0 * 0.4).clamp(0.0, 100.0);
        let cyclic_attractor = engine.detect_cyclic_attractor(pos);

        log::debug!(
            "Position {} : racine {} ({}), confiance {:.1}",
            pos + 1, dominant_root, trend, confidence
        );

        PositionRootProfile {
            position: pos + 1,
            dominant_root,
            trend,
            strength,
            distribution,
            confidence,
            mc_histogram: sim.histogram,
            mc_root_distribution: sim.root_distribution,
            mc_variance: sim.variance,
            cyclic_attractor,
        }
    }
}

/// Poids `4.8^((idx/total)×15)` cumulés par racine puis normalisés.
fn recency_distribution(store: &DrawStore, pos: usize) -> [f64; 9] {
    let total = store.len() as f64;
    let mut weights = [0.0f64; 9];
    for (idx, draw) in store.draws().iter().enumerate() {
        let w = RECENCY_BASE.powf(idx as f64 / total * RECENCY_EXPONENT);
        weights[(draw.root_at(pos) - 1) as usize] += w;
    }
    let sum: f64 = weights.iter().sum();
    if sum > 0.0 {
        for w in &mut weights {
            *w /= sum;
        }
    }
    weights
}

/// Racine de poids maximal, la plus petite à égalité.
fn argmax_root(distribution: &[f64; 9]) -> u8 {
    let mut best = 0;
    for (i, &w) in distribution.iter().enumerate() {
        if w > distribution[best] {
            best = i;
        }
    }
    best as u8 + 1
}

fn classify_trend(fraction: f64) -> (Trend, f64) {
    if fraction >= 0.40 {
        (Trend::Rising, fraction * 100.0)
    } else if fraction <= 0.10 {
        (Trend::Falling, (1.0 - fraction) * 50.0)
    } else {
        (Trend::Stable, 50.0)
    }
}
