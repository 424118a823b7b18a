use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, RngExt, SeedableRng};
use serde::Serialize;

use z9_db::models::MAX_NUMBER;

use crate::config::MonteCarloConfig;
use crate::roots::digit_root;
use crate::stats::sample_variance;
use crate::store::DrawStore;

/// Résultat de `simulate_root_distribution`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootSimulation {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// Issue la plus fréquente (arrondie au centième), la moyenne à défaut.
    pub attractor: f64,
    /// 1 - variance.
    pub confidence: f64,
    /// Issues arrondies, clé = centièmes (0..=100), somme = 1.
    pub histogram: BTreeMap<u8, f64>,
    /// Racines échantillonnées à la position, index = racine - 1, somme = 1.
    pub root_distribution: Option<[f64; 9]>,
}

impl RootSimulation {
    fn neutral() -> Self {
        Self {
            mean: 0.0,
            variance: 0.0,
            std_dev: 0.0,
            attractor: 0.0,
            confidence: 0.0,
            histogram: BTreeMap::new(),
            root_distribution: None,
        }
    }
}

/// Résultat de `simulate_candidate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CandidateSimulation {
    pub mean_matches: f64,
    pub variance: f64,
    /// min(100, moyenne × 1/(1+variance) × 100).
    pub score: f64,
    /// 1/(1+variance).
    pub confidence: f64,
    pub percentile_95: usize,
}

/// Moteur d'échantillonnage. Possède son générateur aléatoire : à seed égal, résultats identiques.
pub struct MonteCarloEngine<'a> {
    store: &'a DrawStore,
    params: MonteCarloConfig,
    rng: StdRng,
}

impl<'a> MonteCarloEngine<'a> {
    pub fn new(store: &'a DrawStore, params: MonteCarloConfig, seed: u64) -> Self {
        Self {
            store,
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> &MonteCarloConfig {
        &self.params
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Moteur enfant sur le même historique, flux aléatoire dérivé de celui du parent.
    pub fn fork(&mut self) -> MonteCarloEngine<'a> {
        let seed = self.rng.random::<u64>();
        MonteCarloEngine::new(self.store, self.params, seed)
    }

    /// `n` moteurs enfants, dérivés dans un ordre fixe.
    pub fn fork_many(&mut self, n: usize) -> Vec<MonteCarloEngine<'a>> {
        (0..n).map(|_| self.fork()).collect()
    }

    /// Distribution stabilisée de la fréquence de `target_root` à `position` (0-based)
    /// sur des sous-échantillons de la fenêtre récente.
    pub fn simulate_root_distribution(
        &mut self,
        position: usize,
        target_root: u8,
        iterations: usize,
    ) -> RootSimulation {
        let store = self.store;
        let window = store.recent(self.params.temporal_window);
        if window.is_empty() || iterations == 0 {
            return RootSimulation::neutral();
        }

        let sample_size = self.params.sample_size.min(window.len());
        let mut outcomes = Vec::with_capacity(iterations);
        let mut root_counts = [0u64; 9];

        for _ in 0..iterations {
            let picked = index::sample(&mut self.rng, window.len(), sample_size);
            let mut hits = 0usize;
            for i in picked.iter() {
                let root = window[i].root_at(position);
                root_counts[(root - 1) as usize] += 1;
                if root == target_root {
                    hits += 1;
                }
            }
            let frequency = hits as f64 / sample_size as f64;
            let noisy = frequency + gaussian(&mut self.rng, self.params.noise_std);
            outcomes.push(noisy.clamp(0.0, 1.0));
        }

        let mean = outcomes.iter().sum::<f64>() / outcomes.len() as f64;
        let variance = sample_variance(&outcomes);

        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for &o in &outcomes {
            *counts.entry((o * 100.0).round() as u8).or_insert(0) += 1;
        }
        // à égalité, le plus petit seau l'emporte
        let attractor = counts
            .iter()
            .fold(None, |best: Option<(u8, usize)>, (&bucket, &count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((bucket, count)),
            })
            .map(|(bucket, _)| bucket as f64 / 100.0)
            .unwrap_or(mean);

        let histogram = counts
            .into_iter()
            .map(|(bucket, count)| (bucket, count as f64 / iterations as f64))
            .collect();

        let total_roots: u64 = root_counts.iter().sum();
        let root_distribution = root_counts.map(|c| c as f64 / total_roots as f64);

        RootSimulation {
            mean,
            variance,
            std_dev: variance.sqrt(),
            attractor,
            confidence: 1.0 - variance,
            histogram,
            root_distribution: Some(root_distribution),
        }
    }

    /// Stabilité d'une grille : voisins perturbés comparés à des tirages historiques au hasard.
    pub fn simulate_candidate(&mut self, numbers: &[u8], iterations: usize) -> CandidateSimulation {
        let store = self.store;
        let draws = store.draws();
        if draws.is_empty() || iterations == 0 {
            return CandidateSimulation::default();
        }

        let mut matches = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            let mut neighbor = self.neighbor(numbers);
            neighbor.sort_unstable();
            neighbor.dedup();
            let draw = &draws[self.rng.random_range(0..draws.len())];
            matches.push(neighbor.iter().filter(|&&n| draw.contains(n)).count());
        }

        let as_f64: Vec<f64> = matches.iter().map(|&m| m as f64).collect();
        let mean_matches = as_f64.iter().sum::<f64>() / as_f64.len() as f64;
        let variance = sample_variance(&as_f64);
        let stability = 1.0 / (1.0 + variance);

        matches.sort_unstable();
        let p95_idx = ((iterations as f64 * 0.95) as usize).min(matches.len() - 1);

        CandidateSimulation {
            mean_matches,
            variance,
            score: (mean_matches * stability * 100.0).min(100.0),
            confidence: stability,
            percentile_95: matches[p95_idx],
        }
    }

    /// Variante proche : chaque numéro peut être remplacé par un voisin de même racine.
    fn neighbor(&mut self, numbers: &[u8]) -> Vec<u8> {
        let radius = self.params.neighbor_radius;
        numbers
            .iter()
            .map(|&d| {
                if self.rng.random::<f64>() >= self.params.perturbation {
                    return d;
                }
                let root = digit_root(d as u32);
                let low = d.saturating_sub(radius).max(1);
                let high = d.saturating_add(radius).min(MAX_NUMBER);
                let candidates: Vec<u8> = (low..=high)
                    .filter(|&x| x != d && digit_root(x as u32) == root)
                    .collect();
                if candidates.is_empty() {
                    d
                } else {
                    candidates[self.rng.random_range(0..candidates.len())]
                }
            })
            .collect()
    }

    /// Période cyclique dominante des racines à `position` (0-based), si l'autocorrélation
    /// dépasse le seuil. Exige `attractor_min_history` tirages.
    /// Autocorrélation centrée réduite : `Σ (r_i - m)(r_{i+k} - m) / (n - k)` divisé par la variance,
    /// donc dans [-1, 1] et nulle sur une série sans structure.
    pub fn detect_cyclic_attractor(&self, position: usize) -> Option<usize> {
        if self.store.len() < self.params.attractor_min_history {
            return None;
        }

        let series: Vec<f64> = self
            .store
            .recent(self.params.attractor_window)
            .iter()
            .map(|d| d.root_at(position) as f64)
            .collect();
        let n = series.len();
        let mean = series.iter().sum::<f64>() / n as f64;
        let variance = series.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        if variance <= 1e-12 {
            return None;
        }

        let max_lag = self.params.attractor_max_lag.min(n.saturating_sub(1));
        let mut best: Option<(usize, f64)> = None;
        for lag in 1..=max_lag {
            let acf = autocorrelation(&series, mean, variance, lag);
            if best.is_none_or(|(_, b)| acf > b) {
                best = Some((lag, acf));
            }
        }

        best.filter(|&(_, acf)| acf > self.params.attractor_threshold)
            .map(|(lag, _)| lag)
    }
}

fn autocorrelation(series: &[f64], mean: f64, variance: f64, lag: usize) -> f64 {
    let n = series.len();
    let cov: f64 = (0..n - lag)
        .map(|i| (series[i] - mean) * (series[i + lag] - mean))
        .sum::<f64>()
        / (n - lag) as f64;
    cov / variance
}

/// Bruit gaussien centré (Box-Muller).
fn gaussian(rng: &mut impl Rng, std_dev: f64) -> f64 {
    let u1: f64 = rng.random::<f64>();
    let u2: f64 = rng.random::<f64>();
    let u1_safe: f64 = u1.max(1e-15);
    std_dev * (-2.0f64 * u1_safe.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
