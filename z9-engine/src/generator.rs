use std::cmp::Ordering;
use std::collections::HashSet;

use anyhow::Result;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::RngExt;
use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};

use z9_db::models::{MAX_NUMBER, PICK_COUNT};

use crate::analytics::AnalyticsTable;
use crate::config::{MAX_LABELS, ScanConfig};
use crate::montecarlo::MonteCarloEngine;
use crate::precision::{PrecisionBreakdown, PrecisionScorer};
use crate::roots::{DigitRootTable, digit_root};
use crate::thermal::ThermalStatus;
use crate::trend::PositionRootProfile;

const LABELS: [&str; MAX_LABELS] = ["A", "B", "C", "D", "E", "F", "G"];
const MASTER_LABEL: &str = "H";

/// Empreinte d'un ensemble de numéros : SHA-256 des numéros triés sur 2 chiffres, 12 premiers caractères hex.
pub fn fingerprint(numbers: &[u8]) -> String {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    let mut h = Sha256::new();
    for n in &sorted {
        h.update(format!("{:02}", n).as_bytes());
    }
    let digest: [u8; 32] = h.finalize().into();
    digest[..6].iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedCandidate {
    pub label: String,
    /// Triés, distincts.
    pub numbers: [u8; PICK_COUNT],
    pub roots: [u8; PICK_COUNT],
    /// 0..=100
    pub precision: f64,
    /// Alignés sur `numbers`.
    pub statuses: [ThermalStatus; PICK_COUNT],
    pub fingerprint: String,
    pub mc_score: f64,
    pub mc_convergence: f64,
    pub mc_variance: f64,
    pub breakdown: PrecisionBreakdown,
}

pub struct CandidateGenerator<'a> {
    analytics: &'a AnalyticsTable,
    profiles: &'a [PositionRootProfile],
    scorer: &'a PrecisionScorer<'a>,
    config: &'a ScanConfig,
    roots: DigitRootTable,
}

impl<'a> CandidateGenerator<'a> {
    pub fn new(
        analytics: &'a AnalyticsTable,
        profiles: &'a [PositionRootProfile],
        scorer: &'a PrecisionScorer<'a>,
        config: &'a ScanConfig,
    ) -> Self {
        Self { analytics, profiles, scorer, config, roots: DigitRootTable::new() }
    }

    fn ready(&self) -> bool {
        self.profiles.len() >= PICK_COUNT
    }

    /// Grilles étiquetées A.. triées par précision décroissante.
    pub fn generate(&self, labels: usize, engine: &mut MonteCarloEngine) -> Result<Vec<GeneratedCandidate>> {
        if !self.ready() {
            log::warn!("Profils de position insuffisants : aucune grille générée");
            return Ok(Vec::new());
        }

        let mut used: HashSet<String> = HashSet::new();
        let mut candidates = Vec::new();
        for label in LABELS.iter().take(labels.min(MAX_LABELS)) {
            match self.generate_label(label, &used, engine)? {
                Some(c) => {
                    log::debug!("Grille {} : {:?} ({:.1}%)", label, c.numbers, c.precision);
                    used.insert(c.fingerprint.clone());
                    candidates.push(c);
                }
                None => log::warn!("Grille {} : aucune variante nouvelle explorée", label),
            }
        }

        candidates.sort_by(|a, b| b.precision.partial_cmp(&a.precision).unwrap_or(Ordering::Equal));
        Ok(candidates)
    }

    fn generate_label(
        &self,
        label: &str,
        used: &HashSet<String>,
        engine: &mut MonteCarloEngine,
    ) -> Result<Option<GeneratedCandidate>> {
        let scored = self.explore(label, used, engine)?;
        let refined = self.refine(&scored, engine);
        Ok(best_refined(refined, scored))
    }

    /// Variantes hybrides inédites, scorées et triées par précision décroissante.
    fn explore(
        &self,
        label: &str,
        used: &HashSet<String>,
        engine: &mut MonteCarloEngine,
    ) -> Result<Vec<GeneratedCandidate>> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut explored: Vec<[u8; PICK_COUNT]> = Vec::new();
        for _ in 0..self.config.exploration_trials {
            let numbers = self.hybrid_numbers(engine.rng_mut())?;
            let fp = fingerprint(&numbers);
            if used.contains(&fp) || !seen.insert(fp) {
                continue;
            }
            explored.push(numbers);
        }

        let forks = engine.fork_many(explored.len());
        let mut scored: Vec<GeneratedCandidate> = explored
            .into_par_iter()
            .zip(forks.into_par_iter())
            .map(|(numbers, mut child)| self.build(label, numbers, &mut child))
            .collect();
        scored.sort_by(|a, b| b.precision.partial_cmp(&a.precision).unwrap_or(Ordering::Equal));
        Ok(scored)
    }

    /// Simulation dédiée des `refine_top` meilleures variantes ; la précision reste inchangée.
    fn refine(&self, scored: &[GeneratedCandidate], engine: &mut MonteCarloEngine) -> Vec<GeneratedCandidate> {
        let top = self.config.refine_top.min(scored.len());
        let iterations = self.config.refine_iterations;
        let forks = engine.fork_many(top);
        scored[..top]
            .par_iter()
            .zip(forks.into_par_iter())
            .map(|(candidate, mut child)| {
                let sim = child.simulate_candidate(&candidate.numbers, iterations);
                let mut c = candidate.clone();
                c.mc_score = sim.score;
                c.mc_convergence = sim.confidence;
                c.mc_variance = sim.variance;
                c
            })
            .collect()
    }

    /// Grille maîtresse "H" : une grille hybride, mélangée avec sa simulation.
    pub fn master(&self, engine: &mut MonteCarloEngine) -> Result<Option<GeneratedCandidate>> {
        if !self.ready() {
            return Ok(None);
        }
        let numbers = self.hybrid_numbers(engine.rng_mut())?;
        let mut candidate = self.build(MASTER_LABEL, numbers, engine);
        let sim = engine.simulate_candidate(&candidate.numbers, self.config.master_iterations);
        candidate.precision = master_precision(candidate.precision, sim.score);
        candidate.mc_score = sim.score;
        candidate.mc_convergence = sim.confidence;
        candidate.mc_variance = sim.variance;
        Ok(Some(candidate))
    }

    /// Tirage hybride : racine échantillonnée selon la simulation de la position, sinon uniforme.
    fn hybrid_numbers(&self, rng: &mut StdRng) -> Result<[u8; PICK_COUNT]> {
        let mut picked: Vec<u8> = Vec::with_capacity(PICK_COUNT);
        for profile in self.profiles.iter().take(PICK_COUNT) {
            let n = match profile.mc_root_distribution {
                Some(dist) if rng.random::<f64>() < self.config.hybrid_probability => {
                    let root = WeightedIndex::new(&dist)?.sample(rng) as u8 + 1;
                    let pool = self.roots.numbers_with_root(root);
                    pool[rng.random_range(0..pool.len())]
                }
                _ => rng.random_range(1..=MAX_NUMBER),
            };
            if !picked.contains(&n) {
                picked.push(n);
            }
        }
        while picked.len() < PICK_COUNT {
            let n = rng.random_range(1..=MAX_NUMBER);
            if !picked.contains(&n) {
                picked.push(n);
            }
        }

        let mut numbers = [0u8; PICK_COUNT];
        numbers.copy_from_slice(&picked);
        Ok(self.snap_to_roots(numbers))
    }

    /// Remplace chaque numéro hors racine dominante par le numéro libre de cette racine
    /// de meilleure confiance Monte Carlo.
    fn snap_to_roots(&self, mut numbers: [u8; PICK_COUNT]) -> [u8; PICK_COUNT] {
        for (i, profile) in self.profiles.iter().take(PICK_COUNT).enumerate() {
            let ideal = profile.dominant_root;
            if digit_root(numbers[i] as u32) == ideal {
                continue;
            }
            let best = self
                .roots
                .numbers_with_root(ideal)
                .iter()
                .copied()
                .filter(|n| !numbers.contains(n))
                .fold(None, |best: Option<(u8, f64)>, n| {
                    let conf = self.analytics.mc_confidence(n);
                    match best {
                        Some((_, b)) if b >= conf => best,
                        _ => Some((n, conf)),
                    }
                });
            if let Some((n, _)) = best {
                numbers[i] = n;
            }
        }
        numbers
    }

    /// Score en ordre positionnel, puis tri des numéros avec leurs statuts.
    fn build(&self, label: &str, numbers: [u8; PICK_COUNT], engine: &mut MonteCarloEngine) -> GeneratedCandidate {
        let readings = self.scorer.readings(&numbers, self.profiles);
        let breakdown = self.scorer.score(&numbers, self.profiles, engine);

        let mut paired: Vec<(u8, ThermalStatus)> = numbers
            .iter()
            .zip(readings.iter())
            .map(|(&n, r)| (n, r.status))
            .collect();
        paired.sort_by_key(|&(n, _)| n);

        let sorted: [u8; PICK_COUNT] = std::array::from_fn(|i| paired[i].0);
        GeneratedCandidate {
            label: label.to_string(),
            numbers: sorted,
            roots: sorted.map(|n| digit_root(n as u32)),
            precision: breakdown.total,
            statuses: std::array::from_fn(|i| paired[i].1),
            fingerprint: fingerprint(&sorted),
            mc_score: breakdown.monte_carlo,
            mc_convergence: 0.0,
            mc_variance: 0.0,
            breakdown,
        }
    }
}

/// Départage des grilles raffinées : 70 % précision, 30 % score de simulation.
pub fn refined_score(precision: f64, mc_score: f64) -> f64 {
    precision * 0.7 + mc_score * 0.3
}

/// Précision de la grille maîtresse, bonus de convergence de 5 points, plafonnée à 100.
pub fn master_precision(precision: f64, mc_score: f64) -> f64 {
    (precision * 0.8 + mc_score * 0.2 + 5.0).min(100.0)
}

/// Meilleur `refined_score` (le premier en cas d'égalité), sinon la meilleure variante non raffinée.
fn best_refined(refined: Vec<GeneratedCandidate>, scored: Vec<GeneratedCandidate>) -> Option<GeneratedCandidate> {
    refined
        .into_iter()
        .fold(None, |best: Option<(f64, GeneratedCandidate)>, c| {
            let score = refined_score(c.precision, c.mc_score);
            match best {
                Some((b, _)) if b >= score => best,
                _ => Some((score, c)),
            }
        })
        .map(|(_, c)| c)
        .or_else(|| scored.into_iter().next())
}

/// Numéros d'élite par emplacement : statut positif parmi les 3 meilleures grilles,
/// sinon le numéro de la meilleure.
pub fn elite_pool(candidates: &[GeneratedCandidate]) -> Vec<Vec<u8>> {
    let Some(first) = candidates.first() else {
        return Vec::new();
    };
    (0..PICK_COUNT)
        .map(|slot| {
            let elites: Vec<u8> = candidates
                .iter()
                .take(3)
                .filter(|c| c.statuses[slot] == ThermalStatus::Positive)
                .map(|c| c.numbers[slot])
                .collect();
            if elites.is_empty() { vec![first.numbers[slot]] } else { elites }
        })
        .collect()
}
