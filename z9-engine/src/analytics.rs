use std::fmt;

use rayon::prelude::*;
use serde::Serialize;

use z9_db::models::MAX_NUMBER;

use crate::montecarlo::MonteCarloEngine;
use crate::roots::digit_root;
use crate::store::DrawStore;

/// Position de référence (0-based) de la simulation par numéro.
const REFERENCE_POSITION: usize = 0;
/// Apparitions récentes prises en compte pour le momentum.
const MOMENTUM_SPAN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumberStatus {
    Cold,
    Hot,
    Critical,
    Neutral,
}

impl fmt::Display for NumberStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NumberStatus::Cold => write!(f, "FROID"),
            NumberStatus::Hot => write!(f, "CHAUD"),
            NumberStatus::Critical => write!(f, "CRITIQUE"),
            NumberStatus::Neutral => write!(f, "NEUTRE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberAnalytics {
    pub number: u8,
    pub root: u8,
    /// Tirages écoulés depuis la dernière sortie (0 = sorti au dernier tirage).
    pub current_delay: usize,
    pub mean_delay: f64,
    pub total_frequency: usize,
    pub recent_frequency_percent: f64,
    pub momentum: f64,
    pub exit_probability: f64,
    pub status: NumberStatus,
    pub mc_confidence: f64,
    pub mc_attractor: f64,
}

impl NumberAnalytics {
    fn zeroed(number: u8) -> Self {
        Self {
            number,
            root: digit_root(number as u32),
            current_delay: 0,
            mean_delay: 0.0,
            total_frequency: 0,
            recent_frequency_percent: 0.0,
            momentum: 0.0,
            exit_probability: 0.0,
            status: NumberStatus::Neutral,
            mc_confidence: 0.0,
            mc_attractor: 0.0,
        }
    }
}

/// Probabilité (%) de sortie au prochain tirage, modèle d'attente poissonnien.
pub fn exit_probability(mean_delay: f64, current_delay: usize) -> f64 {
    if mean_delay <= 0.0 {
        return 0.0;
    }
    (1.0 - (-(current_delay as f64 + 1.0) / mean_delay).exp()) * 100.0
}

pub fn classify_status(current_delay: usize, exit_probability: f64) -> NumberStatus {
    if current_delay > 22 {
        NumberStatus::Cold
    } else if current_delay == 0 {
        NumberStatus::Critical
    } else if current_delay > 1 && current_delay < 10 && exit_probability > 30.0 {
        NumberStatus::Hot
    } else {
        NumberStatus::Neutral
    }
}

fn mean_gap(offsets: &[usize]) -> f64 {
    if offsets.len() < 2 {
        return 0.0;
    }
    let total: usize = offsets.windows(2).map(|w| w[1] - w[0]).sum();
    total as f64 / (offsets.len() - 1) as f64
}

/// Statistiques de retard d'un numéro, sans la partie Monte Carlo.
fn delay_stats(store: &DrawStore, number: u8) -> NumberAnalytics {
    let total = store.len();
    let mut record = NumberAnalytics::zeroed(number);
    if total == 0 {
        return record;
    }

    // offsets depuis le tirage le plus récent, croissants
    let offsets: Vec<usize> = store
        .draws()
        .iter()
        .rev()
        .enumerate()
        .filter(|(_, d)| d.contains(number))
        .map(|(t, _)| t)
        .collect();

    record.current_delay = offsets.first().copied().unwrap_or(total);
    record.mean_delay = mean_gap(&offsets);
    record.total_frequency = offsets.len();
    record.recent_frequency_percent = offsets.len() as f64 / total as f64 * 100.0;
    record.momentum = mean_gap(&offsets[..offsets.len().min(MOMENTUM_SPAN)]);
    record.exit_probability = exit_probability(record.mean_delay, record.current_delay);
    record.status = classify_status(record.current_delay, record.exit_probability);
    record
}

/// Analytics des numéros 1..=60, calculées une fois par état de l'historique.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsTable {
    records: Vec<NumberAnalytics>,
}

impl AnalyticsTable {
    pub fn compute(store: &DrawStore, engine: &mut MonteCarloEngine, iterations: usize) -> Self {
        let base: Vec<NumberAnalytics> = (1..=MAX_NUMBER).map(|n| delay_stats(store, n)).collect();
        if store.is_empty() {
            log::warn!("Historique vide : analytics neutres");
            return Self { records: base };
        }

        let engines = engine.fork_many(base.len());
        let records: Vec<NumberAnalytics> = base
            .into_par_iter()
            .zip(engines.into_par_iter())
            .map(|(mut record, mut child)| {
                let sim = child.simulate_root_distribution(REFERENCE_POSITION, record.root, iterations);
                record.mc_confidence = sim.confidence;
                record.mc_attractor = sim.attractor;
                record
            })
            .collect();

        log::debug!("Analytics calculées pour {} numéros ({} itérations MC)", records.len(), iterations);
        Self { records }
    }

    pub fn get(&self, number: u8) -> Option<&NumberAnalytics> {
        if number == 0 {
            return None;
        }
        self.records.get((number - 1) as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NumberAnalytics> {
        self.records.iter()
    }

    pub fn records(&self) -> &[NumberAnalytics] {
        &self.records
    }

    /// Confiance Monte Carlo d'un numéro, 0 si inconnu.
    pub fn mc_confidence(&self, number: u8) -> f64 {
        self.get(number).map(|a| a.mc_confidence).unwrap_or(0.0)
    }
}
