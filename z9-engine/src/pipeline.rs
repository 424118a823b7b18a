use std::fmt;

use anyhow::Result;
use serde::Serialize;

use crate::analytics::{AnalyticsTable, NumberAnalytics};
use crate::config::ScanConfig;
use crate::generator::{CandidateGenerator, GeneratedCandidate, elite_pool};
use crate::montecarlo::MonteCarloEngine;
use crate::precision::PrecisionScorer;
use crate::store::DrawStore;
use crate::thermal::ThermalClassifier;
use crate::trend::{PositionRootProfile, PositionTrendAnalyzer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Analytics,
    Trends,
    Candidates,
    Master,
}

impl ScanStage {
    pub const ALL: [ScanStage; 4] = [
        ScanStage::Analytics,
        ScanStage::Trends,
        ScanStage::Candidates,
        ScanStage::Master,
    ];
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScanStage::Analytics => write!(f, "Analytics des numéros"),
            ScanStage::Trends => write!(f, "Inertie des racines"),
            ScanStage::Candidates => write!(f, "Génération des grilles"),
            ScanStage::Master => write!(f, "Grille maîtresse"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub seed: u64,
    pub draw_count: usize,
    pub analytics: Vec<NumberAnalytics>,
    pub profiles: Vec<PositionRootProfile>,
    pub candidates: Vec<GeneratedCandidate>,
    pub elite_pool: Vec<Vec<u8>>,
    pub master: Option<GeneratedCandidate>,
}

pub fn run_scan(store: &DrawStore, config: &ScanConfig, seed: u64) -> Result<ScanReport> {
    run_scan_with_progress(store, config, seed, |_| {})
}

/// Exécute le pipeline complet ; `on_stage` est appelé au début de chaque étape.
pub fn run_scan_with_progress(
    store: &DrawStore,
    config: &ScanConfig,
    seed: u64,
    mut on_stage: impl FnMut(ScanStage),
) -> Result<ScanReport> {
    config.validate()?;
    log::info!("Scan de {} tirages (seed {})", store.len(), seed);

    let mut engine = MonteCarloEngine::new(store, config.monte_carlo, seed);

    on_stage(ScanStage::Analytics);
    let analytics = AnalyticsTable::compute(store, &mut engine, config.analytics_iterations());

    on_stage(ScanStage::Trends);
    let profiles = PositionTrendAnalyzer::new(config.root_iterations).analyze(store, &mut engine);
    log::info!("{} profils de position", profiles.len());

    on_stage(ScanStage::Candidates);
    let classifier = ThermalClassifier::new(&analytics);
    let scorer = PrecisionScorer::new(store, &classifier, config.precision_iterations);
    let generator = CandidateGenerator::new(&analytics, &profiles, &scorer, config);
    let candidates = generator.generate(config.labels, &mut engine)?;
    let elite_pool = elite_pool(&candidates);
    log::info!("{} grilles générées", candidates.len());

    on_stage(ScanStage::Master);
    let master = generator.master(&mut engine)?;

    Ok(ScanReport {
        seed,
        draw_count: store.len(),
        analytics: analytics.records().to_vec(),
        profiles,
        candidates,
        elite_pool,
        master,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::NumberStatus;
    use crate::store::make_test_draws;

    fn small_config() -> ScanConfig {
        ScanConfig {
            root_iterations: 200,
            analytics_iterations: Some(50),
            precision_iterations: 50,
            refine_iterations: 50,
            master_iterations: 50,
            exploration_trials: 20,
            refine_top: 5,
            labels: 4,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn test_full_scan() {
        let store = DrawStore::from_records(make_test_draws(150));
        let mut stages = Vec::new();
        let report = run_scan_with_progress(&store, &small_config(), 2024, |s| stages.push(s)).unwrap();

        assert_eq!(stages, ScanStage::ALL.to_vec());
        assert_eq!(report.draw_count, 150);
        assert_eq!(report.analytics.len(), 60);
        assert_eq!(report.profiles.len(), 6);
        assert!(!report.candidates.is_empty());
        assert_eq!(report.elite_pool.len(), 6);
        assert!(report.elite_pool.iter().all(|slot| !slot.is_empty()));
        assert_eq!(report.master.as_ref().map(|m| m.label.as_str()), Some("H"));
    }

    #[test]
    fn test_empty_history_scan() {
        let report = run_scan(&DrawStore::default(), &small_config(), 1).unwrap();
        assert_eq!(report.draw_count, 0);
        assert!(report.profiles.is_empty());
        assert!(report.candidates.is_empty());
        assert!(report.elite_pool.is_empty());
        assert!(report.master.is_none());
        assert!(report.analytics.iter().all(|a| a.status == NumberStatus::Neutral && a.current_delay == 0));
    }

    #[test]
    fn test_scan_reproducible() {
        let store = DrawStore::from_records(make_test_draws(90));
        let a = run_scan(&store, &small_config(), 77).unwrap();
        let b = run_scan(&store, &small_config(), 77).unwrap();
        assert_eq!(a.candidates, b.candidates);
        assert_eq!(a.master, b.master);
        assert_eq!(a.profiles, b.profiles);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScanConfig { labels: 0, ..small_config() };
        assert!(run_scan(&DrawStore::default(), &config, 1).is_err());
    }

    #[test]
    fn test_report_serializes() {
        let store = DrawStore::from_records(make_test_draws(60));
        let report = run_scan(&store, &small_config(), 5).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"elite_pool\""));
        assert!(json.contains("\"fingerprint\""));
    }
}
