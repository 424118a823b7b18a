use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Paramètres des procédures Monte Carlo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Nombre de tirages récents dans lesquels on sous-échantillonne.
    pub temporal_window: usize,
    pub sample_size: usize,
    /// Écart-type du bruit gaussien ajouté à chaque issue.
    pub noise_std: f64,
    /// Probabilité qu'un numéro soit remplacé par un voisin de même racine.
    pub perturbation: f64,
    /// Demi-largeur de la fenêtre de voisinage (±).
    pub neighbor_radius: u8,
    pub attractor_min_history: usize,
    pub attractor_window: usize,
    pub attractor_max_lag: usize,
    pub attractor_threshold: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            temporal_window: 100,
            sample_size: 20,
            noise_std: 0.1,
            perturbation: 0.3,
            neighbor_radius: 9,
            attractor_min_history: 50,
            attractor_window: 100,
            attractor_max_lag: 19,
            attractor_threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Itérations de la distribution de racine par position.
    pub root_iterations: usize,
    /// Itérations de la distribution de racine par numéro (analytics), `root_iterations / 10` si absent.
    pub analytics_iterations: Option<usize>,
    /// Itérations de simulation de grille dans le score de précision.
    pub precision_iterations: usize,
    /// Itérations de simulation lors du raffinement des meilleurs candidats.
    pub refine_iterations: usize,
    /// Itérations de simulation de la grille maîtresse.
    pub master_iterations: usize,
    pub exploration_trials: usize,
    pub refine_top: usize,
    /// Probabilité de tirer une position depuis la distribution Monte Carlo.
    pub hybrid_probability: f64,
    pub labels: usize,
    /// Clé du mode interactif (aucune porte si absente).
    pub access_key: Option<String>,
    pub monte_carlo: MonteCarloConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_iterations: 5000,
            analytics_iterations: None,
            precision_iterations: 1000,
            refine_iterations: 200,
            master_iterations: 500,
            exploration_trials: 100,
            refine_top: 20,
            hybrid_probability: 0.3,
            labels: 7,
            access_key: None,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

/// Nombre maximal de grilles étiquetées (A..G).
pub const MAX_LABELS: usize = 7;

impl ScanConfig {
    pub fn analytics_iterations(&self) -> usize {
        self.analytics_iterations.unwrap_or(self.root_iterations / 10)
    }

    pub fn validate(&self) -> Result<()> {
        if self.labels == 0 || self.labels > MAX_LABELS {
            bail!("Nombre de grilles invalide : {} (1-{})", self.labels, MAX_LABELS);
        }
        if !(0.0..=1.0).contains(&self.hybrid_probability) {
            bail!("hybrid_probability hors de [0, 1] : {}", self.hybrid_probability);
        }
        if !(0.0..=1.0).contains(&self.monte_carlo.perturbation) {
            bail!("perturbation hors de [0, 1] : {}", self.monte_carlo.perturbation);
        }
        if self.monte_carlo.noise_std < 0.0 {
            bail!("noise_std négatif : {}", self.monte_carlo.noise_std);
        }
        if self.monte_carlo.sample_size == 0 || self.monte_carlo.temporal_window == 0 {
            bail!("sample_size et temporal_window doivent être > 0");
        }
        if self.refine_top == 0 {
            bail!("refine_top doit être > 0");
        }
        Ok(())
    }
}

pub fn save_config(config: &ScanConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: ScanConfig = serde_json::from_str(&json)
        .with_context(|| format!("JSON invalide dans {:?}", path))?;
    config.validate()?;
    Ok(config)
}

/// Génère un seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    let y = today.year() as u64;
    let m = today.month() as u64;
    let d = today.day() as u64;
    y * 10_000 + m * 100 + d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.root_iterations, 5000);
        assert_eq!(config.labels, 7);
        assert!((config.monte_carlo.noise_std - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_analytics_iterations_follow_root_iterations() {
        assert_eq!(ScanConfig::default().analytics_iterations(), 500);
        let config = ScanConfig { root_iterations: 1200, ..ScanConfig::default() };
        assert_eq!(config.analytics_iterations(), 120);
        let config = ScanConfig { analytics_iterations: Some(30), ..config };
        assert_eq!(config.analytics_iterations(), 30);

        let config: ScanConfig = serde_json::from_str(r#"{"root_iterations": 800}"#).unwrap();
        assert_eq!(config.analytics_iterations(), 80);
    }

    #[test]
    fn test_invalid_labels() {
        let config = ScanConfig { labels: 8, ..ScanConfig::default() };
        assert!(config.validate().is_err());
        let config = ScanConfig { labels: 0, ..ScanConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ScanConfig = serde_json::from_str(r#"{"labels": 3, "monte_carlo": {"noise_std": 0.05}}"#).unwrap();
        assert_eq!(config.labels, 3);
        assert_eq!(config.root_iterations, 5000);
        assert!((config.monte_carlo.noise_std - 0.05).abs() < 1e-12);
        assert_eq!(config.monte_carlo.temporal_window, 100);
    }

    #[test]
    fn test_save_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("z9.json");
        let config = ScanConfig { labels: 4, access_key: Some("secret".into()), ..ScanConfig::default() };
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_config() {
        assert!(load_config(Path::new("/nonexistent/z9.json")).is_err());
    }

    #[test]
    fn test_date_seed_format() {
        let seed = date_seed();
        assert_eq!(seed.to_string().len(), 8, "seed devrait avoir 8 chiffres: {seed}");
    }
}
