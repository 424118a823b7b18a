mod display;
mod import;
mod interactive;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use z9_db::db::{count_draws, db_path, fetch_all_draws, fetch_last_draws, migrate, open_db};
use z9_db::rusqlite::Connection;
use z9_engine::analytics::AnalyticsTable;
use z9_engine::config::{ScanConfig, date_seed, load_config, save_config};
use z9_engine::montecarlo::MonteCarloEngine;
use z9_engine::pipeline::{ScanReport, ScanStage, run_scan_with_progress};
use z9_engine::store::DrawStore;
use crate::display::{display_analytics, display_draws, display_import_summary, display_report};

#[derive(Parser)]
#[command(name = "z9", about = "Scanner Z9 : inertie des racines numériques et Monte Carlo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer les tirages depuis un fichier texte (un tirage par ligne)
    Import {
        /// Chemin vers le fichier
        #[arg(short, long, default_value = "dados.txt")]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Lister les derniers tirages
    History {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Afficher les analytics par numéro (retards, fréquences, statut)
    Stats {
        /// Fichier de configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed pour la reproductibilité
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Lancer un scan complet et générer les grilles
    Scan {
        /// Lire les tirages depuis ce fichier au lieu de la base
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Fichier de configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed pour la reproductibilité (défaut : date du jour)
        #[arg(long)]
        seed: Option<u64>,

        /// Nombre de grilles étiquetées (1-7)
        #[arg(short, long)]
        labels: Option<usize>,

        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Écrire la configuration par défaut
    Config {
        /// Fichier de sortie
        #[arg(short, long, default_value = "z9.json")]
        output: PathBuf,
    },

    /// Mode interactif : un scan par ENTRÉE, 'sair' pour quitter
    Interactive {
        /// Fichier de configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed du premier scan (défaut : date du jour)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { file } => cmd_import(&conn, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::History { last } => cmd_history(&conn, last),
        Command::Stats { config, seed } => cmd_stats(&conn, config.as_deref(), seed),
        Command::Scan { file, config, seed, labels, json } => {
            cmd_scan(&conn, file.as_deref(), config.as_deref(), seed, labels, json)
        }
        Command::Config { output } => cmd_config(&output),
        Command::Interactive { config, seed } => {
            let config = resolve_config(config.as_deref())?;
            interactive::run_interactive(&conn, &config, seed.unwrap_or_else(date_seed))
        }
    }
}

fn resolve_config(path: Option<&Path>) -> Result<ScanConfig> {
    match path {
        Some(p) => load_config(p),
        None => Ok(ScanConfig::default()),
    }
}

pub(crate) fn load_store(conn: &Connection) -> Result<DrawStore> {
    let draws = fetch_all_draws(conn)?;
    Ok(DrawStore::from_records(draws))
}

/// Scan avec barre de progression sur les étapes du pipeline.
pub(crate) fn scan_with_progress(store: &DrawStore, config: &ScanConfig, seed: u64) -> Result<ScanReport> {
    let pb = ProgressBar::new(ScanStage::ALL.len() as u64);
    pb.set_style(ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
        .progress_chars("=> "));

    let mut started = false;
    let report = run_scan_with_progress(store, config, seed, |stage| {
        if started {
            pb.inc(1);
        }
        started = true;
        pb.set_message(stage.to_string());
    });
    pb.finish_and_clear();
    report
}

fn cmd_import(conn: &Connection, file: &Path) -> Result<()> {
    let result = import::import_text(conn, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_history(conn: &Connection, last: u32) -> Result<()> {
    let n = count_draws(conn)?;
    if n == 0 {
        println!("Base vide. Lancez d'abord : z9 import --file <fichier>");
        return Ok(());
    }
    let draws = fetch_last_draws(conn, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, config: Option<&Path>, seed: Option<u64>) -> Result<()> {
    let config = resolve_config(config)?;
    let store = load_store(conn)?;
    if store.is_empty() {
        println!("Base vide. Lancez d'abord : z9 import --file <fichier>");
        return Ok(());
    }
    let mut engine = MonteCarloEngine::new(&store, config.monte_carlo, seed.unwrap_or_else(date_seed));
    let analytics = AnalyticsTable::compute(&store, &mut engine, config.analytics_iterations());
    display_analytics(analytics.records(), store.len());
    Ok(())
}

fn cmd_scan(
    conn: &Connection,
    file: Option<&Path>,
    config: Option<&Path>,
    seed: Option<u64>,
    labels: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut config = resolve_config(config)?;
    if let Some(labels) = labels {
        config.labels = labels;
    }
    let seed = seed.unwrap_or_else(date_seed);

    let store = match file {
        Some(path) => DrawStore::from_records(import::read_draws(path)?),
        None => load_store(conn)?,
    };
    if store.is_empty() {
        println!("Aucun tirage disponible. Importez un fichier ou passez --file <fichier>.");
        return Ok(());
    }

    let report = if json {
        z9_engine::pipeline::run_scan(&store, &config, seed)?
    } else {
        scan_with_progress(&store, &config, seed)?
    };

    if json {
        let out = serde_json::to_string_pretty(&report).context("Sérialisation JSON")?;
        println!("{}", out);
    } else {
        display_report(&report);
    }
    Ok(())
}

fn cmd_config(output: &Path) -> Result<()> {
    save_config(&ScanConfig::default(), output)?;
    println!("Configuration écrite dans {}", output.display());
    Ok(())
}
