use std::io::{self, Write};

use anyhow::{Context, Result};
use z9_db::rusqlite::Connection;
use z9_engine::config::ScanConfig;

use crate::display::display_report;

/// Variable d'environnement consultée quand la config ne fixe pas de clé.
pub const ACCESS_KEY_ENV: &str = "Z9_ACCESS_KEY";

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Scan,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "" | "scan" | "s" => Some(InteractiveCommand::Scan),
        "sair" | "quitter" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

/// Clé attendue : celle de la config, sinon celle de l'environnement.
fn resolve_access_key(config: &ScanConfig, env_key: Option<String>) -> Option<String> {
    config
        .access_key
        .clone()
        .or(env_key)
        .filter(|k| !k.is_empty())
}

fn access_granted(expected: Option<&str>, provided: &str) -> bool {
    match expected {
        Some(key) => provided.trim() == key,
        None => true,
    }
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    if read == 0 {
        anyhow::bail!("Entrée fermée");
    }
    Ok(input.trim().to_string())
}

pub fn run_interactive(conn: &Connection, config: &ScanConfig, seed: u64) -> Result<()> {
    let expected = resolve_access_key(config, std::env::var(ACCESS_KEY_ENV).ok());
    if expected.is_some() {
        let provided = prompt("Clé d'accès : ")?;
        if !access_granted(expected.as_deref(), &provided) {
            println!("ACCÈS REFUSÉ.");
            log::warn!("Tentative d'accès refusée");
            return Ok(());
        }
    } else {
        log::info!("Aucune clé d'accès configurée ({} ou access_key) : mode ouvert", ACCESS_KEY_ENV);
    }

    let mut round: u64 = 0;
    loop {
        let store = crate::load_store(conn)?;
        if store.is_empty() {
            println!("Base vide. Lancez d'abord : z9 import --file <fichier>");
        } else {
            let scan_seed = seed.wrapping_add(round);
            match crate::scan_with_progress(&store, config, scan_seed) {
                Ok(report) => display_report(&report),
                Err(e) => println!("Erreur: {e:#}"),
            }
            round += 1;
        }

        loop {
            let input = match prompt("\n>>> ENTRÉE pour un nouveau scan ou 'sair' : ") {
                Ok(s) => s,
                Err(_) => return Ok(()), // EOF / Ctrl+D
            };
            match parse_command(&input) {
                Some(InteractiveCommand::Scan) => break,
                Some(InteractiveCommand::Quit) => {
                    println!("Système arrêté.");
                    return Ok(());
                }
                None => println!("Commande inconnue : '{}'.", input),
            }
        }
    }
}
