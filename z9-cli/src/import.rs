use anyhow::{Context, Result};
use z9_db::rusqlite::Connection;
use std::path::Path;

use z9_db::db::insert_draw;
use z9_db::models::{DrawRecord, PICK_COUNT};

/// Extrait un tirage d'une ligne : les 6 derniers groupes de chiffres.
/// `None` si la ligne est malformée (moins de 6 nombres, hors limites, doublons).
pub fn parse_line(index: u32, line: &str) -> Option<DrawRecord> {
    let tokens: Vec<&str> = line
        .split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() < PICK_COUNT {
        return None;
    }

    let mut numbers = [0u8; PICK_COUNT];
    for (slot, token) in numbers.iter_mut().zip(&tokens[tokens.len() - PICK_COUNT..]) {
        *slot = token.parse::<u8>().ok()?;
    }
    DrawRecord::new(index, numbers).ok()
}

/// Lit un fichier texte de tirages ; l'index de chaque tirage est son numéro de ligne.
pub fn read_draws(path: &Path) -> Result<Vec<DrawRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let draws: Vec<DrawRecord> = content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(i as u32 + 1, line))
        .collect();
    log::info!("{} tirages lus depuis {:?}", draws.len(), path);
    Ok(draws)
}

pub struct ImportResult {
    pub total_lines: u32,
    pub accepted: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub duplicates: u32,
}

pub fn import_text(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_lines: 0,
        accepted: 0,
        inserted: 0,
        skipped: 0,
        duplicates: 0,
    };

    for (i, line) in content.lines().enumerate() {
        result.total_lines += 1;
        match parse_line(i as u32 + 1, line) {
            Some(draw) => {
                result.accepted += 1;
                if insert_draw(&tx, &draw)? {
                    result.inserted += 1;
                } else {
                    result.duplicates += 1;
                }
            }
            None => {
                log::debug!("Ligne {} ignorée : {:?}", i + 1, line);
                result.skipped += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use z9_db::db::{count_draws, fetch_all_draws, migrate};

    #[test]
    fn test_parse_line_last_six_tokens() {
        let draw = parse_line(7, "2701 12/03/2024 05-12-23-34-45-56").unwrap();
        assert_eq!(draw.index(), 7);
        assert_eq!(draw.numbers(), &[5, 12, 23, 34, 45, 56]);

        let draw = parse_line(1, "01 02 03 04 05 06").unwrap();
        assert_eq!(draw.numbers(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_line_rejects_malformed() {
        assert!(parse_line(1, "").is_none());
        assert!(parse_line(1, "1 2 3 4 5").is_none());
        assert!(parse_line(1, "1 2 3 4 5 61").is_none());
        assert!(parse_line(1, "1 2 3 4 5 0").is_none());
        assert!(parse_line(1, "1 2 3 4 5 5").is_none());
        assert!(parse_line(1, "1 2 3 4 5 999").is_none());
    }

    fn write_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_read_draws() {
        let file = write_file(&["1 2 3 4 5 6", "header", "10 20 30 40 50 60"]);
        let draws = read_draws(file.path()).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].index(), 1);
        assert_eq!(draws[1].index(), 3);
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_draws(Path::new("/nonexistent/z9.txt")).is_err());
    }

    #[test]
    fn test_import_text() {
        let file = write_file(&[
            "Concurso 1 : 04 15 22 37 41 59",
            "ligne invalide",
            "2 ; 1 2 3 4 5 5",
            "3 ; 10 20 30 40 50 60",
        ]);
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let result = import_text(&conn, file.path()).unwrap();
        assert_eq!(result.total_lines, 4);
        assert_eq!(result.accepted, 2);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.duplicates, 0);
        assert_eq!(count_draws(&conn).unwrap(), 2);

        let draws = fetch_all_draws(&conn).unwrap();
        assert_eq!(draws[0].numbers(), &[4, 15, 22, 37, 41, 59]);

        // réimport : tout est doublon
        let again = import_text(&conn, file.path()).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.duplicates, 2);
        assert_eq!(count_draws(&conn).unwrap(), 2);
    }
}
