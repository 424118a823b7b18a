use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{DrawRecord, PICK_COUNT};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    contest  INTEGER PRIMARY KEY,
    n1       INTEGER NOT NULL,
    n2       INTEGER NOT NULL,
    n3       INTEGER NOT NULL,
    n4       INTEGER NOT NULL,
    n5       INTEGER NOT NULL,
    n6       INTEGER NOT NULL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("z9.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn insert_draw(conn: &Connection, draw: &DrawRecord) -> Result<bool> {
    let n = draw.numbers();
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (contest, n1, n2, n3, n4, n5, n6)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![draw.index(), n[0], n[1], n[2], n[3], n[4], n[5]],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

type RawRow = (u32, [u8; PICK_COUNT]);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        [
            row.get::<_, u8>(1)?,
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
            row.get::<_, u8>(6)?,
        ],
    ))
}

fn into_records(rows: Vec<RawRow>) -> Result<Vec<DrawRecord>> {
    rows.into_iter()
        .map(|(contest, numbers)| {
            DrawRecord::new(contest, numbers)
                .with_context(|| format!("Tirage {} corrompu en base", contest))
        })
        .collect()
}

/// Tout l'historique, du plus ancien au plus récent.
pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT contest, n1, n2, n3, n4, n5, n6 FROM draws ORDER BY contest ASC"
    )?;
    let rows = stmt.query_map([], read_row)?.collect::<Result<Vec<_>, _>>()?;
    into_records(rows)
}

/// Les `limit` derniers tirages, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT contest, n1, n2, n3, n4, n5, n6 FROM draws ORDER BY contest DESC LIMIT ?1"
    )?;
    let rows = stmt.query_map([limit], read_row)?.collect::<Result<Vec<_>, _>>()?;
    into_records(rows)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(contest: u32, numbers: [u8; 6]) -> DrawRecord {
        DrawRecord::new(contest, numbers).unwrap()
    }

    #[test]
    fn test_insert_and_count() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        insert_draw(&conn, &test_draw(1, [1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        let inserted = insert_draw(&conn, &test_draw(1, [1, 2, 3, 4, 5, 6])).unwrap();
        assert!(inserted);
        let inserted = insert_draw(&conn, &test_draw(1, [7, 8, 9, 10, 11, 12])).unwrap();
        assert!(!inserted);
        assert_eq!(count_draws(&conn).unwrap(), 1);
    }

    #[test]
    fn test_fetch_order() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        insert_draw(&conn, &test_draw(1, [1, 2, 3, 4, 5, 6])).unwrap();
        insert_draw(&conn, &test_draw(3, [13, 14, 15, 16, 17, 18])).unwrap();
        insert_draw(&conn, &test_draw(2, [7, 8, 9, 10, 11, 12])).unwrap();

        let all = fetch_all_draws(&conn).unwrap();
        assert_eq!(all.iter().map(|d| d.index()).collect::<Vec<_>>(), vec![1, 2, 3]);

        let last = fetch_last_draws(&conn, 2).unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].index(), 3);
        assert_eq!(last[1].numbers(), &[7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_positional_order_preserved() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        insert_draw(&conn, &test_draw(1, [42, 7, 19, 3, 55, 30])).unwrap();
        let all = fetch_all_draws(&conn).unwrap();
        assert_eq!(all[0].numbers(), &[42, 7, 19, 3, 55, 30]);
    }
}
