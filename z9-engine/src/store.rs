use std::collections::HashMap;

use anyhow::Result;
use z9_db::models::{DrawRecord, PICK_COUNT};

/// Historique immuable des tirages et fréquences de co-occurrence des paires.
#[derive(Debug, Clone, Default)]
pub struct DrawStore {
    draws: Vec<DrawRecord>,
    pairs: HashMap<(u8, u8), f64>,
}

fn pair_key(a: u8, b: u8) -> (u8, u8) {
    if a <= b { (a, b) } else { (b, a) }
}

impl DrawStore {
    /// Construit le store à partir de tirages dans l'ordre d'arrivée (index réattribués à partir de 1).
    pub fn from_records(records: Vec<DrawRecord>) -> Self {
        let draws: Vec<DrawRecord> = records
            .iter()
            .enumerate()
            .map(|(i, r)| r.with_index(i as u32 + 1))
            .collect();
        let pairs = build_pair_table(&draws);
        Self { draws, pairs }
    }

    /// Valide puis charge des tirages bruts.
    pub fn load(numbers: &[[u8; PICK_COUNT]]) -> Result<Self> {
        let records = numbers
            .iter()
            .enumerate()
            .map(|(i, n)| DrawRecord::new(i as u32 + 1, *n))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_records(records))
    }

    /// Tirages du plus ancien au plus récent.
    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Les `window` derniers tirages (ordre chronologique).
    pub fn recent(&self, window: usize) -> &[DrawRecord] {
        let start = self.draws.len().saturating_sub(window);
        &self.draws[start..]
    }

    /// Fraction des tirages contenant la paire {a, b}. 0 si jamais vue.
    pub fn co_occurrence(&self, a: u8, b: u8) -> f64 {
        self.pairs.get(&pair_key(a, b)).copied().unwrap_or(0.0)
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }
}

fn build_pair_table(draws: &[DrawRecord]) -> HashMap<(u8, u8), f64> {
    let mut counts: HashMap<(u8, u8), u32> = HashMap::new();
    for draw in draws {
        let numbers = draw.numbers();
        for i in 0..numbers.len() {
            for j in (i + 1)..numbers.len() {
                *counts.entry(pair_key(numbers[i], numbers[j])).or_insert(0) += 1;
            }
        }
    }

    let total = draws.len() as f64;
    counts
        .into_iter()
        .map(|(pair, count)| (pair, count as f64 / total))
        .collect()
}

/// Historique synthétique pour les tests : numéros impairs consécutifs décalés à chaque tirage.
pub fn make_test_draws(n: usize) -> Vec<DrawRecord> {
    (0..n)
        .filter_map(|i| {
            let start = ((i * 13) % 49) as u8;
            let numbers = [start + 1, start + 3, start + 5, start + 7, start + 9, start + 11];
            DrawRecord::new(i as u32 + 1, numbers).ok()
        })
        .collect()
}
