use anyhow::{Result, bail};

/// Plus grand numéro tirable.
pub const MAX_NUMBER: u8 = 60;

/// Nombre de numéros par tirage.
pub const PICK_COUNT: usize = 6;

/// Racine numérique 1-9 (0 pour n = 0).
pub fn digit_root(n: u32) -> u8 {
    if n == 0 {
        return 0;
    }
    ((n - 1) % 9 + 1) as u8
}

/// Un tirage historique : 6 numéros distincts dans [1, MAX_NUMBER], dans l'ordre de la source.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    index: u32,
    numbers: [u8; PICK_COUNT],
    roots: [u8; PICK_COUNT],
    sum: u32,
}

impl DrawRecord {
    pub fn new(index: u32, numbers: [u8; PICK_COUNT]) -> Result<Self> {
        validate_numbers(&numbers)?;
        let roots = numbers.map(|n| digit_root(n as u32));
        let sum = numbers.iter().map(|&n| n as u32).sum();
        Ok(Self { index, numbers, roots, sum })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn numbers(&self) -> &[u8; PICK_COUNT] {
        &self.numbers
    }

    pub fn roots(&self) -> &[u8; PICK_COUNT] {
        &self.roots
    }

    /// Racine à la position `position` (0-based).
    pub fn root_at(&self, position: usize) -> u8 {
        self.roots[position]
    }

    pub fn sum(&self) -> u32 {
        self.sum
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    /// Copie avec un nouvel index de séquence.
    pub fn with_index(&self, index: u32) -> Self {
        Self { index, ..self.clone() }
    }
}

pub fn validate_numbers(numbers: &[u8; PICK_COUNT]) -> Result<()> {
    for &n in numbers {
        if n < 1 || n > MAX_NUMBER {
            bail!("Numéro {} hors limites (1-{})", n, MAX_NUMBER);
        }
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    Ok(())
}
