pub use z9_db::models::digit_root;
use z9_db::models::MAX_NUMBER;

/// Numéros de 1 à MAX_NUMBER regroupés par racine numérique, calculés une fois.
#[derive(Debug, Clone)]
pub struct DigitRootTable {
    by_root: [Vec<u8>; 9],
}

impl DigitRootTable {
    pub fn new() -> Self {
        let mut by_root: [Vec<u8>; 9] = Default::default();
        for n in 1..=MAX_NUMBER {
            by_root[(digit_root(n as u32) - 1) as usize].push(n);
        }
        Self { by_root }
    }

    /// Numéros de racine `root`, croissants. Vide hors de 1..=9.
    pub fn numbers_with_root(&self, root: u8) -> &[u8] {
        if !(1..=9).contains(&root) {
            return &[];
        }
        &self.by_root[(root - 1) as usize]
    }
}

impl Default for DigitRootTable {
    fn default() -> Self {
        Self::new()
    }
}
