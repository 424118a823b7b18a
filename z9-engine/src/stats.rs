use std::collections::HashMap;
use std::hash::Hash;

/// Variance d'échantillon (n - 1). 0 en dessous de deux valeurs.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Entropie de Shannon (bits) des valeurs observées.
pub fn shannon_entropy<T: Hash + Eq>(values: &[T]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut counts: HashMap<&T, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    let total = values.len() as f64;
    let probs: Vec<f64> = counts.values().map(|&c| c as f64 / total).collect();
    distribution_entropy(&probs)
}

/// Entropie (bits) d'une distribution de probabilités.
pub fn distribution_entropy(probs: &[f64]) -> f64 {
    probs
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.log2())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_variance() {
        assert_eq!(sample_variance(&[]), 0.0);
        assert_eq!(sample_variance(&[3.0]), 0.0);
        assert!((sample_variance(&[1.0, 2.0, 3.0, 4.0]) - 1.6666666666).abs() < 1e-9);
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy::<u8>(&[]), 0.0);
        assert_eq!(shannon_entropy(&[5u8, 5, 5]), 0.0);
        assert!((shannon_entropy(&[1u8, 2]) - 1.0).abs() < 1e-12);
        assert!((shannon_entropy(&[1u8, 2, 3, 4, 5, 6]) - 6f64.log2()).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_entropy_uniform() {
        let uniform = vec![1.0 / 9.0; 9];
        assert!((distribution_entropy(&uniform) - 9f64.log2()).abs() < 1e-12);
    }
}
