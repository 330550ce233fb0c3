//! Descriptive statistics over a single numeric column.
//!
//! Callers pass only the non-missing values of a column. Results are `None`
//! where the statistic is undefined for the input size.

use std::cmp::Ordering;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Most frequent value; among equally frequent values the smallest wins.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let value = sorted[i];
        let run = sorted[i..].iter().take_while(|v| v.total_cmp(&value) == Ordering::Equal).count();
        // Strictly greater keeps the earliest (smallest) value on ties.
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((value, run));
        }
        i += run;
    }
    best.map(|(value, _)| value)
}

/// Sample standard deviation (`n - 1` denominator). Undefined below two values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation of paired observations.
///
/// Undefined with fewer than two pairs or when either side has zero variance.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let (x0, y0) = *pairs.first()?;
    if pairs.len() < 2 || pairs.iter().all(|p| p.0 == x0) || pairs.iter().all(|p| p.1 == y0) {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_median() {
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn mode_prefers_smallest_on_ties() {
        assert_eq!(mode(&[3.0, 3.0, 5.0, 5.0, 1.0]), Some(3.0));
        assert_eq!(mode(&[9.0, 2.0, 9.0]), Some(9.0));
        assert_eq!(mode(&[7.0, 4.0, 6.0]), Some(4.0));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn std_dev_is_sample_and_needs_two_values() {
        assert_eq!(std_dev(&[42.0]), None);
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138089935299395).abs() < 1e-12);
    }

    #[test]
    fn pearson_edge_cases() {
        let r = pearson(&[(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)]).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let r = pearson(&[(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]), None);
        assert_eq!(pearson(&[(1.0, 5.0)]), None);
        assert_eq!(pearson(&[]), None);
    }

    #[test]
    fn constant_fraction_column_has_no_correlation() {
        // 0.1 is not exact in binary, so the mean leaves tiny residuals.
        assert_eq!(pearson(&[(1.0, 0.1), (2.0, 0.1), (7.0, 0.1)]), None);
        assert_eq!(pearson(&[(0.1, 10.0), (0.1, 30.0), (0.1, 20.0)]), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(2.138089935, 2), 2.14);
        assert_eq!(round_to(-1.005, 1), -1.0);
        assert_eq!(round_to(101.4999, 2), 101.5);
    }
}
