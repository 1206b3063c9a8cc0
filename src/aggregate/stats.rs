// src/aggregate/stats.rs

use serde::Serialize;
use std::f64::consts::PI;

/// Points at which the density curve is evaluated.
pub const KDE_POINTS: usize = 200;

/// Upper bound on histogram bins.
pub const MAX_BINS: usize = 1_000;

/// Whisker reach, in IQRs beyond the box.
pub const WHISKER_IQR: f64 = 1.5;

/// Quantile of already-sorted data by linear interpolation between the two
/// nearest ranks. `sorted` must be non-empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Sample standard deviation (n - 1 in the denominator).
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1.0)).sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Histogram with an automatically chosen bin count: the narrower of the
    /// Sturges and Freedman–Diaconis widths, at most [`MAX_BINS`]. Non-finite
    /// values are skipped. `None` for no data.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let sorted = sorted_copy(&finite);
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);

        if max == min {
            return Some(Self {
                edges: vec![min - 0.5, max + 0.5],
                counts: vec![sorted.len()],
            });
        }

        let bins = auto_bin_count(&sorted);
        // max - min can overflow for values of opposite sign near f64::MAX
        let width = max / bins as f64 - min / bins as f64;
        let edges = (0..=bins)
            .map(|i| {
                let t = i as f64 / bins as f64;
                min * (1.0 - t) + max * t
            })
            .collect();

        let mut counts = vec![0usize; bins];
        for v in &sorted {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Some(Self { edges, counts })
    }

    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(lo), Some(hi)) if !self.counts.is_empty() => {
                let n = self.counts.len() as f64;
                hi / n - lo / n
            }
            _ => 0.0,
        }
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// `sorted` must be finite and span a non-zero range.
///
/// When the Freedman–Diaconis width would need more than [`MAX_BINS`] bins
/// (a few extreme outliers over a tight body) the Sturges count is used.
fn auto_bin_count(sorted: &[f64]) -> usize {
    let n = sorted.len() as f64;
    let sturges = (n.log2() + 1.0).ceil().max(1.0);

    let range = sorted[sorted.len() - 1] - sorted[0];
    let iqr = quantile(sorted, 0.75) - quantile(sorted, 0.25);
    let fd_width = 2.0 * iqr * n.powf(-1.0 / 3.0);
    if !(fd_width > 0.0) || !range.is_finite() {
        return (sturges as usize).min(MAX_BINS);
    }

    let fd = (range / fd_width).ceil();
    let bins = if fd > MAX_BINS as f64 { sturges } else { fd.max(sturges) };
    (bins as usize).clamp(1, MAX_BINS)
}

/// Gaussian kernel density estimate, already scaled to histogram counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityCurve {
    pub bandwidth: f64,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl DensityCurve {
    /// Scott's-rule bandwidth, evaluated across the data range and multiplied
    /// by `n * bin_width` so it overlays the histogram. `None` when the data
    /// has no spread.
    pub fn estimate(values: &[f64], bin_width: f64) -> Option<Self> {
        let n = values.len();
        if n < 2 {
            return None;
        }
        let bandwidth = sample_std(values) * (n as f64).powf(-0.2);
        if !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return None;
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let step = (max - min) / (KDE_POINTS - 1) as f64;
        let norm = 1.0 / (n as f64 * bandwidth * (2.0 * PI).sqrt());
        let scale = n as f64 * bin_width;

        let xs: Vec<f64> = (0..KDE_POINTS).map(|i| min + step * i as f64).collect();
        let ys = xs
            .iter()
            .map(|x| {
                let density: f64 = values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                    .sum::<f64>()
                    * norm;
                density * scale
            })
            .collect();

        Some(Self { bandwidth, xs, ys })
    }
}

/// Five-number summary plus outliers for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sorted = sorted_copy(values);
        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = WHISKER_IQR * (q3 - q1);
        let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);

        let inside = sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
        let whisker_low = inside.clone().next().unwrap_or(q1);
        let whisker_high = inside.last().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Smallest and largest value drawn (whiskers or outliers).
    pub fn extent(&self) -> (f64, f64) {
        self.outliers.iter().fold(
            (self.whisker_low, self.whisker_high),
            |(lo, hi), v| (lo.min(*v), hi.max(*v)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert_eq!(quantile(&v, 0.5), 2.5);
        assert_eq!(quantile(&v, 0.25), 1.75);
        assert_eq!(quantile(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn histogram_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let h = Histogram::from_values(&values).unwrap();
        assert_eq!(h.edges.len(), h.counts.len() + 1);
        assert_eq!(h.counts.iter().sum::<usize>(), 100);
        assert_eq!(h.edges[0], 0.0);
        assert!((h.edges[h.counts.len()] - 99.0).abs() < 1e-9);
        // Sturges is narrower than FD for evenly spread data
        assert_eq!(h.counts.len(), 8);
    }

    #[test]
    fn histogram_single_value_gets_one_bin() {
        let h = Histogram::from_values(&[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(h.counts, vec![3]);
        assert_eq!(h.edges, vec![4.5, 5.5]);
        assert_eq!(h.bin_width(), 1.0);
    }

    #[test]
    fn far_outlier_keeps_bins_bounded() {
        let mut values: Vec<f64> = (0..99).map(|i| i as f64).collect();
        values.push(1e9);
        let h = Histogram::from_values(&values).unwrap();
        assert!(h.counts.len() <= MAX_BINS);
        // 100 values → Sturges count
        assert_eq!(h.counts.len(), 8);
        assert_eq!(h.counts.iter().sum::<usize>(), 100);
        assert_eq!(h.counts[0], 99);
        assert_eq!(*h.counts.last().unwrap(), 1);
    }

    #[test]
    fn extreme_range_stays_finite() {
        let h = Histogram::from_values(&[-1e308, 0.0, 1e308]).unwrap();
        assert!(h.counts.len() <= MAX_BINS);
        assert_eq!(h.counts.iter().sum::<usize>(), 3);
        assert!(h.bin_width().is_finite() && h.bin_width() > 0.0);
    }

    #[test]
    fn non_finite_values_are_skipped() {
        let h = Histogram::from_values(&[1.0, 2.0, f64::INFINITY, f64::NAN]).unwrap();
        assert_eq!(h.counts.iter().sum::<usize>(), 2);
        assert!(Histogram::from_values(&[f64::INFINITY]).is_none());
    }

    #[test]
    fn histogram_empty_is_none() {
        assert!(Histogram::from_values(&[]).is_none());
    }

    #[test]
    fn density_area_matches_counts() {
        let values: Vec<f64> = (0..50).map(|i| (i % 10) as f64 * 3.0).collect();
        let h = Histogram::from_values(&values).unwrap();
        let kde = DensityCurve::estimate(&values, h.bin_width()).unwrap();
        assert_eq!(kde.xs.len(), KDE_POINTS);
        assert!(kde.ys.iter().all(|y| *y >= 0.0));

        // integral of a counts-scaled density over the data range is close to n * width
        let step = kde.xs[1] - kde.xs[0];
        let area: f64 = kde.ys.iter().sum::<f64>() * step;
        let expected = values.len() as f64 * h.bin_width();
        assert!(area > 0.7 * expected && area < 1.05 * expected);
    }

    #[test]
    fn density_needs_spread() {
        assert!(DensityCurve::estimate(&[1.0], 1.0).is_none());
        assert!(DensityCurve::estimate(&[2.0, 2.0], 1.0).is_none());
    }

    #[test]
    fn box_stats_flags_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let b = BoxStats::from_values(&values).unwrap();
        assert_eq!(b.median, 3.5);
        assert_eq!(b.q1, 2.25);
        assert_eq!(b.q3, 4.75);
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.whisker_high, 5.0);
        assert_eq!(b.outliers, vec![100.0]);
        assert_eq!(b.extent(), (1.0, 100.0));
    }

    #[test]
    fn box_stats_single_value() {
        let b = BoxStats::from_values(&[20.0]).unwrap();
        assert_eq!((b.q1, b.median, b.q3), (20.0, 20.0, 20.0));
        assert_eq!((b.whisker_low, b.whisker_high), (20.0, 20.0));
        assert!(b.outliers.is_empty());
    }
}
