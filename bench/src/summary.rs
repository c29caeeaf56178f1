/// Latency distribution of one benchmark run, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LatencySummary {
    pub(crate) min_ms: f64,
    pub(crate) avg_ms: f64,
    pub(crate) p50_ms: f64,
    pub(crate) p95_ms: f64,
    pub(crate) p99_ms: f64,
    pub(crate) max_ms: f64,
}

impl LatencySummary {
    pub(crate) fn from_samples(samples_ms: &[f64]) -> Self {
        if samples_ms.is_empty() {
            return Self {
                min_ms: 0.0,
                avg_ms: 0.0,
                p50_ms: 0.0,
                p95_ms: 0.0,
                p99_ms: 0.0,
                max_ms: 0.0,
            };
        }

        let mut sorted = samples_ms.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self {
            min_ms: sorted[0],
            avg_ms: sorted.iter().sum::<f64>() / sorted.len() as f64,
            p50_ms: percentile_sorted(&sorted, 0.50),
            p95_ms: percentile_sorted(&sorted, 0.95),
            p99_ms: percentile_sorted(&sorted, 0.99),
            max_ms: sorted[sorted.len() - 1],
        }
    }

    /// `key=value` fields appended to a bench report line.
    pub(crate) fn fields(&self) -> String {
        format!(
            "min_ms={:.6} avg_ms={:.6} p50_ms={:.6} p95_ms={:.6} p99_ms={:.6} max_ms={:.6}",
            self.min_ms, self.avg_ms, self.p50_ms, self.p95_ms, self.p99_ms, self.max_ms
        )
    }
}

fn percentile_sorted(sorted: &[f64], quantile: f64) -> f64 {
    let last_index = sorted.len().saturating_sub(1);
    let position = (quantile.clamp(0.0, 1.0) * last_index as f64).round() as usize;
    sorted[position]
}

/// Reproducible, never-zero vector for `seed`.
pub(crate) fn deterministic_vector(seed: u64, dimension: usize) -> Vec<f32> {
    (0..dimension)
        .map(|index| {
            let mixed = (seed as usize)
                .wrapping_mul(2_654_435_761)
                .wrapping_add(index.wrapping_mul(40_503))
                % 10_000;
            (mixed as f32 + 1.0) / 10_000.0
        })
        .collect()
}
