use std::time::Instant;

use vex_core::Store;

use crate::config::BenchConfig;
use crate::network_bench::throughput;
use crate::summary::{deterministic_vector, LatencySummary};

/// In-process set and search throughput, without the network hop.
pub(crate) fn run_store_bench(mode: &str, config: &BenchConfig) -> bool {
    let store = Store::new();
    let dataset: Vec<Vec<f32>> = (0..config.store_points)
        .map(|index| deterministic_vector(index as u64, config.dimension))
        .collect();
    let keys: Vec<String> = (0..config.store_points)
        .map(|index| format!("point:{index}"))
        .collect();

    let set_started = Instant::now();
    for (key, values) in keys.iter().zip(&dataset) {
        if let Err(error) = store.set(key, values) {
            eprintln!("error=store_set_failed key={key} detail=\"{error}\"");
            return false;
        }
    }
    let set_elapsed = set_started.elapsed();

    let mut search_ms = Vec::with_capacity(config.store_queries);
    let mut checksum = 0usize;
    let search_started = Instant::now();
    for query_id in 0..config.store_queries {
        let query = deterministic_vector(u64::MAX - query_id as u64, config.dimension);
        let started_at = Instant::now();
        match store.search(&query, config.search_k) {
            Ok(results) => checksum = checksum.wrapping_add(results.len()),
            Err(error) => {
                eprintln!("error=store_search_failed query={query_id} detail=\"{error}\"");
                return false;
            }
        }
        search_ms.push(started_at.elapsed().as_secs_f64() * 1_000.0);
    }
    let search_elapsed = search_started.elapsed();

    let summary = LatencySummary::from_samples(&search_ms);
    println!(
        "bench=store mode={mode} points={} dimension={} partitions={} queries={} k={} set_ms={:.3} set_qps={:.2} search_ms={:.3} search_qps={:.2} checksum={checksum} {}",
        config.store_points,
        config.dimension,
        store.partition_count(),
        config.store_queries,
        config.search_k,
        set_elapsed.as_secs_f64() * 1_000.0,
        throughput(config.store_points, set_elapsed),
        search_elapsed.as_secs_f64() * 1_000.0,
        throughput(config.store_queries, search_elapsed),
        summary.fields()
    );

    true
}
