use std::env;

const DEFAULT_ADDR: &str = "127.0.0.1:6379";
const DEFAULT_CONCURRENCY: usize = 50;
const DEFAULT_OPS: usize = 100_000;
const DEFAULT_DIMENSION: usize = 128;
const DEFAULT_SEED_POINTS: usize = 1_000;
const DEFAULT_SEARCH_K: usize = 10;
const DEFAULT_STORE_POINTS: usize = 10_000;
const DEFAULT_STORE_QUERIES: usize = 200;

#[derive(Debug, Clone)]
pub(crate) struct BenchConfig {
    pub(crate) addr: String,
    pub(crate) concurrency: usize,
    pub(crate) ops: usize,
    pub(crate) dimension: usize,
    pub(crate) seed_points: usize,
    pub(crate) search_k: usize,
    pub(crate) store_points: usize,
    pub(crate) store_queries: usize,
}

pub(crate) fn load_config() -> BenchConfig {
    BenchConfig {
        addr: env::var("VEX_BENCH_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
        concurrency: read_usize_env_with_min("VEX_BENCH_CONCURRENCY", DEFAULT_CONCURRENCY, 1),
        ops: read_usize_env_with_min("VEX_BENCH_OPS", DEFAULT_OPS, 1),
        dimension: read_usize_env_with_min("VEX_BENCH_DIMENSION", DEFAULT_DIMENSION, 1),
        seed_points: read_usize_env_with_min("VEX_BENCH_SEED_POINTS", DEFAULT_SEED_POINTS, 0),
        search_k: read_usize_env_with_min("VEX_BENCH_SEARCH_K", DEFAULT_SEARCH_K, 1),
        store_points: read_usize_env_with_min("VEX_BENCH_STORE_POINTS", DEFAULT_STORE_POINTS, 1),
        store_queries: read_usize_env_with_min(
            "VEX_BENCH_STORE_QUERIES",
            DEFAULT_STORE_QUERIES,
            1,
        ),
    }
}

fn read_usize_env_with_min(key: &str, default: usize, min: usize) -> usize {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value >= min => value,
        Ok(value) => {
            eprintln!(
                "warn=invalid_env env={key} value={value} reason=\"must be >= {min}\" using_default={default}"
            );
            default
        }
        Err(_) => {
            eprintln!(
                "warn=invalid_env env={key} value=\"{raw}\" reason=\"parse_usize_failed\" using_default={default}"
            );
            default
        }
    }
}
