#![forbid(unsafe_code)]
//! Benchmarks for Vex.
//!
//! Scenarios (`VEX_BENCH_SCENARIO`):
//! - `insert`: concurrent `VSET` against a running server
//! - `search`: seeds the server, then runs concurrent `VSEARCH`
//! - `store`: in-process set and search on the store, no server needed
//! - `all`: every scenario above, in that order

use std::env;
use std::process;

mod config;
mod network_bench;
mod store_bench;
mod summary;

use crate::config::load_config;
use crate::network_bench::{run_insert_bench, run_search_bench};
use crate::store_bench::run_store_bench;

fn main() {
    if cfg!(debug_assertions) && env::var("VEX_ALLOW_DEBUG_BENCH").as_deref() != Ok("1") {
        eprintln!("error=debug_build_not_allowed message=\"run `cargo run --release -p vex-bench`\"");
        process::exit(2);
    }

    let mode = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    let config = load_config();
    let scenario = env::var("VEX_BENCH_SCENARIO").unwrap_or_else(|_| "all".to_string());
    let ok = match scenario.as_str() {
        "all" => {
            run_insert_bench(mode, &config)
                && run_search_bench(mode, &config)
                && run_store_bench(mode, &config)
        }
        "insert" => run_insert_bench(mode, &config),
        "search" => run_search_bench(mode, &config),
        "store" => run_store_bench(mode, &config),
        _ => {
            eprintln!(
                "error=invalid_scenario scenario=\"{scenario}\" allowed=\"all,insert,search,store\""
            );
            false
        }
    };

    if !ok {
        process::exit(1);
    }
}
