use std::io;
use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use vex_core::{format_vector, ProtocolError, RespReader, RespWriter};

use crate::config::BenchConfig;
use crate::summary::{deterministic_vector, LatencySummary};

const SEARCH_SEED_OFFSET: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Insert,
    Search,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Self::Insert => "network_insert",
            Self::Search => "network_search",
        }
    }
}

#[derive(Debug, Default)]
struct WorkerReport {
    latencies_ms: Vec<f64>,
    successes: usize,
    errors: usize,
}

struct Connection {
    reader: RespReader<TcpStream>,
    writer: RespWriter<TcpStream>,
}

impl Connection {
    fn open(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        let write_half = stream.try_clone()?;
        Ok(Self {
            reader: RespReader::new(stream),
            writer: RespWriter::new(write_half),
        })
    }

    /// Sends one request and waits for its reply.
    fn request(&mut self, args: &[&str]) -> Result<Vec<String>, ProtocolError> {
        self.writer.write_array(args)?;
        self.writer.flush()?;
        self.reader
            .read_command()?
            .ok_or(ProtocolError::UnexpectedEof)
    }
}

pub(crate) fn run_insert_bench(mode: &str, config: &BenchConfig) -> bool {
    run_network_bench(mode, config, Operation::Insert)
}

pub(crate) fn run_search_bench(mode: &str, config: &BenchConfig) -> bool {
    if !seed_points(config) {
        return false;
    }
    run_network_bench(mode, config, Operation::Search)
}

fn seed_points(config: &BenchConfig) -> bool {
    let mut connection = match Connection::open(&config.addr) {
        Ok(connection) => connection,
        Err(error) => {
            eprintln!("error=connect_failed addr={} detail=\"{error}\"", config.addr);
            return false;
        }
    };

    let started_at = Instant::now();
    for index in 0..config.seed_points {
        let key = format!("seed:{index}");
        let literal = format_vector(&deterministic_vector(index as u64, config.dimension));
        if let Err(error) = connection.request(&["VSET", &key, &literal]) {
            eprintln!("error=seed_failed key={key} detail=\"{error}\"");
            return false;
        }
    }
    eprintln!(
        "info=seeded points={} elapsed_ms={:.3}",
        config.seed_points,
        started_at.elapsed().as_secs_f64() * 1_000.0
    );
    true
}

fn run_network_bench(mode: &str, config: &BenchConfig, operation: Operation) -> bool {
    let workers = config.concurrency.min(config.ops);
    let started_at = Instant::now();
    let reports: Vec<WorkerReport> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let share = config.ops / workers + usize::from(worker < config.ops % workers);
                scope.spawn(move || run_worker(config, operation, worker, share))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| WorkerReport {
                    errors: 1,
                    ..WorkerReport::default()
                })
            })
            .collect()
    });
    let total = started_at.elapsed();

    let mut latencies_ms = Vec::with_capacity(config.ops);
    let mut successes = 0usize;
    let mut errors = 0usize;
    for report in reports {
        latencies_ms.extend(report.latencies_ms);
        successes += report.successes;
        errors += report.errors;
    }

    let summary = LatencySummary::from_samples(&latencies_ms);
    let qps = throughput(successes + errors, total);
    println!(
        "bench={} mode={mode} addr={} concurrency={workers} ops={} dimension={} total_ms={:.3} qps={qps:.2} successes={successes} errors={errors} {}",
        operation.name(),
        config.addr,
        config.ops,
        config.dimension,
        total.as_secs_f64() * 1_000.0,
        summary.fields()
    );

    successes > 0
}

fn run_worker(
    config: &BenchConfig,
    operation: Operation,
    worker: usize,
    share: usize,
) -> WorkerReport {
    let mut report = WorkerReport {
        latencies_ms: Vec::with_capacity(share),
        ..WorkerReport::default()
    };
    let mut connection = match Connection::open(&config.addr) {
        Ok(connection) => connection,
        Err(error) => {
            eprintln!("error=connect_failed worker={worker} detail=\"{error}\"");
            report.errors = share;
            return report;
        }
    };
    let k = config.search_k.to_string();

    for index in 0..share {
        let seed = (worker * share + index) as u64;
        let started_at = Instant::now();
        let result = match operation {
            Operation::Insert => {
                let key = format!("bench:{worker}:{index}");
                let literal = format_vector(&deterministic_vector(seed, config.dimension));
                connection.request(&["VSET", &key, &literal])
            }
            Operation::Search => {
                let literal = format_vector(&deterministic_vector(
                    SEARCH_SEED_OFFSET + seed,
                    config.dimension,
                ));
                connection.request(&["VSEARCH", &literal, &k])
            }
        };

        match result {
            Ok(_) => {
                report.successes += 1;
                report
                    .latencies_ms
                    .push(started_at.elapsed().as_secs_f64() * 1_000.0);
            }
            Err(ProtocolError::ErrorReply(message)) => {
                if report.errors == 0 {
                    eprintln!("warn=command_failed worker={worker} detail=\"{message}\"");
                }
                report.errors += 1;
            }
            Err(error) => {
                eprintln!("error=connection_failed worker={worker} detail=\"{error}\"");
                report.errors += share - index;
                break;
            }
        }
    }

    report
}

pub(crate) fn throughput(operations: usize, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        operations as f64 / seconds
    } else {
        0.0
    }
}
