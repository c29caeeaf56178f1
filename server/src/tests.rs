use std::io::Cursor;

use vex_core::{RespReader, RespWriter};

use crate::config::{AppConfig, LogFormat};
use crate::connection::{run_session, SessionEnd};
use crate::state::AppState;


fn test_config() -> AppConfig {
    AppConfig {
        bind: "127.0.0.1:0".parse().expect("socket addr must parse"),
        partitions: 4,
        strict_finite: true,
        max_dimension: 8,
        max_topk: 100,
        max_connections: 16,
        idle_timeout_ms: 5_000,
        log_format: LogFormat::Text,
    }
}

fn test_state() -> AppState {
    AppState::new(test_config()).expect("test state must build")
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

fn encode_requests(requests: &[&[&str]]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut writer = RespWriter::new(&mut out);
        for request in requests {
            writer
                .write_array(*request)
                .expect("request must encode");
        }
        writer.flush().expect("request must flush");
    }
    out
}

/// Feeds `input` through a session and returns the raw reply bytes.
fn run_script(state: &AppState, input: &[u8]) -> (String, SessionEnd) {
    let mut reader = RespReader::new(Cursor::new(input.to_vec()));
    let mut output = Vec::new();
    let end = {
        let mut writer = RespWriter::new(&mut output);
        run_session(state, &mut reader, &mut writer)
    };
    (
        String::from_utf8(output).expect("replies must be utf-8"),
        end,
    )
}
