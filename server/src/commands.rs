//! Command dispatch.
//!
//! | Command            | Reply                                        |
//! |--------------------|----------------------------------------------|
//! | `VSET key vector`  | `+OK`                                        |
//! | `VGET key`         | bulk `[0.100000, ...]`, or null bulk         |
//! | `VDEL key`         | `:1` if removed, `:0` otherwise              |
//! | `VSEARCH vector k` | array of keys, most similar first            |
//! | `CLEAR`            | `+OK`                                        |
//! | `PING [message]`   | `+PONG`, or the message as a bulk string     |
//! | `ECHO message`     | the message as a bulk string                 |
//! | `STATS` / `INFO`   | bulk JSON stats document                     |
//! | `QUIT`             | `+OK`, then the connection is closed         |

use std::io::{self, Write};

use vex_core::{format_vector, parse_vector, RespWriter};

use crate::errors::CommandError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reply {
    Status(&'static str),
    Bulk(String),
    Null,
    Integer(i64),
    Array(Vec<String>),
    /// `+OK` followed by closing the connection.
    Goodbye,
}

impl Reply {
    pub(crate) fn write_to<W: Write>(&self, out: &mut RespWriter<W>) -> io::Result<()> {
        match self {
            Self::Status(text) => out.write_simple_string(text),
            Self::Bulk(value) => out.write_bulk_string(value),
            Self::Null => out.write_null_bulk_string(),
            Self::Integer(value) => out.write_integer(*value),
            Self::Array(items) => out.write_array(items.as_slice()),
            Self::Goodbye => out.write_simple_string("OK"),
        }
    }

    pub(crate) fn closes_connection(&self) -> bool {
        matches!(self, Self::Goodbye)
    }
}

/// Executes one request. `args` must be non-empty; the first element is the
/// case-insensitive command name.
pub(crate) fn dispatch(state: &AppState, args: &[String]) -> Result<Reply, CommandError> {
    let Some((name, rest)) = args.split_first() else {
        return Err(CommandError::invalid_argument("empty command"));
    };
    let command = name.to_ascii_uppercase();

    match command.as_str() {
        "VSET" => {
            let [key, literal] = expect_args::<2>(&command, rest)?;
            let values = parse_bounded_vector(state, literal)?;
            state.store.set(key, &values)?;
            Ok(Reply::Status("OK"))
        }
        "VGET" => {
            let [key] = expect_args::<1>(&command, rest)?;
            Ok(state
                .store
                .get(key)
                .map_or(Reply::Null, |values| Reply::Bulk(format_vector(&values))))
        }
        "VDEL" => {
            let [key] = expect_args::<1>(&command, rest)?;
            Ok(Reply::Integer(i64::from(state.store.delete(key))))
        }
        "VSEARCH" => {
            let [literal, raw_k] = expect_args::<2>(&command, rest)?;
            let k = parse_k(raw_k, state.config.max_topk)?;
            let query = parse_bounded_vector(state, literal)?;
            let results = state.store.search(&query, k)?;
            Ok(Reply::Array(
                results.into_iter().map(|result| result.key).collect(),
            ))
        }
        "CLEAR" => {
            let [] = expect_args::<0>(&command, rest)?;
            state.store.clear();
            Ok(Reply::Status("OK"))
        }
        "PING" => match rest {
            [] => Ok(Reply::Status("PONG")),
            [message] => Ok(Reply::Bulk(message.clone())),
            _ => Err(CommandError::wrong_arity(&command)),
        },
        "ECHO" => {
            let [message] = expect_args::<1>(&command, rest)?;
            Ok(Reply::Bulk(message.clone()))
        }
        "STATS" | "INFO" => {
            let [] = expect_args::<0>(&command, rest)?;
            let snapshot = state.stats.snapshot(&state.store);
            let json = serde_json::to_string_pretty(&snapshot)
                .map_err(|error| CommandError::internal(format!("failed to encode stats: {error}")))?;
            Ok(Reply::Bulk(json))
        }
        "QUIT" => {
            let [] = expect_args::<0>(&command, rest)?;
            Ok(Reply::Goodbye)
        }
        _ => Err(CommandError::unknown_command(&command)),
    }
}

fn expect_args<'a, const N: usize>(
    command: &str,
    args: &'a [String],
) -> Result<&'a [String; N], CommandError> {
    args.try_into()
        .map_err(|_| CommandError::wrong_arity(command))
}

fn parse_bounded_vector(state: &AppState, literal: &str) -> Result<Vec<f32>, CommandError> {
    let values = parse_vector(literal)?;
    let max_dimension = state.config.max_dimension;
    if values.len() > max_dimension {
        return Err(CommandError::invalid_argument(format!(
            "dimension {} exceeds configured maximum {max_dimension}",
            values.len()
        )));
    }
    Ok(values)
}

fn parse_k(raw: &str, max_topk: usize) -> Result<usize, CommandError> {
    let k = raw
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|k| *k > 0)
        .ok_or_else(|| CommandError::invalid_argument("k must be a positive integer"))?;
    match usize::try_from(k) {
        Ok(k) if k <= max_topk => Ok(k),
        _ => Err(CommandError::invalid_argument(format!(
            "k must not exceed {max_topk}"
        ))),
    }
}
