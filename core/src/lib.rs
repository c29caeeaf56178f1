#![forbid(unsafe_code)]
//! Core primitives for Vex.
//!
//! Vector math, the partitioned in-memory store with exact top-k search and
//! the RESP wire codec shared by the server and benchmark crates.

pub mod protocol;
pub mod store;
pub mod topk;
pub mod vector;

pub use protocol::{
    format_vector, parse_vector, ProtocolError, RespReader, RespWriter, VectorLiteralError,
};
pub use store::{Store, StoreConfig, StoreError, StoreStats, DEFAULT_PARTITIONS};
pub use topk::{SearchResult, TopK};
pub use vector::{
    cosine_similarity, dot_product, euclidean_distance, magnitude, normalize, VectorError,
};
