use std::error::Error;
use std::fmt;
use wide::f32x8;

/// Error type for vector math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    /// Returned when two vectors do not share the same dimension.
    DimensionMismatch { left: usize, right: usize },
    /// Returned when a direction is required from a vector of zero magnitude.
    ZeroVector,
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { left, right } => {
                write!(f, "vector dimensions do not match: left={left}, right={right}")
            }
            Self::ZeroVector => write!(f, "cannot normalize zero vector"),
        }
    }
}

impl Error for VectorError {}

fn check_dimensions(left: &[f32], right: &[f32]) -> Result<(), VectorError> {
    if left.len() != right.len() {
        return Err(VectorError::DimensionMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

/// Returns the L2 norm of `values`, or `0.0` for an empty or all-zero vector.
///
/// Squares are accumulated in `f64` so large `f32` components cannot overflow
/// the intermediate sum.
pub fn magnitude(values: &[f32]) -> f32 {
    magnitude_f64(values) as f32
}

fn magnitude_f64(values: &[f32]) -> f64 {
    values
        .iter()
        .map(|value| {
            let value = f64::from(*value);
            value * value
        })
        .sum::<f64>()
        .sqrt()
}

/// Scales `values` to unit length.
///
/// Fails with [`VectorError::ZeroVector`] when the magnitude is zero, since no
/// direction exists for such a vector.
pub fn normalize(values: &[f32]) -> Result<Vec<f32>, VectorError> {
    let magnitude = magnitude_f64(values);
    if magnitude == 0.0 {
        return Err(VectorError::ZeroVector);
    }

    Ok(values
        .iter()
        .map(|value| (f64::from(*value) / magnitude) as f32)
        .collect())
}

/// Computes the dot product between two vectors of the same dimension.
pub fn dot_product(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    check_dimensions(left, right)?;
    Ok(simd_dot(left, right))
}

/// Computes the dot product without dimension validation.
///
/// Callers must ensure both vectors have the same length.
pub fn dot_product_unchecked(left: &[f32], right: &[f32]) -> f32 {
    debug_assert_eq!(left.len(), right.len());
    simd_dot(left, right)
}

/// Computes cosine similarity in a single pass over both vectors.
///
/// For two unit vectors this equals [`dot_product`], which is what the store
/// relies on when scoring normalized entries.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    check_dimensions(left, right)?;
    let (dot, left_sq_sum, right_sq_sum) = simd_dot_and_norms(left, right);
    if left_sq_sum == 0.0 || right_sq_sum == 0.0 {
        return Err(VectorError::ZeroVector);
    }
    Ok(dot / (left_sq_sum.sqrt() * right_sq_sum.sqrt()))
}

/// Computes the Euclidean (L2) distance between two vectors.
pub fn euclidean_distance(left: &[f32], right: &[f32]) -> Result<f32, VectorError> {
    check_dimensions(left, right)?;
    Ok(simd_l2_squared(left, right).sqrt())
}

const SIMD_WIDTH: usize = 8;

/// Normalized search query packed into SIMD lanes once, then scored against
/// every stored entry.
#[derive(Debug, Clone)]
pub(crate) struct PreparedDotQuery {
    lanes: Vec<f32x8>,
    tail: Vec<f32>,
}

impl PreparedDotQuery {
    pub(crate) fn new(query: &[f32]) -> Self {
        let chunks = query.chunks_exact(SIMD_WIDTH);
        let tail = chunks.remainder().to_vec();
        Self {
            lanes: chunks.map(load_f32x8).collect(),
            tail,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lanes.len() * SIMD_WIDTH + self.tail.len()
    }

    /// Dot product against an entry of the same length. Even and odd lanes
    /// accumulate into separate registers.
    pub(crate) fn dot_unchecked(&self, entry: &[f32]) -> f32 {
        debug_assert_eq!(entry.len(), self.len());
        let mut chunks = entry.chunks_exact(SIMD_WIDTH);
        let mut sums = [f32x8::ZERO; 2];
        for (index, (lane, chunk)) in self.lanes.iter().zip(chunks.by_ref()).enumerate() {
            sums[index & 1] += *lane * load_f32x8(chunk);
        }
        let tail: f32 = self
            .tail
            .iter()
            .zip(chunks.remainder())
            .map(|(query, value)| query * value)
            .sum();
        (sums[0] + sums[1]).reduce_add() + tail
    }
}

fn load_f32x8(chunk: &[f32]) -> f32x8 {
    let mut lanes = [0.0f32; SIMD_WIDTH];
    lanes.copy_from_slice(chunk);
    f32x8::from(lanes)
}

/// Full SIMD chunks of two equal-length vectors, paired lane by lane.
fn lane_pairs<'a>(
    left: &'a [f32],
    right: &'a [f32],
) -> impl Iterator<Item = (f32x8, f32x8)> + 'a {
    left.chunks_exact(SIMD_WIDTH)
        .zip(right.chunks_exact(SIMD_WIDTH))
        .map(|(left, right)| (load_f32x8(left), load_f32x8(right)))
}

/// Components past the last full chunk of two equal-length vectors.
fn tail_pairs<'a>(
    left: &'a [f32],
    right: &'a [f32],
) -> impl Iterator<Item = (f32, f32)> + 'a {
    let start = left.len() - left.len() % SIMD_WIDTH;
    left[start..].iter().copied().zip(right[start..].iter().copied())
}

fn simd_dot(left: &[f32], right: &[f32]) -> f32 {
    let head = lane_pairs(left, right)
        .fold(f32x8::ZERO, |sum, (l, r)| sum + l * r)
        .reduce_add();
    head + tail_pairs(left, right).map(|(l, r)| l * r).sum::<f32>()
}

fn simd_l2_squared(left: &[f32], right: &[f32]) -> f32 {
    let head = lane_pairs(left, right)
        .fold(f32x8::ZERO, |sum, (l, r)| {
            let delta = l - r;
            sum + delta * delta
        })
        .reduce_add();
    let tail: f32 = tail_pairs(left, right)
        .map(|(l, r)| (l - r) * (l - r))
        .sum();
    head + tail
}

/// Returns `(dot, |left|^2, |right|^2)` from one pass.
fn simd_dot_and_norms(left: &[f32], right: &[f32]) -> (f32, f32, f32) {
    let (dot, left_sq, right_sq) = lane_pairs(left, right).fold(
        (f32x8::ZERO, f32x8::ZERO, f32x8::ZERO),
        |(dot, left_sq, right_sq), (l, r)| (dot + l * r, left_sq + l * l, right_sq + r * r),
    );
    tail_pairs(left, right).fold(
        (dot.reduce_add(), left_sq.reduce_add(), right_sq.reduce_add()),
        |(dot, left_sq, right_sq), (l, r)| (dot + l * r, left_sq + l * l, right_sq + r * r),
    )
}

#[cfg(test)]
mod tests;
