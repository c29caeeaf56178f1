use super::*;

const EPSILON: f32 = 1e-5;

fn approx_eq(left: f32, right: f32) {
    assert!((left - right).abs() < EPSILON, "expected {left} ~= {right}");
}

fn approx_eq_tol(left: f32, right: f32, epsilon: f32) {
    assert!((left - right).abs() < epsilon, "expected {left} ~= {right}");
}

fn deterministic_vector(seed: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|index| {
            let mixed = seed
                .wrapping_mul(1_103_515_245)
                .wrapping_add(index.wrapping_mul(12_345))
                .wrapping_add(97);
            let base = (mixed % 10_000) as f32 / 5_000.0;
            base - 1.0
        })
        .collect()
}

#[test]
fn magnitude_works() {
    approx_eq(magnitude(&[3.0, 4.0]), 5.0);
    approx_eq(magnitude(&[1.0, 0.0, 0.0]), 1.0);
    assert_eq!(magnitude(&[0.0, 0.0, 0.0]), 0.0);
    assert_eq!(magnitude(&[]), 0.0);
}

#[test]
fn magnitude_does_not_overflow_on_large_components() {
    let value = magnitude(&[3.0e30, 4.0e30]);
    assert!(value.is_finite());
    approx_eq_tol(value / 1.0e30, 5.0, 1e-4);
}

#[test]
fn normalize_works() {
    let normalized = normalize(&[3.0, 4.0]).expect("normalize should succeed");
    approx_eq(normalized[0], 0.6);
    approx_eq(normalized[1], 0.8);
}

#[test]
fn normalize_rejects_zero_and_empty_vectors() {
    assert_eq!(normalize(&[0.0, 0.0, 0.0]), Err(VectorError::ZeroVector));
    assert_eq!(normalize(&[]), Err(VectorError::ZeroVector));
}

#[test]
fn normalized_vectors_have_unit_magnitude() {
    for len in [1usize, 2, 3, 7, 8, 9, 16, 17, 64, 127, 128, 129, 1536] {
        for seed in [1usize, 7, 42] {
            let values = deterministic_vector(seed, len);
            if magnitude(&values) == 0.0 {
                continue;
            }
            let normalized = normalize(&values).expect("normalize should succeed");
            approx_eq_tol(magnitude(&normalized), 1.0, 1e-6);
        }
    }
}

#[test]
fn normalize_preserves_direction() {
    let values = deterministic_vector(5, 33);
    let normalized = normalize(&values).expect("normalize should succeed");
    for i in 0..values.len() {
        for j in 0..values.len() {
            if values[j] == 0.0 || normalized[j] == 0.0 {
                continue;
            }
            let expected = values[i] / values[j];
            let actual = normalized[i] / normalized[j];
            approx_eq_tol(actual, expected, 1e-3 * expected.abs().max(1.0));
        }
    }
}

#[test]
fn dot_product_works() {
    let left = [1.0, 2.0, 3.0];
    let right = [4.0, 5.0, 6.0];
    let score = dot_product(&left, &right).expect("dot product should succeed");
    approx_eq(score, 32.0);
    approx_eq(dot_product_unchecked(&left, &right), score);
}

#[test]
fn dot_product_of_empty_vectors_is_zero() {
    assert_eq!(dot_product(&[], &[]), Ok(0.0));
}

#[test]
fn euclidean_distance_works() {
    let distance = euclidean_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 6.0])
        .expect("euclidean distance should succeed");
    approx_eq(distance, 3.0);
}

#[test]
fn euclidean_identity_and_symmetry() {
    let a = [1.5, -2.0, 4.25];
    let b = [-5.0, 3.0, 0.125];
    let aa = euclidean_distance(&a, &a).expect("must succeed");
    let ab = euclidean_distance(&a, &b).expect("must succeed");
    let ba = euclidean_distance(&b, &a).expect("must succeed");
    approx_eq(aa, 0.0);
    approx_eq(ab, ba);
}

#[test]
fn cosine_similarity_works() {
    approx_eq(
        cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("cosine should succeed"),
        0.0,
    );
    approx_eq(
        cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]).expect("cosine should succeed"),
        1.0,
    );
    approx_eq(
        cosine_similarity(&[1.0, 0.0], &[-3.0, 0.0]).expect("cosine should succeed"),
        -1.0,
    );
}

#[test]
fn cosine_errors_on_zero_vector() {
    let error = cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).expect_err("must fail");
    assert_eq!(error, VectorError::ZeroVector);
    let error = cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]).expect_err("must fail");
    assert_eq!(error, VectorError::ZeroVector);
}

#[test]
fn errors_on_dimension_mismatch() {
    let expected = VectorError::DimensionMismatch { left: 2, right: 1 };
    assert_eq!(dot_product(&[1.0, 2.0], &[1.0]), Err(expected));
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), Err(expected));
    assert_eq!(euclidean_distance(&[1.0, 2.0], &[1.0]), Err(expected));
}

#[test]
fn dot_of_unit_vectors_matches_cosine() {
    for len in [2usize, 3, 8, 9, 31, 128] {
        let left = normalize(&deterministic_vector(3, len)).expect("normalize must succeed");
        let right = normalize(&deterministic_vector(19, len)).expect("normalize must succeed");
        let dot = dot_product(&left, &right).expect("dot must succeed");
        let cosine = cosine_similarity(&left, &right).expect("cosine must succeed");
        approx_eq_tol(dot, cosine, 1e-5);
    }
}

#[test]
fn prepared_dot_matches_dot_product() {
    for len in [1usize, 2, 3, 7, 8, 9, 16, 17, 64, 65, 127, 128, 129] {
        let query = deterministic_vector(17, len);
        let candidate = deterministic_vector(31, len);
        let prepared = PreparedDotQuery::new(&query);
        assert_eq!(prepared.len(), len);
        let prepared_value = prepared.dot_unchecked(&candidate);
        let reference = dot_product(&query, &candidate).expect("dot must succeed");
        approx_eq_tol(prepared_value, reference, 1e-3);
    }
}

#[test]
fn simd_paths_match_scalar_reference_across_varied_dimensions() {
    for len in [1usize, 2, 3, 7, 8, 9, 15, 16, 17, 31, 32, 33, 127, 128, 129] {
        let left = deterministic_vector(11, len);
        let right = deterministic_vector(29, len);

        let dot = dot_product(&left, &right).expect("dot must succeed");
        let dot_reference: f32 = left.iter().zip(&right).map(|(l, r)| l * r).sum();
        approx_eq_tol(dot, dot_reference, 1e-3);

        let l2 = euclidean_distance(&left, &right).expect("l2 must succeed");
        let l2_reference = left
            .iter()
            .zip(&right)
            .map(|(l, r)| {
                let delta = l - r;
                delta * delta
            })
            .sum::<f32>()
            .sqrt();
        approx_eq_tol(l2, l2_reference, 1e-4);

        let cosine = cosine_similarity(&left, &right).expect("cosine must succeed");
        let left_norm: f32 = left.iter().map(|value| value * value).sum::<f32>().sqrt();
        let right_norm: f32 = right.iter().map(|value| value * value).sum::<f32>().sqrt();
        approx_eq_tol(cosine, dot_reference / (left_norm * right_norm), 1e-4);
    }
}

#[test]
fn error_messages_are_descriptive() {
    assert_eq!(
        VectorError::ZeroVector.to_string(),
        "cannot normalize zero vector"
    );
    assert_eq!(
        VectorError::DimensionMismatch { left: 3, right: 2 }.to_string(),
        "vector dimensions do not match: left=3, right=2"
    );
}
