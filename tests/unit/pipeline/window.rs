//! Unit tests for windowing

use ndarray::Array2;
use pricecast::pipeline::window::{
    flatten_f32, last_window, window_ending_at, MIN_HISTORY, WINDOW,
};

#[test]
fn test_window_constants() {
    assert_eq!(WINDOW, 20);
    assert_eq!(MIN_HISTORY, 66);
}

#[test]
fn test_last_window_takes_final_rows() {
    let matrix = Array2::from_shape_fn((25, 15), |(i, _)| i as f64);
    let window = last_window(&matrix).unwrap();
    assert_eq!(window.dim(), (20, 15));
    assert_eq!(window[[0, 0]], 5.0);
    assert_eq!(window[[19, 0]], 24.0);
}

#[test]
fn test_window_ending_at_bounds() {
    let matrix = Array2::from_shape_fn((25, 15), |(i, _)| i as f64);
    assert!(window_ending_at(&matrix, 19).is_none());
    assert!(window_ending_at(&matrix, 26).is_none());
    let window = window_ending_at(&matrix, 20).unwrap();
    assert_eq!(window[[19, 0]], 19.0);
}

#[test]
fn test_short_matrix_has_no_window() {
    let matrix = Array2::<f64>::zeros((19, 15));
    assert!(last_window(&matrix).is_none());
}

#[test]
fn test_flatten_is_row_major() {
    let matrix = Array2::from_shape_fn((20, 15), |(i, j)| (i * 15 + j) as f64);
    let flat = flatten_f32(last_window(&matrix).unwrap());
    assert_eq!(flat.len(), 300);
    assert_eq!(flat[16], 16.0);
}
