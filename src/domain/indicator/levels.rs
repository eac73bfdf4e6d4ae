//! Scalar price levels: Fibonacci retracements and classic floor pivots.

use serde::Serialize;

pub const FIBONACCI_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciLevel {
    /// Retracement in percent (0, 23.6, ..., 100).
    pub percent: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FibonacciLevels {
    pub high: f64,
    pub low: f64,
    pub levels: Vec<FibonacciLevel>,
}

/// Retracements measured down from `high`; 0 % is the high, 100 % the low.
pub fn fibonacci_retracements(high: f64, low: f64) -> FibonacciLevels {
    let diff = high - low;
    let levels = FIBONACCI_RATIOS
        .iter()
        .map(|&r| FibonacciLevel {
            percent: r * 100.0,
            price: if r == 1.0 { low } else { high - r * diff },
        })
        .collect();
    FibonacciLevels { high, low, levels }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotPoints {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

pub fn pivot_points(high: f64, low: f64, close: f64) -> PivotPoints {
    let pivot = (high + low + close) / 3.0;
    let range = high - low;
    PivotPoints {
        pivot,
        r1: 2.0 * pivot - low,
        r2: pivot + range,
        r3: high + 2.0 * (pivot - low),
        s1: 2.0 * pivot - high,
        s2: pivot - range,
        s3: low - 2.0 * (high - pivot),
    }
}
