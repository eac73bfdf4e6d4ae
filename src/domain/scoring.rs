//! Letter grades and rounding shared by the scoring models.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::APlus,
            s if s >= 80.0 => Grade::A,
            s if s >= 70.0 => Grade::BPlus,
            s if s >= 60.0 => Grade::B,
            s if s >= 50.0 => Grade::CPlus,
            s if s >= 40.0 => Grade::C,
            s if s >= 30.0 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round half away from zero to `dp` decimal places.
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_boundaries() {
        let cases = [
            (95.0, Grade::APlus),
            (90.0, Grade::APlus),
            (89.99, Grade::A),
            (80.0, Grade::A),
            (70.0, Grade::BPlus),
            (60.0, Grade::B),
            (50.0, Grade::CPlus),
            (40.0, Grade::C),
            (30.0, Grade::D),
            (29.9, Grade::F),
            (0.0, Grade::F),
        ];
        for (score, expected) in cases {
            assert_eq!(Grade::from_score(score), expected, "score {}", score);
        }
    }

    #[test]
    fn grade_serializes_with_plus() {
        assert_eq!(serde_json::to_string(&Grade::BPlus).unwrap(), "\"B+\"");
        assert_eq!(Grade::CPlus.to_string(), "C+");
    }

    #[test]
    fn rounding() {
        assert_eq!(round_dp(12.345_6, 2), 12.35);
        assert_eq!(round_dp(-3.14159, 4), -3.1416);
        assert_eq!(round_dp(7.0, 2), 7.0);
    }
}
