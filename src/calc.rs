use serde::{Deserialize, Serialize};

pub const USUAL_WEIGHT: f64 = 0.4;
pub const EXAM_WEIGHT: f64 = 0.6;

/// Truncate (toward zero) to two decimal places.
///
/// The final score is stored truncated, not rounded: a raw 79.995 becomes
/// 79.99 and stays in the "fair" band, where round-half-up would promote it
/// to 80.00 "good". Scores are non-negative so floor is sufficient.
pub fn trunc2(x: f64) -> f64 {
    (x * 100.0).floor() / 100.0
}

/// Weighted final score: 40% continuous assessment, 60% exam.
pub fn final_score(usual: f64, exam: f64) -> f64 {
    trunc2(usual * USUAL_WEIGHT + exam * EXAM_WEIGHT)
}

/// The five ordered grade bands. Band boundaries are inclusive at the
/// lower edge: 90.0 is already "excellent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeLevel {
    Excellent,
    Good,
    Fair,
    Pass,
    Fail,
}

impl GradeLevel {
    pub fn from_score(final_score: f64) -> Self {
        if final_score >= 90.0 {
            GradeLevel::Excellent
        } else if final_score >= 80.0 {
            GradeLevel::Good
        } else if final_score >= 70.0 {
            GradeLevel::Fair
        } else if final_score >= 60.0 {
            GradeLevel::Pass
        } else {
            GradeLevel::Fail
        }
    }

    /// Stable string form stored in the grades table.
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::Excellent => "excellent",
            GradeLevel::Good => "good",
            GradeLevel::Fair => "fair",
            GradeLevel::Pass => "pass",
            GradeLevel::Fail => "fail",
        }
    }

    /// Sort rank for distribution reports, best band first.
    pub fn rank(&self) -> i64 {
        match self {
            GradeLevel::Excellent => 1,
            GradeLevel::Good => 2,
            GradeLevel::Fair => 3,
            GradeLevel::Pass => 4,
            GradeLevel::Fail => 5,
        }
    }
}

/// Credit-weighted grade point average over (final_score, credits) pairs.
/// Empty input yields 0.0 rather than NaN.
pub fn weighted_average<I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut total_points = 0.0;
    let mut total_credits = 0.0;
    for (score, credits) in pairs {
        total_points += score * credits;
        total_credits += credits;
    }
    if total_credits > 0.0 {
        trunc2(total_points / total_credits)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trunc2_floors_not_rounds() {
        assert_eq!(trunc2(79.995), 79.99);
        assert_eq!(trunc2(88.0), 88.0);
        assert_eq!(trunc2(0.009), 0.0);
    }

    #[test]
    fn band_boundaries_inclusive() {
        assert_eq!(GradeLevel::from_score(90.0), GradeLevel::Excellent);
        assert_eq!(GradeLevel::from_score(89.99), GradeLevel::Good);
        assert_eq!(GradeLevel::from_score(80.0), GradeLevel::Good);
        assert_eq!(GradeLevel::from_score(70.0), GradeLevel::Fair);
        assert_eq!(GradeLevel::from_score(60.0), GradeLevel::Pass);
        assert_eq!(GradeLevel::from_score(59.99), GradeLevel::Fail);
    }

    #[test]
    fn weighted_average_empty_is_zero() {
        assert_eq!(weighted_average(std::iter::empty()), 0.0);
    }
}
