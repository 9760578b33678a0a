use std::collections::BTreeMap;

use crate::models::{GradeSample, StudentDetail};
use crate::risk::{self, Color};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub x: i64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendAnalysis {
    pub series: Vec<SeriesPoint>,
    pub trend: f64,
    pub trend_color: Color,
}

impl TrendAnalysis {
    /// Signed two-decimal label, `+` for zero and above.
    pub fn trend_label(&self) -> String {
        format_trend(self.trend)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeLine {
    pub assessment_number: i64,
    pub score: f64,
    pub danger: bool,
}

pub fn format_trend(trend: f64) -> String {
    if trend >= 0.0 {
        // abs() drops the sign bit of -0.0
        format!("+{:.2}", trend.abs())
    } else {
        format!("{trend:.2}")
    }
}

/// Orders samples by assessment number; a repeated number keeps the last sample seen.
pub fn ordered_samples(samples: &[GradeSample]) -> Vec<GradeSample> {
    let mut by_number: BTreeMap<i64, GradeSample> = BTreeMap::new();
    for sample in samples {
        by_number.insert(sample.assessment_number, *sample);
    }
    by_number.into_values().collect()
}

/// `trend` comes precomputed from the student summary.
pub fn analyze(samples: &[GradeSample], trend: f64) -> TrendAnalysis {
    let series = ordered_samples(samples)
        .into_iter()
        .map(|sample| SeriesPoint {
            x: sample.assessment_number,
            y: sample.score,
        })
        .collect();

    TrendAnalysis {
        series,
        trend,
        trend_color: risk::trend_color(trend),
    }
}

pub fn analyze_detail(detail: &StudentDetail) -> TrendAnalysis {
    analyze(&detail.grades, detail.student.performance_trend)
}

pub fn grade_lines(samples: &[GradeSample]) -> Vec<GradeLine> {
    ordered_samples(samples)
        .into_iter()
        .map(|sample| GradeLine {
            assessment_number: sample.assessment_number,
            score: sample.score,
            danger: risk::is_danger_score(sample.score),
        })
        .collect()
}
