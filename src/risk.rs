use crate::models::StatusCategory;

/// Scores below this mark are flagged in the grade history table.
pub const DANGER_SCORE: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Amber,
    Green,
}

impl Color {
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Amber => "amber",
            Color::Green => "green",
        }
    }
}

/// Status text table. Out-of-range scores are classified by the same bands.
pub fn classify(score: f64) -> StatusCategory {
    if score > 70.0 {
        StatusCategory::AtRisk
    } else if score > 40.0 {
        StatusCategory::NewlyAtRisk
    } else if score > 20.0 {
        StatusCategory::Improving
    } else {
        StatusCategory::OnTrack
    }
}

/// Headline color table for the detail view. Independent of [`classify`].
pub fn headline_color(risk_score: f64) -> Color {
    if risk_score > 70.0 {
        Color::Red
    } else if risk_score > 40.0 {
        Color::Amber
    } else {
        Color::Green
    }
}

pub fn trend_color(trend: f64) -> Color {
    if trend >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

pub fn is_danger_score(score: f64) -> bool {
    score < DANGER_SCORE
}
