use std::fmt;

use serde::Serialize;

use crate::analytics::{AnalyticsTable, NumberAnalytics, NumberStatus};
use crate::trend::PositionRootProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThermalStatus {
    Positive,
    Negative,
    Warning,
    Neutral,
    Unknown,
}

impl fmt::Display for ThermalStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ThermalStatus::Positive => write!(f, "(+)"),
            ThermalStatus::Negative => write!(f, "(-)"),
            ThermalStatus::Warning => write!(f, "(!)"),
            ThermalStatus::Neutral => write!(f, "(/)"),
            ThermalStatus::Unknown => write!(f, "(?)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThermalReading {
    pub status: ThermalStatus,
    pub score: f64,
}

impl ThermalReading {
    fn unknown() -> Self {
        Self { status: ThermalStatus::Unknown, score: 0.0 }
    }
}

/// Classement d'un numéro à une position, d'après ses analytics et le profil de la position.
pub struct ThermalClassifier<'a> {
    analytics: &'a AnalyticsTable,
}

impl<'a> ThermalClassifier<'a> {
    pub fn new(analytics: &'a AnalyticsTable) -> Self {
        Self { analytics }
    }

    pub fn classify(&self, number: u8, profile: &PositionRootProfile) -> ThermalReading {
        match self.analytics.get(number) {
            Some(a) => thermal_reading(a, profile),
            None => ThermalReading::unknown(),
        }
    }
}

/// Score additif d'un numéro face au profil de sa position, puis statut.
pub fn thermal_reading(a: &NumberAnalytics, profile: &PositionRootProfile) -> ThermalReading {
    let mut score = 0.0;
    if a.root == profile.dominant_root {
        score += 40.0;
        if profile.cyclic_attractor.is_some_and(|lag| (lag % 9 + 1) as u8 == a.root) {
            score += 10.0;
        }
    }
    if a.current_delay > 1 && a.current_delay < 10 {
        score += 25.0;
    }
    if a.exit_probability > 35.0 {
        score += 15.0;
    }
    if a.momentum > a.mean_delay * 0.8 {
        score += 10.0;
    }
    if a.status == NumberStatus::Hot {
        score += 10.0;
    }
    score += a.mc_confidence * 10.0;

    let status = if score >= 70.0 {
        ThermalStatus::Positive
    } else if score <= 20.0 || a.current_delay > 25 {
        ThermalStatus::Negative
    } else if a.status == NumberStatus::Critical {
        ThermalStatus::Warning
    } else {
        ThermalStatus::Neutral
    };

    ThermalReading { status, score }
}
