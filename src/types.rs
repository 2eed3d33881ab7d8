use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the raw store, exactly as the feed delivered it.
///
/// Only `depth_km` and `tsunami_flag` are typed; everything else is untrusted
/// text that has not been parsed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub event_id: String,
    pub time: String,
    pub latitude: String,
    pub longitude: String,
    pub magnitude_raw: String,
    pub depth_km: f64,
    pub tsunami_flag: i64,
}

/// A raw event that survived cleaning. Only lives inside the transform.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanEvent {
    pub event_id: String,
    pub event_time: Option<NaiveDateTime>,
    pub latitude: f64,
    pub longitude: Option<f64>,
    pub magnitude: f64,
    pub depth_km: f64,
    pub tsunami_alert: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low_Risk")]
    Low,
    #[serde(rename = "Medium_Risk")]
    Medium,
    #[serde(rename = "High_Risk")]
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low_Risk",
            RiskLevel::Medium => "Medium_Risk",
            RiskLevel::High => "High_Risk",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low_Risk" => Some(RiskLevel::Low),
            "Medium_Risk" => Some(RiskLevel::Medium),
            "High_Risk" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LocationZone {
    #[serde(rename = "Zone_Pacific_North")]
    PacificNorth,
    #[serde(rename = "Zone_Pacific_South")]
    PacificSouth,
    #[serde(rename = "Zone_Continental")]
    Continental,
}

impl LocationZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationZone::PacificNorth => "Zone_Pacific_North",
            LocationZone::PacificSouth => "Zone_Pacific_South",
            LocationZone::Continental => "Zone_Continental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Zone_Pacific_North" => Some(LocationZone::PacificNorth),
            "Zone_Pacific_South" => Some(LocationZone::PacificSouth),
            "Zone_Continental" => Some(LocationZone::Continental),
            _ => None,
        }
    }
}

impl fmt::Display for LocationZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clean event plus its derived categories.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub event: CleanEvent,
    pub risk_level: RiskLevel,
    pub location_zone: LocationZone,
}

/// One row of the analytics table.
///
/// `event_day` is `None` for the group of events whose timestamp could not be
/// parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub event_day: Option<NaiveDate>,
    pub location_zone: LocationZone,
    pub risk_level: RiskLevel,
    pub total_events: u64,
    pub avg_magnitude: f64,
    pub tsunami_alerts_count: u64,
}

impl AggregateRow {
    /// Checks the per-row invariants the analytics table guarantees.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        if self.total_events == 0 {
            return Err(format!(
                "group ({:?}, {}, {}) has no events",
                self.event_day, self.location_zone, self.risk_level
            ));
        }
        if self.tsunami_alerts_count > self.total_events {
            return Err(format!(
                "group ({:?}, {}, {}) counts {} tsunami alerts for {} events",
                self.event_day,
                self.location_zone,
                self.risk_level,
                self.tsunami_alerts_count,
                self.total_events
            ));
        }
        if !self.avg_magnitude.is_finite() {
            return Err(format!(
                "group ({:?}, {}, {}) has a non-finite average magnitude",
                self.event_day, self.location_zone, self.risk_level
            ));
        }
        Ok(())
    }
}
