use crate::constants::{
    HIGH_RISK_MIN_MAGNITUDE, MEDIUM_RISK_MIN_MAGNITUDE, PACIFIC_LATITUDE_SPLIT,
    PACIFIC_MAX_LONGITUDE,
};
use crate::types::{ClassifiedEvent, CleanEvent, LocationZone, RiskLevel};

/// Inclusive descending thresholds, first match wins.
pub fn risk_level(magnitude: f64) -> RiskLevel {
    if magnitude >= HIGH_RISK_MIN_MAGNITUDE {
        RiskLevel::High
    } else if magnitude >= MEDIUM_RISK_MIN_MAGNITUDE {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Zone rules are evaluated in order. A latitude of exactly 30 matches neither
/// Pacific rule and an absent longitude never counts as west of -100, so both
/// fall through to the continental zone.
pub fn location_zone(latitude: f64, longitude: Option<f64>) -> LocationZone {
    let pacific = longitude.is_some_and(|lon| lon < PACIFIC_MAX_LONGITUDE);

    if latitude > PACIFIC_LATITUDE_SPLIT && pacific {
        LocationZone::PacificNorth
    } else if latitude < PACIFIC_LATITUDE_SPLIT && pacific {
        LocationZone::PacificSouth
    } else {
        LocationZone::Continental
    }
}

pub fn classify(event: CleanEvent) -> ClassifiedEvent {
    let risk_level = risk_level(event.magnitude);
    let location_zone = location_zone(event.latitude, event.longitude);
    ClassifiedEvent {
        event,
        risk_level,
        location_zone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_thresholds_are_inclusive() {
        assert_eq!(risk_level(6.0), RiskLevel::High);
        assert_eq!(risk_level(8.1), RiskLevel::High);
        assert_eq!(risk_level(5.999), RiskLevel::Medium);
        assert_eq!(risk_level(4.0), RiskLevel::Medium);
        assert_eq!(risk_level(3.999), RiskLevel::Low);
        assert_eq!(risk_level(-1.0), RiskLevel::Low);
    }

    #[test]
    fn zone_boundaries_follow_rule_order() {
        assert_eq!(location_zone(30.0, Some(-150.0)), LocationZone::Continental);
        assert_eq!(location_zone(31.0, Some(-150.0)), LocationZone::PacificNorth);
        assert_eq!(location_zone(29.0, Some(-150.0)), LocationZone::PacificSouth);
        assert_eq!(location_zone(10.0, Some(-50.0)), LocationZone::Continental);
        assert_eq!(location_zone(45.0, Some(-100.0)), LocationZone::Continental);
    }

    #[test]
    fn missing_longitude_is_continental() {
        assert_eq!(location_zone(45.0, None), LocationZone::Continental);
        assert_eq!(location_zone(-10.0, None), LocationZone::Continental);
    }

    #[test]
    fn classify_keeps_the_clean_event() {
        let event = CleanEvent {
            event_id: "E1".to_string(),
            event_time: None,
            latitude: 10.0,
            longitude: Some(-110.0),
            magnitude: 6.5,
            depth_km: 33.0,
            tsunami_alert: true,
        };
        let classified = classify(event.clone());
        assert_eq!(classified.risk_level, RiskLevel::High);
        assert_eq!(classified.location_zone, LocationZone::PacificSouth);
        assert_eq!(classified.event, event);
    }
}
