use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::types::{AggregateRow, ClassifiedEvent, LocationZone, RiskLevel};

/// Grouping key. `None` collects events without a usable timestamp.
pub type GroupKey = (Option<NaiveDate>, LocationZone, RiskLevel);

#[derive(Debug, Default)]
struct GroupAcc {
    count: u64,
    magnitude_sum: f64,
    tsunami_alerts: u64,
}

/// Rolls classified events into one row per (day, zone, risk) present in the
/// input.
///
/// Rows come out in key order (undated group first), so the same input always
/// produces the same table.
pub fn aggregate<'a, I>(events: I) -> Vec<AggregateRow>
where
    I: IntoIterator<Item = &'a ClassifiedEvent>,
{
    let mut groups: BTreeMap<GroupKey, GroupAcc> = BTreeMap::new();

    for classified in events {
        let day = classified.event.event_time.map(|ts| ts.date());
        let acc = groups
            .entry((day, classified.location_zone, classified.risk_level))
            .or_default();
        acc.count += 1;
        acc.magnitude_sum += classified.event.magnitude;
        if classified.event.tsunami_alert {
            acc.tsunami_alerts += 1;
        }
    }

    groups
        .into_iter()
        .map(|((event_day, location_zone, risk_level), acc)| AggregateRow {
            event_day,
            location_zone,
            risk_level,
            total_events: acc.count,
            avg_magnitude: acc.magnitude_sum / acc.count as f64,
            tsunami_alerts_count: acc.tsunami_alerts,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CleanEvent;
    use chrono::NaiveDateTime;

    fn event(
        time: Option<&str>,
        zone: LocationZone,
        risk: RiskLevel,
        mag: f64,
        tsunami: bool,
    ) -> ClassifiedEvent {
        ClassifiedEvent {
            event: CleanEvent {
                event_id: "E".to_string(),
                event_time: time.map(|t| {
                    NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S").unwrap()
                }),
                latitude: 0.0,
                longitude: None,
                magnitude: mag,
                depth_km: 10.0,
                tsunami_alert: tsunami,
            },
            risk_level: risk,
            location_zone: zone,
        }
    }

    #[test]
    fn groups_by_day_zone_and_risk() {
        let (land, north) = (LocationZone::Continental, LocationZone::PacificNorth);
        let events = vec![
            event(Some("2025-11-01 01:00:00"), land, RiskLevel::Low, 2.0, false),
            event(Some("2025-11-01 23:59:59"), land, RiskLevel::Low, 3.0, true),
            event(Some("2025-11-02 00:00:00"), land, RiskLevel::Low, 3.5, false),
            event(Some("2025-11-01 12:00:00"), north, RiskLevel::High, 6.4, true),
        ];

        let rows = aggregate(&events);
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.event_day, NaiveDate::from_ymd_opt(2025, 11, 1));
        assert_eq!(first.location_zone, LocationZone::PacificNorth);
        assert_eq!(first.total_events, 1);

        let same_day = &rows[1];
        assert_eq!(same_day.location_zone, LocationZone::Continental);
        assert_eq!(same_day.total_events, 2);
        assert_eq!(same_day.avg_magnitude, 2.5);
        assert_eq!(same_day.tsunami_alerts_count, 1);

        assert_eq!(rows[2].event_day, NaiveDate::from_ymd_opt(2025, 11, 2));

        let total: u64 = rows.iter().map(|r| r.total_events).sum();
        assert_eq!(total, events.len() as u64);
        assert!(rows.iter().all(|r| r.tsunami_alerts_count <= r.total_events));
    }

    #[test]
    fn undated_events_form_their_own_group() {
        let (land, medium) = (LocationZone::Continental, RiskLevel::Medium);
        let events = vec![
            event(None, land, medium, 4.0, true),
            event(None, land, medium, 5.0, true),
            event(Some("2025-11-01 00:00:00"), land, medium, 4.5, false),
        ];

        let rows = aggregate(&events);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].event_day, None);
        assert_eq!(rows[0].total_events, 2);
        assert_eq!(rows[0].avg_magnitude, 4.5);
        assert_eq!(rows[0].tsunami_alerts_count, 2);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        let rows = aggregate(&Vec::<ClassifiedEvent>::new());
        assert!(rows.is_empty());
    }
}
