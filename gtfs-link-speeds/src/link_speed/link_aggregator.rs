use std::collections::{BTreeMap, HashMap};

use geo::LineString;
use itertools::Itertools;

use crate::link_speed::{
    distance_calculator::LinkDistance, trip_link_record::TripLinkRecord, LinkSpeedError,
};

/// speed statistics of one link in one period.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSummary {
    pub link_id: String,
    pub period: String,
    pub begin_stop_id: String,
    pub end_stop_id: String,
    /// records with a defined speed
    pub included: usize,
    /// records without a defined speed
    pub excluded: usize,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub mean_speed: Option<f64>,
    /// sample standard deviation, `None` for fewer than two speeds
    pub stdev_speed: Option<f64>,
    /// distance of the representative record of this link id
    pub distance: LinkDistance,
    /// projected geometry of the representative record of this link id
    pub geometry: LineString<f64>,
}

/// summarizes records by link id and period, ordered by link id and then
/// period label.
///
/// every period of a link reports the same representative distance and
/// geometry: those of the link's first record by trip id, then by begin
/// stop sequence.
pub fn aggregate(records: &[TripLinkRecord]) -> Result<Vec<LinkSummary>, LinkSpeedError> {
    if records.is_empty() {
        return Err(LinkSpeedError::EmptyInputError(String::from(
            "no trip produced a link record",
        )));
    }
    let ordered = records
        .iter()
        .sorted_by(|a, b| {
            (&a.trip_id, a.link.begin_sequence).cmp(&(&b.trip_id, b.link.begin_sequence))
        })
        .collect_vec();

    let mut representatives: HashMap<&str, &TripLinkRecord> = HashMap::new();
    let mut groups: BTreeMap<(&str, &str), Vec<&TripLinkRecord>> = BTreeMap::new();
    for record in ordered {
        representatives
            .entry(record.link.link_id.as_str())
            .or_insert(record);
        groups
            .entry((record.link.link_id.as_str(), record.period.as_str()))
            .or_default()
            .push(record);
    }

    let summaries = groups
        .into_iter()
        .map(|((link_id, period), group)| {
            let representative = representatives.get(link_id).copied().unwrap_or(group[0]);
            let speeds = group.iter().filter_map(|r| r.speed).collect_vec();
            let (min_speed, max_speed) = match speeds.iter().copied().minmax_by(f64::total_cmp) {
                itertools::MinMaxResult::NoElements => (None, None),
                itertools::MinMaxResult::OneElement(s) => (Some(s), Some(s)),
                itertools::MinMaxResult::MinMax(min, max) => (Some(min), Some(max)),
            };
            let mean_speed = mean(&speeds);
            LinkSummary {
                link_id: link_id.to_string(),
                period: period.to_string(),
                begin_stop_id: representative.link.begin_stop_id.clone(),
                end_stop_id: representative.link.end_stop_id.clone(),
                included: speeds.len(),
                excluded: group.len() - speeds.len(),
                min_speed,
                max_speed,
                mean_speed,
                stdev_speed: mean_speed.and_then(|m| sample_stdev(&speeds, m)),
                distance: representative.distance,
                geometry: representative.link.geometry.clone(),
            }
        })
        .collect_vec();
    log::info!(
        "aggregated {} records into {} link summaries",
        records.len(),
        summaries.len()
    );
    Ok(summaries)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn sample_stdev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((squares / (values.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod test {
    use super::aggregate;
    use crate::link_speed::{
        distance_calculator::{DistanceSource, LinkDistance},
        link_splitter::Link,
        shape_resolver::GeometryProvenance,
        trip_link_record::{RecordStatus, TripAttributes, TripLinkRecord},
        ServiceTime,
    };
    use geo::{line_string, Coord};

    fn record(trip_id: &str, link_id: &str, period: &str, speed: Option<f64>, distance: f64) -> TripLinkRecord {
        let (begin, end) = link_id.split_once('_').unwrap_or((link_id, link_id));
        let time = ServiceTime::parse("08:00:00").expect("valid time");
        TripLinkRecord {
            trip_id: trip_id.to_string(),
            route_id: String::from("r1"),
            service_id: String::from("weekday"),
            direction_id: None,
            shape_key: String::from("s1"),
            provenance: GeometryProvenance::FromShape,
            attributes: TripAttributes::default(),
            link: Link {
                link_id: link_id.to_string(),
                begin_stop_id: begin.to_string(),
                end_stop_id: end.to_string(),
                begin_sequence: 1,
                end_sequence: 2,
                begin_position: 0.0,
                end_position: distance,
                begin_coord: Coord { x: 0.0, y: 0.0 },
                end_coord: Coord { x: distance, y: 0.0 },
                geometry: line_string![(x: 0.0, y: 0.0), (x: distance, y: 0.0)],
                end_clamped: false,
            },
            distance: LinkDistance {
                value: distance,
                source: DistanceSource::Shape,
                zero_length: distance == 0.0,
            },
            begin_departure: time,
            end_arrival: time,
            travel_time_hours: 0.1,
            speed,
            period: period.to_string(),
            status: match speed {
                Some(_) => RecordStatus::Valid,
                None => RecordStatus::UndefinedSpeed,
            },
            zero_length: false,
        }
    }

    #[test]
    fn test_statistics() {
        let records = vec![
            record("t1", "A_B", "am", Some(10.0), 1.0),
            record("t2", "A_B", "am", Some(20.0), 1.0),
            record("t3", "A_B", "am", Some(30.0), 1.0),
        ];
        let summaries = aggregate(&records).expect("should aggregate");
        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.link_id, "A_B");
        assert_eq!(summary.included, 3);
        assert_eq!(summary.min_speed, Some(10.0));
        assert_eq!(summary.max_speed, Some(30.0));
        assert!((summary.mean_speed.unwrap_or_default() - 20.0).abs() < 1e-9);
        assert!((summary.stdev_speed.unwrap_or_default() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_undefined_speeds_are_excluded() {
        let records = vec![
            record("t1", "A_B", "am", Some(12.0), 1.0),
            record("t2", "A_B", "am", None, 1.0),
            record("t3", "B_C", "am", None, 1.0),
        ];
        let summaries = aggregate(&records).expect("should aggregate");
        let ab = &summaries[0];
        assert_eq!((ab.included, ab.excluded), (1, 1));
        assert_eq!(ab.mean_speed, Some(12.0));
        assert_eq!(ab.stdev_speed, None);
        let bc = &summaries[1];
        assert_eq!((bc.included, bc.excluded), (0, 1));
        assert_eq!(bc.mean_speed, None);
        assert_eq!(bc.min_speed, None);
    }

    #[test]
    fn test_grouping_order_and_representative() {
        let records = vec![
            record("t2", "B_A", "pm", Some(5.0), 7.0),
            record("t9", "A_B", "pm", Some(5.0), 9.0),
            record("t1", "A_B", "am", Some(5.0), 4.0),
        ];
        let summaries = aggregate(&records).expect("should aggregate");
        let keys: Vec<(&str, &str)> = summaries
            .iter()
            .map(|s| (s.link_id.as_str(), s.period.as_str()))
            .collect();
        assert_eq!(keys, vec![("A_B", "am"), ("A_B", "pm"), ("B_A", "pm")]);
        // t1 is the first A_B record by trip id, so it represents both periods
        assert_eq!(summaries[0].distance.value, 4.0);
        assert_eq!(summaries[1].distance.value, 4.0);
        assert_eq!(summaries[2].distance.value, 7.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_err());
    }
}
