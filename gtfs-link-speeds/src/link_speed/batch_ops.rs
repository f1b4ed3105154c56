use std::{
    fs::File,
    path::Path,
    sync::{Arc, Mutex},
};

use csv::QuoteStyle;
use flate2::{write::GzEncoder, Compression};
use itertools::Itertools;
use kdam::{Bar, BarBuilder, BarExt};
use rayon::prelude::*;
use serde::Serialize;

use crate::link_speed::{
    config::LinkSpeedConfig,
    dataset::{DatasetProvider, GtfsTables, TripRecord},
    geometry::Projection,
    link_aggregator::{self, LinkSummary},
    network_features, operating_data,
    output_row::{DetailRow, SummaryRow},
    trip_link_record::TripLinkRecord,
    trip_ops::{LinkSpeedEngine, TripOutcome},
    ExclusionKind, ExclusionReport, LinkSpeedError,
};

pub const DETAIL_FILENAME: &str = "link-speeds-detail.csv.gz";
pub const SUMMARY_FILENAME: &str = "link-speeds-summary.csv.gz";
pub const REPORT_FILENAME: &str = "link-speeds-exclusions.json";
pub const SHAPES_FILENAME: &str = "route-shapes.csv.gz";
pub const STOPS_FILENAME: &str = "stops.csv.gz";
pub const OPERATING_DATA_FILENAME: &str = "operating-data.csv.gz";

/// everything produced by one run of the engine over a dataset.
#[derive(Debug)]
pub struct LinkSpeedOutput {
    /// detail records ordered by trip id, then begin stop sequence
    pub records: Vec<TripLinkRecord>,
    pub summaries: Vec<LinkSummary>,
    pub report: ExclusionReport,
    /// projection the geometries were measured in
    pub projection: Projection,
}

/// runs every trip of the dataset through the engine in parallel, then
/// aggregates the merged records.
///
/// errors isolated to a trip are counted in the report and do not stop the
/// batch. an empty record set fails the batch.
pub fn run_link_speeds(
    dataset: &dyn DatasetProvider,
    config: &LinkSpeedConfig,
) -> Result<LinkSpeedOutput, LinkSpeedError> {
    let engine = LinkSpeedEngine::new(dataset, config)?;
    let trips = dataset
        .trips()
        .sorted_by(|a, b| a.trip_id.cmp(&b.trip_id))
        .collect_vec();
    log::info!("computing link speeds for {} trips", trips.len());

    let bar: Arc<Mutex<Bar>> = Arc::new(Mutex::new(
        BarBuilder::default()
            .desc("link speeds")
            .total(trips.len())
            .build()
            .map_err(LinkSpeedError::OtherError)?,
    ));
    let results: Vec<(&TripRecord, Result<TripOutcome, LinkSpeedError>)> = trips
        .into_par_iter()
        .map(|trip| {
            let result = engine.process_trip(trip);
            if let Ok(mut bar) = bar.clone().lock() {
                let _ = bar.update(1);
            }
            (trip, result)
        })
        .collect();
    eprintln!();

    let mut report = ExclusionReport {
        trips_total: results.len(),
        ..Default::default()
    };
    let mut records = vec![];
    for (trip, result) in results {
        match result {
            Ok(outcome) => {
                for error in outcome.errors {
                    report.add_error(error)?;
                }
                if outcome.records.is_empty() {
                    log::warn!("trip {} produced no links", trip.trip_id);
                    report.add_excluded_trip(None)?;
                } else {
                    report.trips_with_links += 1;
                }
                for record in outcome.records.iter() {
                    report.add_record(record);
                }
                records.extend(outcome.records);
            }
            Err(error) => {
                match error.exclusion_kind() {
                    Some(ExclusionKind::DegenerateSplit) => {
                        log::error!("trip {} excluded: {error}", trip.trip_id)
                    }
                    _ => log::warn!("trip {} excluded: {error}", trip.trip_id),
                }
                report.add_excluded_trip(Some(error))?;
            }
        }
    }
    log::info!("{report}");

    let summaries = link_aggregator::aggregate(&records)?;
    Ok(LinkSpeedOutput {
        records,
        summaries,
        report,
        projection: *engine.projection(),
    })
}

/// reads a GTFS archive or directory, computes link speeds and writes the
/// detail table, the summary table and the exclusion report to
/// `output_directory`.
pub fn process_bundle(
    input: &str,
    output_directory: &Path,
    config: &LinkSpeedConfig,
    overwrite: bool,
) -> Result<ExclusionReport, LinkSpeedError> {
    let tables = GtfsTables::try_from_path(input)?;
    let output = run_link_speeds(&tables, config)?;
    let projection = output.projection;
    let unit = config.distance_unit;

    let details = output
        .records
        .iter()
        .map(|r| DetailRow::new(r, &projection, unit));
    write_rows(output_directory, DETAIL_FILENAME, details, overwrite)?;
    let summaries = output
        .summaries
        .iter()
        .map(|s| SummaryRow::new(s, &projection, unit));
    write_rows(output_directory, SUMMARY_FILENAME, summaries, overwrite)?;

    let report_path = output_directory.join(REPORT_FILENAME);
    if report_path.exists() && !overwrite {
        return Err(LinkSpeedError::OutputError(format!(
            "{} exists and overwrite is not set",
            report_path.display()
        )));
    }
    let report_json = serde_json::to_string_pretty(&output.report).map_err(|e| {
        LinkSpeedError::OutputError(format!("failure serializing exclusion report: {e}"))
    })?;
    std::fs::write(&report_path, report_json).map_err(|e| {
        LinkSpeedError::OutputError(format!("failure writing {}: {e}", report_path.display()))
    })?;
    log::info!(
        "wrote {} detail rows and {} summary rows to {}",
        output.records.len(),
        output.summaries.len(),
        output_directory.display()
    );
    Ok(output.report)
}

/// writes the resolved path of every shape, grouped by route, service and
/// direction.
pub fn process_shapes(
    input: &str,
    output_directory: &Path,
    config: &LinkSpeedConfig,
    overwrite: bool,
) -> Result<usize, LinkSpeedError> {
    let tables = GtfsTables::try_from_path(input)?;
    let engine = LinkSpeedEngine::new(&tables, config)?;
    let rows = network_features::shape_lines(&engine, &tables);
    let n_rows = rows.len();
    write_rows(output_directory, SHAPES_FILENAME, rows.into_iter(), overwrite)?;
    log::info!("wrote {n_rows} shape rows to {}", output_directory.display());
    Ok(n_rows)
}

/// writes each stop with the trips and routes serving it per service id.
pub fn process_stops(
    input: &str,
    output_directory: &Path,
    overwrite: bool,
) -> Result<usize, LinkSpeedError> {
    let tables = GtfsTables::try_from_path(input)?;
    let rows = network_features::stop_points(&tables);
    let n_rows = rows.len();
    write_rows(output_directory, STOPS_FILENAME, rows.into_iter(), overwrite)?;
    log::info!("wrote {n_rows} stop rows to {}", output_directory.display());
    Ok(n_rows)
}

/// writes trip counts, headways and vehicle service hours per route
/// pattern and period.
pub fn process_operating_data(
    input: &str,
    output_directory: &Path,
    config: &LinkSpeedConfig,
    overwrite: bool,
) -> Result<usize, LinkSpeedError> {
    let classifier = config.validate()?;
    let tables = GtfsTables::try_from_path(input)?;
    let rows = operating_data::operating_data(&tables, &classifier);
    let n_rows = rows.len();
    write_rows(output_directory, OPERATING_DATA_FILENAME, rows.into_iter(), overwrite)?;
    log::info!("wrote {n_rows} operating data rows to {}", output_directory.display());
    Ok(n_rows)
}

fn write_rows<T: Serialize>(
    directory: &Path,
    filename: &str,
    rows: impl Iterator<Item = T>,
    overwrite: bool,
) -> Result<(), LinkSpeedError> {
    let mut writer = create_writer(directory, filename, true, QuoteStyle::Necessary, overwrite)?;
    for row in rows {
        writer.serialize(row).map_err(|e| {
            LinkSpeedError::OutputError(format!("Failed to write to file {filename}: {e}"))
        })?;
    }
    writer
        .flush()
        .map_err(|e| LinkSpeedError::OutputError(format!("Failed to flush {filename}: {e}")))
}

/// helper function to build a filewriter for writing .csv.gz files while
/// respecting the user's overwrite preferences.
fn create_writer(
    directory: &Path,
    filename: &str,
    has_headers: bool,
    quote_style: QuoteStyle,
    overwrite: bool,
) -> Result<csv::Writer<GzEncoder<File>>, LinkSpeedError> {
    let filepath = directory.join(filename);
    if filepath.exists() && !overwrite {
        return Err(LinkSpeedError::OutputError(format!(
            "{} exists and overwrite is not set",
            filepath.display()
        )));
    }
    let file = File::create(&filepath).map_err(|e| {
        LinkSpeedError::OutputError(format!("failure creating {}: {e}", filepath.display()))
    })?;
    let buffer = GzEncoder::new(file, Compression::default());
    let writer = csv::WriterBuilder::new()
        .has_headers(has_headers)
        .quote_style(quote_style)
        .from_writer(buffer);
    Ok(writer)
}

#[cfg(test)]
mod test {
    use super::{
        process_bundle, process_operating_data, run_link_speeds, DETAIL_FILENAME,
        OPERATING_DATA_FILENAME, REPORT_FILENAME, SUMMARY_FILENAME,
    };
    use crate::link_speed::{
        config::{DistanceUnit, LinkSpeedConfig},
        dataset::{GtfsTables, ShapePoint, StopRecord, StopVisit, TripRecord},
        geometry::ProjectionConfig,
        ExclusionKind,
    };
    use std::path::PathBuf;

    fn planar_config() -> LinkSpeedConfig {
        LinkSpeedConfig {
            snap_tolerance: 1.0,
            distance_unit: DistanceUnit::Meters,
            projection: ProjectionConfig::Planar {
                native_unit: DistanceUnit::Meters,
            },
            ..Default::default()
        }
    }

    fn corridor() -> GtfsTables {
        let mut visits = vec![];
        for (trip, minutes) in [("t1", 1), ("t2", 2), ("t3", 0)] {
            visits.push(StopVisit::new(trip, "A", 1, "07:00:00", "07:00:00"));
            visits.push(StopVisit::new(trip, "B", 2, &format!("07:0{minutes}:00"), "07:05:00"));
        }
        // both stops share a location, so no path can be built
        visits.push(StopVisit::new("t4", "C", 1, "07:00:00", "07:00:00"));
        visits.push(StopVisit::new("t4", "C", 2, "07:05:00", "07:05:00"));
        // a shaped trip with a single visit runs but has nothing to link
        visits.push(StopVisit::new("t5", "A", 1, "07:00:00", "07:00:00"));
        GtfsTables::new(
            vec![
                StopRecord::new("A", 0.0, 0.0),
                StopRecord::new("B", 0.0, 1000.0),
                StopRecord::new("C", 5.0, 5.0),
            ],
            vec![
                TripRecord::new("t1", "r1", Some("s1")),
                TripRecord::new("t2", "r1", Some("s1")),
                TripRecord::new("t3", "r1", Some("s1")),
                TripRecord::new("t4", "r2", None),
                TripRecord::new("t5", "r1", Some("s1")),
            ],
            visits,
        )
        .with_shapes(vec![
            ShapePoint {
                shape_id: String::from("s1"),
                sequence: 1,
                latitude: 0.0,
                longitude: 0.0,
            },
            ShapePoint {
                shape_id: String::from("s1"),
                sequence: 2,
                latitude: 1000.0,
                longitude: 0.0,
            },
        ])
    }

    #[test]
    fn test_batch_isolates_trip_failures() {
        let output = run_link_speeds(&corridor(), &planar_config()).expect("batch should run");
        assert_eq!(output.report.trips_total, 5);
        assert_eq!(output.report.trips_with_links, 3);
        assert_eq!(output.report.trips_excluded, 2);
        assert_eq!(output.report.count(ExclusionKind::MissingGeometry), 1);
        assert_eq!(output.report.count(ExclusionKind::NoLinks), 1);
        assert_eq!(output.report.count(ExclusionKind::UndefinedSpeed), 1);
        assert_eq!(output.records.len(), 3);
        let trip_ids: Vec<&str> = output.records.iter().map(|r| r.trip_id.as_str()).collect();
        assert_eq!(trip_ids, vec!["t1", "t2", "t3"]);

        assert_eq!(output.summaries.len(), 1);
        let summary = &output.summaries[0];
        assert_eq!(summary.link_id, "A_B");
        assert_eq!(summary.period, "am_peak");
        assert_eq!((summary.included, summary.excluded), (2, 1));
        // 1000 m in one and two minutes
        assert!((summary.max_speed.unwrap_or_default() - 60_000.0).abs() < 1e-6);
        assert!((summary.min_speed.unwrap_or_default() - 30_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_batch_fails() {
        let tables = GtfsTables::new(vec![], vec![], vec![]);
        assert!(run_link_speeds(&tables, &planar_config()).is_err());
    }

    #[test]
    fn test_process_mini_gtfs() {
        let bundle = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test")
            .join("mini-gtfs");
        let output_directory = std::env::temp_dir().join(format!(
            "gtfs-link-speeds-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&output_directory).expect("temp dir");
        let input = bundle.to_string_lossy().to_string();
        let report = process_bundle(&input, &output_directory, &LinkSpeedConfig::default(), true)
            .expect("mini bundle should process");
        assert_eq!(report.trips_total, 4);
        // T4 has no path, T2 loses both of its links to the far stop
        assert_eq!(report.trips_with_links, 2);
        assert_eq!(report.trips_excluded, 2);
        assert_eq!(report.count(ExclusionKind::MissingGeometry), 1);
        assert_eq!(report.count(ExclusionKind::SnapFailure), 1);
        assert_eq!(report.count(ExclusionKind::NoLinks), 1);
        for filename in [DETAIL_FILENAME, SUMMARY_FILENAME, REPORT_FILENAME] {
            assert!(output_directory.join(filename).exists());
        }
        // a second run without overwrite leaves the files alone
        assert!(
            process_bundle(&input, &output_directory, &LinkSpeedConfig::default(), false).is_err()
        );
        let _ = std::fs::remove_dir_all(&output_directory);
    }

    #[test]
    fn test_operating_data_mini_gtfs() {
        let bundle = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test")
            .join("mini-gtfs");
        let output_directory = std::env::temp_dir().join(format!(
            "gtfs-link-speeds-opdata-test-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&output_directory).expect("temp dir");
        let input = bundle.to_string_lossy().to_string();
        // T1 at 07:00 and T2 at 08:00 in am_peak, T3 at 00:50 on the next
        // day and T4 at 09:00 each in their own period
        let n_rows = process_operating_data(&input, &output_directory, &LinkSpeedConfig::default(), true)
            .expect("mini bundle should process");
        assert_eq!(n_rows, 3);
        assert!(output_directory.join(OPERATING_DATA_FILENAME).exists());
        let _ = std::fs::remove_dir_all(&output_directory);
    }
}
