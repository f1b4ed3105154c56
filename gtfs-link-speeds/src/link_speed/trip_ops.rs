use crate::link_speed::{
    config::{LinkSpeedConfig, PeriodClassifier},
    dataset::{DatasetProvider, TripRecord},
    distance_calculator::DistanceCalculator,
    geometry::Projection,
    link_splitter,
    shape_resolver::{LocatedVisit, ShapeResolver, TripGeometry},
    speed_assembler::SpeedAssembler,
    stop_snapper::StopSnapper,
    trip_link_record::{TripAttributes, TripLinkRecord},
    LinkSpeedError, MissingStopLocationPolicy,
};

/// link records of one trip, plus the stop and link level errors that did
/// not stop the trip from producing records.
#[derive(Debug, Default)]
pub struct TripOutcome {
    pub records: Vec<TripLinkRecord>,
    pub errors: Vec<LinkSpeedError>,
}

/// the per-trip pipeline: resolve, snap, split, measure and assemble.
/// holds only read-only state so trips can run on any thread.
pub struct LinkSpeedEngine<'a> {
    dataset: &'a dyn DatasetProvider,
    projection: Projection,
    resolver: ShapeResolver,
    snapper: StopSnapper,
    calculator: DistanceCalculator,
    classifier: PeriodClassifier,
    missing_stop_location_policy: MissingStopLocationPolicy,
}

impl<'a> LinkSpeedEngine<'a> {
    pub fn new(
        dataset: &'a dyn DatasetProvider,
        config: &LinkSpeedConfig,
    ) -> Result<LinkSpeedEngine<'a>, LinkSpeedError> {
        let classifier = config.validate()?;
        let projection = Projection::new(&config.projection, dataset.mean_stop_latitude())?;
        log::debug!("measuring distances with {projection:?}");
        Ok(LinkSpeedEngine {
            dataset,
            resolver: ShapeResolver::new(dataset, &projection, config.use_shapes),
            snapper: StopSnapper::new(config.snap_tolerance, config.distance_unit, &projection),
            calculator: DistanceCalculator::new(projection.native_unit(), config.distance_unit),
            projection,
            classifier,
            missing_stop_location_policy: config.missing_stop_location_policy,
        })
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// the trip's visits in sequence order with their projected stop
    /// locations. visits whose stop has no location are dropped and returned
    /// as errors, unless the policy is to fail the trip.
    pub fn locate_visits(
        &self,
        trip: &TripRecord,
    ) -> Result<(Vec<LocatedVisit<'a>>, Vec<LinkSpeedError>), LinkSpeedError> {
        let mut located = vec![];
        let mut dropped = vec![];
        for visit in self.dataset.stop_visits(&trip.trip_id) {
            match self.dataset.stop_location(&visit.stop_id) {
                Some((lon, lat)) => located.push(LocatedVisit {
                    visit,
                    coord: self.projection.project(lon, lat),
                }),
                None => {
                    let error = LinkSpeedError::MissingStopLocationError {
                        trip_id: trip.trip_id.clone(),
                        stop_id: visit.stop_id.clone(),
                    };
                    match self.missing_stop_location_policy {
                        MissingStopLocationPolicy::Fail => return Err(error),
                        MissingStopLocationPolicy::DropStop => {
                            log::warn!("{error}, dropping the visit");
                            dropped.push(error);
                        }
                    }
                }
            }
        }
        Ok((located, dropped))
    }

    /// the trip's path geometry, along with its located visits.
    pub fn resolve_geometry(
        &self,
        trip: &TripRecord,
    ) -> Result<(TripGeometry, Vec<LocatedVisit<'a>>), LinkSpeedError> {
        let (located, _) = self.locate_visits(trip)?;
        let geometry = self.resolver.resolve(trip, &located)?;
        Ok((geometry, located))
    }

    /// runs one trip end to end. an `Err` means the trip produced nothing.
    /// a stop that fails to snap takes the links on both sides of it along.
    pub fn process_trip(&self, trip: &TripRecord) -> Result<TripOutcome, LinkSpeedError> {
        let (located, mut errors) = self.locate_visits(trip)?;
        let geometry = self.resolver.resolve(trip, &located)?;
        let snap = self.snapper.snap(&geometry, &located);
        errors.extend(snap.failures);
        let links = link_splitter::split(&geometry, &snap.snapped)?;

        let attributes = self.trip_attributes(trip);
        let assembler = SpeedAssembler::new(&self.classifier);
        let mut records = Vec::with_capacity(links.len());
        let pairs = link_splitter::consecutive_pairs(&snap.snapped);
        for (link, (begin, end)) in links.into_iter().zip(pairs) {
            let distance = self.calculator.measure(&link, geometry.provenance);
            match assembler.assemble(
                trip,
                &geometry,
                &attributes,
                link,
                distance,
                begin.visit,
                end.visit,
            ) {
                Ok(record) => records.push(record),
                Err(e) => {
                    log::warn!("skipping link on trip {}: {e}", trip.trip_id);
                    errors.push(e);
                }
            }
        }
        Ok(TripOutcome { records, errors })
    }

    /// route, agency and calendar context for the trip's records.
    pub fn trip_attributes(&self, trip: &TripRecord) -> TripAttributes {
        let route = self.dataset.route(&trip.route_id);
        let calendar = self.dataset.calendar(&trip.service_id);
        TripAttributes {
            route_short_name: route.and_then(|r| r.short_name.clone()),
            agency_name: self
                .dataset
                .agency_name(route.and_then(|r| r.agency_id.as_deref()))
                .map(String::from),
            calendar_start: calendar.map(|c| c.start_date),
            calendar_end: calendar.map(|c| c.end_date),
        }
    }
}
