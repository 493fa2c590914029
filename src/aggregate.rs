//! Aggregations behind the dashboard charts.
//!
//! Group keys come out sorted, so the same rows always produce the same
//! chart regardless of input order.

use crate::table::Table;
use epiwatch_types::record::{CaseRecord, Counts};
use epiwatch_types::summary::{DiseaseSummary, Hotspot, RegionCases, RegionSummary};
use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Shown in place of the map when the dataset has no coordinate columns.
pub const MAP_UNAVAILABLE_NOTICE: &str =
    "Map not shown: add 'latitude' and 'longitude' columns to the dataset.";

/// New cases, recoveries and deaths summed per region.
pub fn regional_summary<'a, I>(rows: I) -> Vec<RegionSummary>
where
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let mut groups: BTreeMap<&'a str, Counts> = BTreeMap::new();
    for row in rows {
        *groups.entry(row.region.as_str()).or_default() += row.counts;
    }
    groups
        .into_iter()
        .map(|(region, totals)| RegionSummary {
            region: region.to_string(),
            totals,
        })
        .collect()
}

/// New cases summed per disease.
pub fn disease_summary<'a, I>(rows: I) -> Vec<DiseaseSummary>
where
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let mut groups: BTreeMap<&'a str, i64> = BTreeMap::new();
    for row in rows {
        let total = groups.entry(row.disease.as_str()).or_default();
        *total = total.saturating_add(row.counts.new_cases);
    }
    groups
        .into_iter()
        .map(|(disease, new_cases)| DiseaseSummary {
            disease: disease.to_string(),
            new_cases,
        })
        .collect()
}

/// New cases summed per region; the aggregate drawn for each replay window.
pub fn window_summary<'a, I>(rows: I) -> Vec<RegionCases>
where
    I: IntoIterator<Item = &'a CaseRecord>,
{
    let mut groups: BTreeMap<&'a str, i64> = BTreeMap::new();
    for row in rows {
        let total = groups.entry(row.region.as_str()).or_default();
        *total = total.saturating_add(row.counts.new_cases);
    }
    groups
        .into_iter()
        .map(|(region, new_cases)| RegionCases {
            region: region.to_string(),
            new_cases,
        })
        .collect()
}

/// What the map panel can show for a table.
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    Hotspots(Vec<Hotspot>),
    /// The dataset has no coordinates; carries the notice to show instead.
    Unavailable(&'static str),
}

impl MapView {
    pub fn is_available(&self) -> bool {
        matches!(self, MapView::Hotspots(_))
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        match self {
            MapView::Hotspots(h) => h,
            MapView::Unavailable(_) => &[],
        }
    }

    /// Hotspots as a GeoJSON point collection, `None` when unavailable.
    pub fn to_geojson(&self) -> Option<FeatureCollection> {
        match self {
            MapView::Hotspots(hotspots) => Some(hotspots_to_geojson(hotspots)),
            MapView::Unavailable(_) => None,
        }
    }
}

/// Group rows by `(region, latitude, longitude)` and sum new cases.
///
/// Rows without a location, or with one outside the valid coordinate range,
/// are skipped.
pub fn hotspots(table: &Table) -> MapView {
    if !table.has_coordinates() {
        log::info!("{}", MAP_UNAVAILABLE_NOTICE);
        return MapView::Unavailable(MAP_UNAVAILABLE_NOTICE);
    }

    let mut groups: FxHashMap<(&str, u64, u64), i64> = FxHashMap::default();
    let mut skipped = 0usize;

    for row in table {
        let Some(location) = map_position(row) else {
            skipped += 1;
            continue;
        };
        // `+ 0.0` folds -0.0 into 0.0 so both land in one group
        let key = (
            row.region.as_str(),
            (location.y() + 0.0).to_bits(),
            (location.x() + 0.0).to_bits(),
        );
        let total = groups.entry(key).or_default();
        *total = total.saturating_add(row.counts.new_cases);
    }

    if skipped > 0 {
        log::debug!("{} rows had no usable location", skipped);
    }

    let mut hotspots: Vec<Hotspot> = groups
        .into_iter()
        .map(|((region, lat, lon), new_cases)| Hotspot {
            region: region.to_string(),
            location: Point::new(f64::from_bits(lon), f64::from_bits(lat)),
            new_cases,
        })
        .collect();

    hotspots.sort_by(|a, b| {
        a.region
            .cmp(&b.region)
            .then(a.latitude().total_cmp(&b.latitude()))
            .then(a.longitude().total_cmp(&b.longitude()))
    });

    MapView::Hotspots(hotspots)
}

/// The row's location if it can be drawn on a world map.
fn map_position(row: &CaseRecord) -> Option<Point<f64>> {
    let location = row.location?;
    let on_map = (-90.0..=90.0).contains(&location.y())
        && (-180.0..=180.0).contains(&location.x());
    if !on_map {
        // NaN fails the range checks too
        log::warn!(
            "Leaving {} {} on {} off the map: ({}, {}) is not a lat/lon pair",
            row.region,
            row.disease,
            row.day(),
            location.y(),
            location.x()
        );
        return None;
    }
    Some(location)
}

fn hotspots_to_geojson(hotspots: &[Hotspot]) -> FeatureCollection {
    let features = hotspots
        .iter()
        .map(|h| {
            let mut properties = JsonObject::new();
            properties.insert("region".to_string(), h.region.clone().into());
            properties.insert("new_cases".to_string(), h.new_cases.into());
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Point(vec![
                    h.longitude(),
                    h.latitude(),
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_table;
    use chrono::NaiveDate;

    fn row(region: &str, disease: &str, cases: i64) -> CaseRecord {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        CaseRecord::new(date, region, disease, Counts::new(cases, 1, 0))
    }

    #[test]
    fn test_regional_summary_sorted_and_summed() {
        let rows = [
            row("South", "Flu", 4),
            row("North", "Flu", 1),
            row("South", "Dengue", 6),
        ];
        let summary = regional_summary(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].region, "North");
        assert_eq!(summary[1].region, "South");
        assert_eq!(summary[1].totals, Counts::new(10, 2, 0));
    }

    #[test]
    fn test_disease_summary() {
        let rows = [
            row("A", "Flu", 4),
            row("B", "Flu", 1),
            row("A", "Dengue", 6),
        ];
        let summary = disease_summary(&rows);
        assert_eq!(
            summary,
            vec![
                DiseaseSummary {
                    disease: "Dengue".into(),
                    new_cases: 6
                },
                DiseaseSummary {
                    disease: "Flu".into(),
                    new_cases: 5
                },
            ]
        );
    }

    #[test]
    fn test_empty_rows_produce_empty_summaries() {
        let empty: [CaseRecord; 0] = [];
        assert!(regional_summary(&empty).is_empty());
        assert!(disease_summary(&empty).is_empty());
        assert!(window_summary(&empty).is_empty());
    }

    #[test]
    fn test_map_unavailable_without_coordinates() {
        let view = hotspots(&sample_table(4));
        assert_eq!(view, MapView::Unavailable(MAP_UNAVAILABLE_NOTICE));
        assert!(view.to_geojson().is_none());
        assert!(view.hotspots().is_empty());
    }

    #[test]
    fn test_map_position_bounds() {
        let at = |lon: f64, lat: f64| row("X", "Flu", 1).with_location(Point::new(lon, lat));

        assert!(map_position(&at(0.0, 0.0)).is_some());
        assert!(map_position(&at(180.0, 90.0)).is_some());
        assert!(map_position(&at(-180.0, -90.0)).is_some());

        assert!(map_position(&at(180.1, 0.0)).is_none());
        assert!(map_position(&at(0.0, -90.5)).is_none());
        assert!(map_position(&at(f64::NAN, 0.0)).is_none());
        assert!(map_position(&at(0.0, f64::INFINITY)).is_none());
        assert!(map_position(&row("X", "Flu", 1)).is_none());
    }

    #[test]
    fn test_hotspots_group_and_skip_bad_locations() {
        let rows = vec![
            row("Lagos", "Cholera", 5).with_location(Point::new(3.4, 6.5)),
            row("Lagos", "Cholera", 7).with_location(Point::new(3.4, 6.5)),
            row("Abuja", "Cholera", 2).with_location(Point::new(7.5, 9.1)),
            row("Nowhere", "Cholera", 99).with_location(Point::new(500.0, 9.1)),
            row("Kano", "Cholera", 3),
        ];
        let view = hotspots(&Table::new(rows, true));

        let spots = view.hotspots();
        assert_eq!(spots.len(), 2);
        assert_eq!(spots[0].region, "Abuja");
        assert_eq!(spots[1].region, "Lagos");
        assert_eq!(spots[1].new_cases, 12);
        assert_eq!(spots[1].latitude(), 6.5);

        let geojson = view.to_geojson().unwrap();
        assert_eq!(geojson.features.len(), 2);
        let props = geojson.features[1].properties.as_ref().unwrap();
        assert_eq!(props["new_cases"], 12);
    }
}
