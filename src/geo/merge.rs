//! Geo-merge Module
//! Left-joins geocode cache coordinates onto records by exact location match.

use super::cache::GeocodeCache;
use crate::data::Dataset;

/// Attach cached coordinates to a dataset that has no coordinate columns.
///
/// Datasets that already carry latitude/longitude are returned unchanged.
/// Records whose location has no cache entry keep `None` coordinates. The
/// cache is only read.
pub fn merge_geocodes(dataset: Dataset, cache: &GeocodeCache) -> Dataset {
    if dataset.has_coordinate_columns() {
        return dataset;
    }

    let mut matched = 0usize;
    let records = dataset
        .into_records()
        .into_iter()
        .map(|mut record| {
            if let Some(point) = record.location.as_deref().and_then(|l| cache.get(l)) {
                record.latitude = point.latitude;
                record.longitude = point.longitude;
                matched += 1;
            }
            record
        })
        .collect::<Vec<_>>();

    log::info!(
        "Geo-merge matched {} of {} records against {} cache entries",
        matched,
        records.len(),
        cache.len()
    );
    Dataset::new(records, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::geo::GeoPoint;

    fn cache() -> GeocodeCache {
        let mut cache = GeocodeCache::new();
        cache.insert("Springfield", GeoPoint::new(39.8, -89.6));
        cache.insert("Atlantis", GeoPoint::UNRESOLVED);
        cache
    }

    #[test]
    fn joins_by_exact_location() {
        let ds = Dataset::new(
            vec![
                Record::new(None, "Acme Air", 1, "None").with_location("Springfield"),
                Record::new(None, "Acme Air", 1, "None").with_location("springfield"),
                Record::new(None, "Acme Air", 1, "None").with_location("Atlantis"),
                Record::new(None, "Acme Air", 1, "None"),
            ],
            false,
        );
        let merged = merge_geocodes(ds, &cache());
        let records = merged.records();

        assert!(merged.has_coordinate_columns());
        assert_eq!(records[0].latitude, Some(39.8));
        assert_eq!(records[0].longitude, Some(-89.6));
        assert_eq!((records[1].latitude, records[1].longitude), (None, None));
        assert_eq!((records[2].latitude, records[2].longitude), (None, None));
        assert_eq!((records[3].latitude, records[3].longitude), (None, None));
    }

    #[test]
    fn source_coordinates_take_precedence() {
        let ds = Dataset::new(
            vec![Record::new(None, "Acme Air", 1, "None")
                .with_location("Springfield")
                .with_coordinates(Some(1.0), Some(2.0))],
            true,
        );
        let merged = merge_geocodes(ds, &cache());
        assert_eq!(merged.records()[0].latitude, Some(1.0));
    }
}
