//! Geo module - geocode cache, cache merge and rate-limited lookups

mod cache;
mod lookup;
mod merge;
mod nominatim;

pub use cache::{CacheError, GeoPoint, GeocodeCache};
pub use lookup::{
    geocode_missing, pending_locations, CancelFlag, GeocodeError, GeocodeRun, LocationGeocoder,
    RateLimiter,
};
pub use merge::merge_geocodes;
pub use nominatim::NominatimGeocoder;
