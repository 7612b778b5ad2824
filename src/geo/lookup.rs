//! Geocode Lookup Module
//! Rate-limited, cancellable population of the geocode cache.

use super::cache::{GeoPoint, GeocodeCache};
use crate::data::Record;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from a single geocoding lookup.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed or timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Resolves one free-text location to coordinates.
pub trait LocationGeocoder {
    /// `Ok(None)` means the service had no match.
    fn lookup(&self, location: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

/// Enforces a minimum delay between successive calls to [`RateLimiter::wait`].
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last: None,
        }
    }

    /// Block until `min_delay` has passed since the previous call.
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                thread::sleep(self.min_delay - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Shared cancellation flag, checked before every lookup.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summary of one geocoding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeocodeRun {
    /// Unique non-empty locations not already cached.
    pub pending: usize,
    pub looked_up: usize,
    pub resolved: usize,
    /// Lookups that errored or found nothing; cached as unresolved.
    pub unresolved: usize,
    pub cancelled: bool,
}

/// Unique non-empty locations, in first-seen order, that have no cache entry.
pub fn pending_locations<'a, I>(records: I, cache: &GeocodeCache) -> Vec<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter_map(|r| r.location.as_deref())
        .map(str::trim)
        .filter(|l| !l.is_empty() && !cache.contains(l))
        .filter(|l| seen.insert(*l))
        .map(str::to_string)
        .collect()
}

/// Look up every pending location and record the outcome in `cache`.
///
/// Failures and misses are stored as [`GeoPoint::UNRESOLVED`] so later runs
/// skip them. When `cancel` is set the run stops before the next lookup;
/// entries recorded so far are kept.
pub fn geocode_missing<'a, I, G>(
    records: I,
    cache: &mut GeocodeCache,
    geocoder: &G,
    limiter: &mut RateLimiter,
    cancel: &CancelFlag,
) -> GeocodeRun
where
    I: IntoIterator<Item = &'a Record>,
    G: LocationGeocoder + ?Sized,
{
    let pending = pending_locations(records, cache);
    let mut run = GeocodeRun {
        pending: pending.len(),
        ..Default::default()
    };
    log::info!("Geocoding {} unique locations", pending.len());

    for location in pending {
        if cancel.is_cancelled() {
            log::warn!(
                "Geocoding cancelled after {} of {} lookups",
                run.looked_up,
                run.pending
            );
            run.cancelled = true;
            break;
        }

        limiter.wait();
        run.looked_up += 1;

        let point = match geocoder.lookup(&location) {
            Ok(Some(point)) => {
                run.resolved += 1;
                point
            }
            Ok(None) => {
                log::debug!("No geocoding match for {location:?}");
                run.unresolved += 1;
                GeoPoint::UNRESOLVED
            }
            Err(e) => {
                log::warn!("Geocoding {location:?} failed: {e}");
                run.unresolved += 1;
                GeoPoint::UNRESOLVED
            }
        };
        cache.insert(location, point);
    }

    log::info!(
        "Geocoding finished: {} resolved, {} unresolved",
        run.resolved,
        run.unresolved
    );
    run
}
