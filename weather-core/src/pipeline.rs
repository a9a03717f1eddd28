//! City name to weather report: geocode, choose units, fetch, reconcile.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{debug, info, warn};

use crate::{
    LocationCandidate, QueryKey, ReportSource, UnitSystem, WeatherError, WeatherProvider,
    WeatherQuery, WeatherReport,
    cache::{LONG_TTL, SHORT_TTL, TtlCache},
    units::select_units,
};

/// Only the top-ranked geocoding match is used.
const GEOCODE_LIMIT: u8 = 1;

/// Whole reports keyed by query.
pub type ReportCache = TtlCache<QueryKey, WeatherReport>;

/// Top geocoding match keyed by `(city, lang)`; `None` records "no match".
pub type LocationCache = TtlCache<(String, String), Option<LocationCandidate>>;

#[derive(Debug)]
pub struct Resolver<P> {
    provider: P,
    reports: ReportCache,
    locations: LocationCache,
    report_ttl: Duration,
    geocode_ttl: Duration,
}

impl<P: WeatherProvider> Resolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_ttls(provider, SHORT_TTL, LONG_TTL)
    }

    pub fn with_ttls(provider: P, report_ttl: Duration, geocode_ttl: Duration) -> Self {
        Self::with_caches(provider, ReportCache::new(), report_ttl, LocationCache::new(), geocode_ttl)
    }

    /// Build a resolver around caches owned by the caller, e.g. pre-warmed ones.
    pub fn with_caches(
        provider: P,
        reports: ReportCache,
        report_ttl: Duration,
        locations: LocationCache,
        geocode_ttl: Duration,
    ) -> Self {
        Self { provider, reports, locations, report_ttl, geocode_ttl }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve a query into a report, serving repeated queries from cache.
    pub async fn resolve(&self, query: &WeatherQuery) -> Result<WeatherReport, WeatherError> {
        let key = query.key()?;

        self.reports
            .get_or_try_insert_with(key.clone(), self.report_ttl, || self.fetch_report(&key))
            .await
    }

    /// Top geocoding match for `city`, or [`WeatherError::NotFound`].
    pub async fn locate(&self, city: &str, lang: &str) -> Result<LocationCandidate, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::validation("city name must not be empty"));
        }

        self.geocode_top(city, lang)
            .await?
            .ok_or_else(|| WeatherError::NotFound(city.to_string()))
    }

    async fn geocode_top(
        &self,
        city: &str,
        lang: &str,
    ) -> Result<Option<LocationCandidate>, WeatherError> {
        let key = (city.to_string(), lang.to_string());

        self.locations
            .get_or_try_insert_with(key, self.geocode_ttl, || async {
                let candidates = self.provider.geocode(city, GEOCODE_LIMIT, lang).await?;
                Ok::<_, WeatherError>(candidates.into_iter().next())
            })
            .await
    }

    async fn fetch_report(&self, key: &QueryKey) -> Result<WeatherReport, WeatherError> {
        let lang = key.lang.as_str();

        let Some(location) = self.geocode_top(&key.city, lang).await? else {
            // Without coordinates there is no forecast and no country for auto units.
            let units = key.units.explicit().unwrap_or(UnitSystem::Metric);
            warn!(city = %key.city, %units, "no geocoding match, looking up weather by name");

            let snapshot = self.provider.current_by_name(&key.city, units, lang).await?;
            return Ok(WeatherReport {
                units,
                source: ReportSource::NameFallback,
                snapshot,
                forecast: Vec::new(),
            });
        };

        let units = select_units(location.country.as_deref(), key.units.explicit());
        debug!(
            city = %key.city,
            lat = location.lat,
            lon = location.lon,
            country = ?location.country,
            %units,
            "geocoded"
        );

        let (mut snapshot, forecast) = tokio::try_join!(
            self.provider.current_by_coords(location.lat, location.lon, units, lang),
            self.provider.forecast_by_coords(location.lat, location.lon, units, lang),
        )?;

        // Coordinate lookups report the nearest station's name; show the geocoded one.
        snapshot.city_name = location.display_name(lang).to_string();
        if location.country.is_some() {
            snapshot.country_code = location.country.clone();
        }

        info!(
            city = %snapshot.city_name,
            points = forecast.len(),
            %units,
            "weather resolved"
        );

        Ok(WeatherReport {
            units,
            source: ReportSource::Geocoded { lat: location.lat, lon: location.lon },
            snapshot,
            forecast,
        })
    }
}

/// Last-write-wins wrapper: a result that finishes after a newer query was
/// submitted is discarded.
#[derive(Debug)]
pub struct LatestQuery<P> {
    resolver: Resolver<P>,
    latest: AtomicU64,
}

impl<P: WeatherProvider> LatestQuery<P> {
    pub fn new(resolver: Resolver<P>) -> Self {
        Self { resolver, latest: AtomicU64::new(0) }
    }

    pub fn resolver(&self) -> &Resolver<P> {
        &self.resolver
    }

    /// `Ok(None)` means the query was superseded while in flight.
    pub async fn submit(
        &self,
        query: &WeatherQuery,
    ) -> Result<Option<WeatherReport>, WeatherError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.resolver.resolve(query).await;

        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(ticket, city = %query.city, "discarding superseded result");
            return Ok(None);
        }

        result.map(Some)
    }
}
