//! # Weather App
//!
//! Loads weather readings into the remote caches provisioned by
//! [`weather_cache::CacheConnector`].
//!
//! ## Features
//!
//! - Temperature per location in `weather-simple`
//! - Full readings per location in `weather-query`
//! - Country lookups over the queryable cache

#![forbid(unsafe_code)]
#![warn(clippy::all)]

use weather_cache::{IckleQuery, ProtoSchema, RemoteCache, Result, SortOrder};
use weather_domain::{Location, LocationWeather, WeatherService};

/// Store one temperature per location, returning how many were written
pub async fn load_temperatures(
    cache: &RemoteCache<f32>,
    service: &impl WeatherService,
    locations: &[Location],
) -> Result<usize> {
    for location in locations {
        let weather = service.get_for_location(location);
        cache.put(&location.key(), &weather.temperature).await?;
        tracing::debug!(%location, temperature = weather.temperature, "Stored temperature");
    }
    Ok(locations.len())
}

/// Store one full reading per location, returning how many were written
pub async fn load_readings(
    cache: &RemoteCache<LocationWeather>,
    service: &impl WeatherService,
    locations: &[Location],
) -> Result<usize> {
    for location in locations {
        let weather = service.get_for_location(location);
        cache.put(&location.key(), &weather).await?;
        tracing::debug!(%weather, "Stored reading");
    }
    Ok(locations.len())
}

/// Readings for every city of a country, ordered by city
pub fn country_query(country: &str) -> IckleQuery {
    IckleQuery::new(<LocationWeather as ProtoSchema>::TYPE_NAME)
        .where_eq("country", country)
        .order_by("city", SortOrder::Asc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weather_cache::{CacheConnector, InMemoryTransport};
    use weather_domain::{WeatherCondition, default_locations};

    /// Always reports the same weather
    struct FixedWeather(f32);

    impl WeatherService for FixedWeather {
        fn get_for_location(&self, location: &Location) -> LocationWeather {
            LocationWeather::new(self.0, WeatherCondition::Cloudy, location)
        }
    }

    async fn connector() -> CacheConnector {
        let mut connector = CacheConnector::default();
        connector
            .connect_with(Arc::new(InMemoryTransport::new()))
            .await
            .unwrap();
        connector
    }

    #[tokio::test]
    async fn test_load_temperatures() {
        let connector = connector().await;
        let cache = connector.get_simple_cache().await.unwrap();
        let locations = default_locations();

        let written = load_temperatures(&cache, &FixedWeather(12.5), &locations)
            .await
            .unwrap();

        assert_eq!(written, locations.len());
        assert_eq!(cache.size().await.unwrap(), locations.len() as u64);
        assert_eq!(cache.get("Rome, Italy").await.unwrap(), Some(12.5));
    }

    #[tokio::test]
    async fn test_load_readings() {
        let connector = connector().await;
        let cache = connector.get_query_cache().await.unwrap();
        let como = Location::new("Como", "Italy");

        load_readings(&cache, &FixedWeather(-1.0), std::slice::from_ref(&como))
            .await
            .unwrap();

        let stored = cache.get(&como.key()).await.unwrap().unwrap();
        assert_eq!(stored.location(), como);
        assert_eq!(stored.weather_condition(), Some(WeatherCondition::Cloudy));
    }

    #[test]
    fn test_country_query() {
        assert_eq!(
            country_query("Italy").to_string(),
            "FROM weather.LocationWeather w WHERE w.country = 'Italy' ORDER BY w.city ASC"
        );
    }
}
