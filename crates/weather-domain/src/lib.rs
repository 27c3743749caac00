//! # Weather Domain Model
//!
//! Value types for the weather caches: the structured `LocationWeather`
//! record stored in the query cache, the conditions it reports, and the
//! locations the application tracks. These types are shared by the cache
//! connector and the CLI.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// A city and the country it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
}

impl Location {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }

    /// Cache key for this location, e.g. `Rome, Italy`
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

impl FromStr for Location {
    type Err = DomainError;

    /// Parses `City, Country`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (city, country) = s
            .split_once(',')
            .ok_or_else(|| DomainError::InvalidLocation(s.to_string()))?;
        let (city, country) = (city.trim(), country.trim());
        if city.is_empty() || country.is_empty() {
            return Err(DomainError::InvalidLocation(s.to_string()));
        }
        Ok(Self::new(city, country))
    }
}

/// Locations tracked by default
pub const DEFAULT_LOCATIONS: &[(&str, &str)] = &[
    ("Rome", "Italy"),
    ("Como", "Italy"),
    ("Basel", "Switzerland"),
    ("Bern", "Switzerland"),
    ("London", "UK"),
    ("Newcastle", "UK"),
    ("Bucarest", "Romania"),
    ("Cluj-Napoca", "Romania"),
    ("Ottawa", "Canada"),
    ("Toronto", "Canada"),
    ("Lisbon", "Portugal"),
    ("Porto", "Portugal"),
    ("Raleigh", "USA"),
    ("Washington", "USA"),
];

/// Default locations as owned values
#[must_use]
pub fn default_locations() -> Vec<Location> {
    DEFAULT_LOCATIONS
        .iter()
        .map(|(city, country)| Location::new(*city, *country))
        .collect()
}

// =============================================================================
// ENUMS
// =============================================================================

/// Reported weather condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Windy,
    Foggy,
}

impl WeatherCondition {
    pub const ALL: [Self; 7] = [
        Self::Sunny,
        Self::Cloudy,
        Self::Rainy,
        Self::Stormy,
        Self::Snowy,
        Self::Windy,
        Self::Foggy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
            Self::Snowy => "snowy",
            Self::Windy => "windy",
            Self::Foggy => "foggy",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherCondition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownCondition(s.to_string()))
    }
}

// =============================================================================
// ENTITY TYPES
// =============================================================================

/// Weather reading for a single location.
///
/// This is the value type of the query cache. The condition is kept as free
/// text so readings from other producers still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWeather {
    pub temperature: f32,
    pub condition: String,
    pub city: String,
    pub country: String,
}

impl LocationWeather {
    pub fn new(temperature: f32, condition: WeatherCondition, location: &Location) -> Self {
        Self {
            temperature,
            condition: condition.as_str().to_string(),
            city: location.city.clone(),
            country: location.country.clone(),
        }
    }

    #[must_use]
    pub fn location(&self) -> Location {
        Location::new(self.city.clone(), self.country.clone())
    }

    /// Parsed condition, `None` when the stored text is not a known condition
    #[must_use]
    pub fn weather_condition(&self) -> Option<WeatherCondition> {
        self.condition.parse().ok()
    }
}

impl fmt::Display for LocationWeather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}: {:.1}°C, {}",
            self.city, self.country, self.temperature, self.condition
        )
    }
}

// =============================================================================
// WEATHER SOURCE
// =============================================================================

/// Source of weather readings
pub trait WeatherService: Send + Sync {
    fn get_for_location(&self, location: &Location) -> LocationWeather;
}

/// Lowest temperature the random source produces, in °C
pub const MIN_TEMPERATURE_C: f32 = -10.0;
/// Highest temperature the random source produces, in °C
pub const MAX_TEMPERATURE_C: f32 = 40.0;

/// Produces random but plausible readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWeatherService;

impl RandomWeatherService {
    pub const fn new() -> Self {
        Self
    }
}

impl WeatherService for RandomWeatherService {
    fn get_for_location(&self, location: &Location) -> LocationWeather {
        let mut rng = rand::thread_rng();
        let raw: f32 = rng.gen_range(MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C);
        // one decimal place, like a station report
        let temperature = ((raw * 10.0).round() / 10.0).clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C);
        let condition = WeatherCondition::ALL[rng.gen_range(0..WeatherCondition::ALL.len())];
        LocationWeather::new(temperature, condition, location)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid location '{0}', expected 'City, Country'")]
    InvalidLocation(String),

    #[error("Unknown weather condition: {0}")]
    UnknownCondition(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;
    use fake::faker::address::en::{CityName, CountryName};

    #[test]
    fn test_location_parse() {
        let location: Location = "Cluj-Napoca, Romania".parse().unwrap();
        assert_eq!(location, Location::new("Cluj-Napoca", "Romania"));
        assert_eq!(location.key(), "Cluj-Napoca, Romania");
    }

    #[test]
    fn test_location_parse_rejects_missing_country() {
        assert!(matches!(
            "Rome".parse::<Location>(),
            Err(DomainError::InvalidLocation(_))
        ));
        assert!(matches!(
            "Rome, ".parse::<Location>(),
            Err(DomainError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_location_display_parse_agree() {
        let city: String = CityName().fake();
        let country: String = CountryName().fake();
        let location = Location::new(city.trim(), country.trim());
        if location.city.contains(',') || location.country.contains(',') {
            return;
        }
        let parsed: Location = location.to_string().parse().unwrap();
        assert_eq!(parsed, location);
    }

    #[test]
    fn test_condition_parse() {
        assert_eq!("Sunny".parse::<WeatherCondition>().unwrap(), WeatherCondition::Sunny);
        assert_eq!(" foggy ".parse::<WeatherCondition>().unwrap(), WeatherCondition::Foggy);
        assert!("hail".parse::<WeatherCondition>().is_err());
    }

    #[test]
    fn test_default_locations() {
        let locations = default_locations();
        assert_eq!(locations.len(), DEFAULT_LOCATIONS.len());
        assert!(locations.contains(&Location::new("Rome", "Italy")));
    }

    #[test]
    fn test_random_weather_in_range() {
        let service = RandomWeatherService::new();
        let location = Location::new("Bern", "Switzerland");

        for _ in 0..200 {
            let weather = service.get_for_location(&location);
            assert!(weather.temperature >= MIN_TEMPERATURE_C);
            assert!(weather.temperature <= MAX_TEMPERATURE_C);
            assert_eq!(weather.location(), location);
            assert!(weather.weather_condition().is_some());
        }
    }

    #[test]
    fn test_location_weather_display() {
        let weather = LocationWeather::new(21.5, WeatherCondition::Cloudy, &Location::new("Porto", "Portugal"));
        assert_eq!(weather.to_string(), "Porto, Portugal: 21.5°C, cloudy");
        assert_eq!(weather.weather_condition(), Some(WeatherCondition::Cloudy));
    }
}
