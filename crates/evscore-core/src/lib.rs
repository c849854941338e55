//! Domain types, scoring formula and configuration shared by every evscore crate.

pub mod amenity;
pub mod app_config;
pub mod config;
pub mod envelope;
pub mod geometry;
pub mod score;
pub mod station;

use thiserror::Error;

pub use amenity::{merge_amenities, Amenity, AmenityCategory, AmenitySource, UNRATED};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use envelope::FeatureCollection;
pub use geometry::{Coordinate, Isochrone};
pub use score::{
    amenity_term, distance_term, station_score, ScoredAmenity, ScoredStation,
    RATED_RESTAURANT_BONUS,
};
pub use station::{ChargingStation, StationWithDistance};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("coordinate is not finite: [{lon}, {lat}]")]
    NonFiniteCoordinate { lon: f64, lat: f64 },

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("unknown amenity category: {0}")]
    UnknownCategory(String),

    #[error("isochrone geometry must be a polygon or multipolygon, got {0}")]
    UnsupportedIsochroneGeometry(String),
}
