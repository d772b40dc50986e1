//! External mapping services: coordinate resolution and route lookup.

mod directions;
mod geocode;

pub use directions::{DirectionsClient, Route, RouteStep, TravelMode};
pub use geocode::{GeoClient, GeoError};
