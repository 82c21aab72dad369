use serde::{Deserialize, Serialize};

/// Mean equatorial radius used by the map provider's spherical geometry.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;
pub const NEARBY_RADIUS_METERS: f64 = 20.0;
pub const DEFAULT_PRICE_PER_HOUR: u64 = 100;
pub const NEW_SPACE_NUMBER: &str = "New";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance in meters (haversine).
    pub fn distance_to(&self, other: &Location) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceStatus {
    Available,
    /// Held while a payment for it is in flight.
    Reserved,
    Booked,
    Expiring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub id: String,
    pub location: Location,
    pub status: SpaceStatus,
    pub price_per_hour: u64,
    pub space_number: String,
}

impl ParkingSpace {
    /// An unlisted space at `location`, offered at the default rate.
    pub fn new_at(location: Location) -> Self {
        Self {
            id: format!("new-{}", uuid::Uuid::new_v4()),
            location,
            status: SpaceStatus::Available,
            price_per_hour: DEFAULT_PRICE_PER_HOUR,
            space_number: NEW_SPACE_NUMBER.to_string(),
        }
    }

    pub fn is_bookable(&self) -> bool {
        self.status == SpaceStatus::Available
    }

    pub fn total_for(&self, duration_hours: u32) -> u64 {
        self.price_per_hour.saturating_mul(u64::from(duration_hours))
    }
}
