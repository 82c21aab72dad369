use crate::domain::space::{Location, ParkingSpace, SpaceStatus, NEARBY_RADIUS_METERS};
use crate::error::BookingError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize)]
pub struct City {
    pub name: String,
    pub center: Location,
    pub spaces: Vec<ParkingSpace>,
}

/// In-memory city and space listing. Nothing here outlives the process.
#[derive(Debug, Clone, Default)]
pub struct SpaceCatalog {
    cities: BTreeMap<String, City>,
}

impl SpaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded() -> Self {
        let mut catalog = Self::new();
        catalog.add_city("Nairobi", Location::new(-1.2921, 36.8219));
        catalog.add_city("Mombasa", Location::new(-4.0435, 39.6682));
        catalog.add_city("Kisumu", Location::new(-0.1022, 34.7617));
        catalog.add_city("Nakuru", Location::new(-0.3031, 36.0800));

        let seeds = [
            ("Nairobi", "1", -1.2921, 36.8219, SpaceStatus::Available, 100, "A1"),
            ("Nairobi", "2", -1.2925, 36.8225, SpaceStatus::Booked, 100, "A2"),
            ("Nairobi", "3", -1.2918, 36.8220, SpaceStatus::Expiring, 100, "A3"),
            ("Mombasa", "4", -4.0435, 39.6682, SpaceStatus::Available, 80, "M1"),
        ];
        for (city, id, lat, lng, status, price_per_hour, number) in seeds {
            catalog.add_space(
                city,
                ParkingSpace {
                    id: id.to_string(),
                    location: Location::new(lat, lng),
                    status,
                    price_per_hour,
                    space_number: number.to_string(),
                },
            );
        }
        catalog
    }

    pub fn add_city(&mut self, name: &str, center: Location) {
        self.cities.entry(name.to_string()).or_insert_with(|| City {
            name: name.to_string(),
            center,
            spaces: Vec::new(),
        });
    }

    /// Returns false when the city is unknown.
    pub fn add_space(&mut self, city: &str, space: ParkingSpace) -> bool {
        match self.cities.get_mut(city) {
            Some(c) => {
                c.spaces.push(space);
                true
            }
            None => false,
        }
    }

    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    pub fn city(&self, name: &str) -> Option<&City> {
        self.cities.get(name)
    }

    pub fn spaces_in(&self, city: &str) -> &[ParkingSpace] {
        self.cities
            .get(city)
            .map(|c| c.spaces.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_space(&self, city: &str, space_number: &str) -> Option<&ParkingSpace> {
        self.spaces_in(city)
            .iter()
            .find(|s| s.space_number == space_number)
    }

    /// Moves `from` to `to` only if the space is currently in `from`.
    pub fn transition(&mut self, city: &str, space_id: &str, from: SpaceStatus, to: SpaceStatus) -> bool {
        let Some(c) = self.cities.get_mut(city) else {
            return false;
        };
        match c.spaces.iter_mut().find(|s| s.id == space_id && s.status == from) {
            Some(space) => {
                space.status = to;
                true
            }
            None => false,
        }
    }

    pub fn is_listed(&self, city: &str, space_id: &str) -> bool {
        self.spaces_in(city).iter().any(|s| s.id == space_id)
    }

    /// Holds a listed space for one payment attempt. Fails unless the space
    /// is currently available.
    pub fn reserve(&mut self, city: &str, space_id: &str) -> Result<(), BookingError> {
        if self.transition(city, space_id, SpaceStatus::Available, SpaceStatus::Reserved) {
            return Ok(());
        }
        let number = self
            .spaces_in(city)
            .iter()
            .find(|s| s.id == space_id)
            .map(|s| s.space_number.clone())
            .unwrap_or_else(|| space_id.to_string());
        Err(BookingError::SpaceUnavailable(number))
    }

    /// The space a click at `at` lands on: the first listed space strictly
    /// within the nearby radius, else a fresh unlisted space at that point.
    /// Returns `None` only for an unknown city.
    pub fn select_at(&self, city: &str, at: Location) -> Option<ParkingSpace> {
        let c = self.cities.get(city)?;
        Some(
            nearest_within(&c.spaces, at, NEARBY_RADIUS_METERS)
                .cloned()
                .unwrap_or_else(|| ParkingSpace::new_at(at)),
        )
    }
}

/// A `Reserved` space awaiting the payment outcome. Dropping it unsettled
/// (e.g. the request future was dropped) puts the space back on offer.
pub struct SpaceReservation {
    catalog: Arc<RwLock<SpaceCatalog>>,
    city: String,
    space_id: String,
    settled: bool,
}

impl SpaceReservation {
    pub async fn acquire(
        catalog: &Arc<RwLock<SpaceCatalog>>,
        city: &str,
        space_id: &str,
    ) -> Result<Self, BookingError> {
        catalog.write().await.reserve(city, space_id)?;
        Ok(Self::held(catalog.clone(), city, space_id))
    }

    /// Wraps a space the caller already moved to `Reserved` via
    /// [`SpaceCatalog::reserve`].
    pub fn held(catalog: Arc<RwLock<SpaceCatalog>>, city: &str, space_id: &str) -> Self {
        Self {
            catalog,
            city: city.to_string(),
            space_id: space_id.to_string(),
            settled: false,
        }
    }

    pub async fn confirm(mut self) {
        self.settled = true;
        self.catalog.write().await.transition(
            &self.city,
            &self.space_id,
            SpaceStatus::Reserved,
            SpaceStatus::Booked,
        );
    }

    pub async fn release(mut self) {
        self.settled = true;
        self.catalog.write().await.transition(
            &self.city,
            &self.space_id,
            SpaceStatus::Reserved,
            SpaceStatus::Available,
        );
    }
}

impl Drop for SpaceReservation {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(city = %self.city, space_id = %self.space_id, "releasing unsettled reservation");
        let catalog = self.catalog.clone();
        let city = std::mem::take(&mut self.city);
        let space_id = std::mem::take(&mut self.space_id);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                catalog
                    .write()
                    .await
                    .transition(&city, &space_id, SpaceStatus::Reserved, SpaceStatus::Available);
            });
        }
    }
}

pub fn nearest_within(spaces: &[ParkingSpace], at: Location, radius_m: f64) -> Option<&ParkingSpace> {
    spaces
        .iter()
        .find(|s| s.location.distance_to(&at) < radius_m)
}
