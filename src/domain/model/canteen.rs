use serde::{Deserialize, Serialize};

/// Identity and location facts for one physical canteen, as returned by
/// the `/canteens/` endpoints. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanteenInfo {
    id: u32,
    name: String,
    city: String,
    address: String,
    coordinates: Option<[f64; 2]>,
}

impl CanteenInfo {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        city: impl Into<String>,
        address: impl Into<String>,
        coordinates: Option<[f64; 2]>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            city: city.into(),
            address: address.into(),
            coordinates,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `(latitude, longitude)`, if the source lists any.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.coordinates.map(|[lat, lon]| (lat, lon))
    }
}
