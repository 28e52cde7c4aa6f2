use serde::{Deserialize, Serialize};

use estate_types::models::{Property, PropertyType, PropertyWithOwner};

use crate::geo::{Coordinates, haversine_km};
use crate::price::PriceRange;

/// Default search radius around a location, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// What the filters need to know about a listing.
pub trait Listing {
    fn price(&self) -> f64;
    fn kind(&self) -> PropertyType;
    fn coordinates(&self) -> Option<Coordinates>;
}

impl Listing for Property {
    fn price(&self) -> f64 {
        self.price
    }

    fn kind(&self) -> PropertyType {
        self.kind
    }

    fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

impl Listing for PropertyWithOwner {
    fn price(&self) -> f64 {
        self.property.price()
    }

    fn kind(&self) -> PropertyType {
        self.property.kind()
    }

    fn coordinates(&self) -> Option<Coordinates> {
        self.property.coordinates()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Sale,
    Rent,
}

impl TypeFilter {
    fn accepts(&self, kind: PropertyType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Sale => kind == PropertyType::Sale,
            TypeFilter::Rent => kind == PropertyType::Rent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub center: Coordinates,
    pub radius_km: f64,
}

impl LocationFilter {
    pub fn around(center: Coordinates) -> Self {
        Self { center, radius_km: DEFAULT_RADIUS_KM }
    }

    /// Listings without stored coordinates never match a location search.
    fn accepts(&self, coordinates: Option<Coordinates>) -> bool {
        coordinates.is_some_and(|c| haversine_km(self.center, c) <= self.radius_km)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub kind: TypeFilter,
    pub price: Option<PriceRange>,
    pub location: Option<LocationFilter>,
}

impl FilterOptions {
    pub fn matches<L: Listing>(&self, listing: &L) -> bool {
        if !self.kind.accepts(listing.kind()) {
            return false;
        }
        if let Some(range) = &self.price {
            if !range.contains(listing.price()) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !location.accepts(listing.coordinates()) {
                return false;
            }
        }
        true
    }
}

/// Keep the listings matching every active filter, preserving input order.
pub fn filter_properties<L: Listing + Clone>(listings: &[L], options: &FilterOptions) -> Vec<L> {
    listings
        .iter()
        .filter(|l| options.matches(*l))
        .cloned()
        .collect()
}
