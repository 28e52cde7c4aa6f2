//! In-memory listing search.
//!
//! Everything here is a pure O(n) scan over an already-loaded slice of
//! listings. Volumes are small enough that nothing is indexed.

pub mod filter;
pub mod geo;
pub mod price;

pub use filter::{FilterOptions, Listing, LocationFilter, TypeFilter, filter_properties};
pub use geo::{Coordinates, haversine_km};
pub use price::{PriceRange, format_inr};
