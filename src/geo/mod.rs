//! World geography: loading, decoding, projection and distances.

pub mod distance;
mod features;
mod projection;
pub mod store;
mod topojson;

pub use features::GeographyFeature;
pub use projection::Projector;
pub use store::GeographyStore;
