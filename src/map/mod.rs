//! The interactive map: view state, input handling and backends.

pub mod backend;
pub mod interaction;
mod texture_cache;
pub mod view;

pub use backend::{select_backend, MapAction, MapBackend, SimulatedMap};
pub use view::{Affine, ViewState};
