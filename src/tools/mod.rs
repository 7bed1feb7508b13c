pub mod model;

pub use model::{GoogleMapsConfig, GoogleSearchConfig, LatLng, RetrievalConfig, Tool, ToolConfig};
