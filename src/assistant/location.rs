use serde::{Deserialize, Serialize};
use snafu::Snafu;
use std::{fmt, str::FromStr};

use crate::tools::LatLng;

/// Where the driver currently is.
///
/// Coordinates are taken as given; nothing checks that they are in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<GeoLocation> for LatLng {
    fn from(location: GeoLocation) -> Self {
        LatLng::new(location.latitude, location.longitude)
    }
}

/// How a known location is handed to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationMode {
    /// Spell the coordinates out in a driving-context prompt.
    #[default]
    PromptContext,
    /// Keep the prompt as is and enable Google Maps grounding around the coordinates.
    MapsGrounding,
}

impl fmt::Display for LocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationMode::PromptContext => f.write_str("prompt"),
            LocationMode::MapsGrounding => f.write_str("maps"),
        }
    }
}

/// Returned when a location mode name is not recognised.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(display("unknown location mode '{name}'"))]
pub struct UnknownLocationMode {
    pub name: String,
}

impl FromStr for LocationMode {
    type Err = UnknownLocationMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" | "prompt_context" | "context" => Ok(LocationMode::PromptContext),
            "maps" | "maps_grounding" | "grounding" => Ok(LocationMode::MapsGrounding),
            _ => UnknownLocationModeSnafu { name: s }.fail(),
        }
    }
}

/// Persona used as the system instruction when grounding on maps.
pub const DRIVING_SYSTEM_INSTRUCTION: &str =
    "You are an in-car assistant. Answer briefly and safely for someone who is driving.";

/// Rewrite `prompt` so the model knows where the driver is and that they are driving.
pub fn driving_prompt(prompt: &str, location: GeoLocation) -> String {
    format!(
        "You are an in-car assistant. The driver is currently at latitude {}, longitude {}. \
         Answer briefly and safely for someone who is driving. User question: {prompt}",
        location.latitude, location.longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driving_prompt_embeds_coordinates_verbatim() {
        let prompt = driving_prompt("Any fuel nearby?", GeoLocation::new(37.7749, -122.4194));
        assert_eq!(
            prompt,
            "You are an in-car assistant. The driver is currently at latitude 37.7749, \
             longitude -122.4194. Answer briefly and safely for someone who is driving. \
             User question: Any fuel nearby?"
        );
    }

    #[test]
    fn integral_coordinates_have_no_trailing_fraction() {
        let prompt = driving_prompt("hi", GeoLocation::new(10.0, -5.0));
        assert!(prompt.contains("latitude 10, longitude -5."));
    }

    #[test]
    fn location_mode_parses_aliases() {
        assert_eq!("maps".parse::<LocationMode>(), Ok(LocationMode::MapsGrounding));
        assert_eq!(" Prompt ".parse::<LocationMode>(), Ok(LocationMode::PromptContext));
        assert_eq!(
            "satellite".parse::<LocationMode>(),
            Err(UnknownLocationMode {
                name: "satellite".into()
            })
        );
    }
}
