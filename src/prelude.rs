//! # Prelude for the gemini-drive-assistant crate
//!
//! Re-exports the most commonly used types:
//!
//! ```rust,ignore
//! use gemini_drive_assistant::prelude::*;
//! ```

pub use crate::assistant::{
    Assistant, AssistantConfig, ContentGenerator, GeoLocation, LocationMode,
};
pub use crate::client::{Error as ClientError, Gemini};
pub use crate::generation::{ContentBuilder, GenerationConfig, GenerationResponse};
pub use crate::models::{Content, Message, Part, Role};
pub use crate::tools::{LatLng, Tool, ToolConfig};
