pub mod content;
pub mod scenarios;
pub mod species;

pub use content::BiomeContent;
pub use species::{SpeciesInfo, StatusBadge};
