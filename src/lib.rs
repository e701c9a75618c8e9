pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::decode::{decode, decode_optional, decode_str, decode_value, Decode, FieldPath};
pub use crate::core::schema::decode_document;
pub use crate::core::{etl::EtlEngine, pipeline::RacePipeline};
pub use crate::domain::model::{
    CourseAptitude, DistanceAptitude, Document, DocumentKind, FinishPosition, HeavyTrackAptitude,
    Horse, Race, RaceResult, RunningStyle, TrackCondition,
};
pub use crate::utils::error::{EtlError, Result};
