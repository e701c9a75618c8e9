pub mod decode;
pub mod etl;
pub mod pipeline;
pub mod report;
pub mod schema;

pub use crate::domain::model::{RawPayload, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
