pub mod cli;
pub mod toml_config;

pub const ARCHIVE_NAME: &str = "keiba_output.zip";
pub const OUTPUT_FORMATS: [&str; 2] = ["json", "csv"];

#[cfg(feature = "cli")]
pub use self::cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use super::{ARCHIVE_NAME, OUTPUT_FORMATS};
    use crate::core::ConfigProvider;
    use crate::domain::model::DocumentKind;
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_file_name, validate_formats, validate_path, validate_positive_number,
        validate_source, Validate,
    };
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "keiba-etl")]
    #[command(about = "Decode race-card JSON into typed races, horses and results")]
    pub struct CliConfig {
        /// File path, http(s) URL, or `-` for stdin
        #[arg(long, short)]
        pub source: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_enum, default_value_t = DocumentKind::Auto)]
        pub kind: DocumentKind,

        #[arg(long, value_delimiter = ',', default_value = "json,csv")]
        pub formats: Vec<String>,

        #[arg(long, default_value = "output.json")]
        pub output_file: String,

        #[arg(long, help = "Bundle all outputs into a zip archive")]
        pub zip: bool,

        #[arg(long, default_value = "30")]
        pub timeout_seconds: u64,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    impl ConfigProvider for CliConfig {
        fn source(&self) -> &str {
            &self.source
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn document_kind(&self) -> DocumentKind {
            self.kind
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn output_file(&self) -> &str {
            &self.output_file
        }

        fn archive_name(&self) -> Option<&str> {
            self.zip.then_some(ARCHIVE_NAME)
        }

        fn request_timeout_seconds(&self) -> u64 {
            self.timeout_seconds
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_source("source", &self.source)?;
            validate_path("output_path", &self.output_path)?;
            validate_formats("formats", &self.formats, &OUTPUT_FORMATS)?;
            validate_file_name("output_file", &self.output_file)?;
            validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;
            Ok(())
        }
    }

}
