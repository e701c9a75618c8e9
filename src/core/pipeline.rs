use crate::core::report::{horses_table, results_table};
use crate::core::schema::decode_document;
use crate::core::{ConfigProvider, Pipeline, RawPayload, Storage, TransformResult};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const HORSES_CSV: &str = "horses.csv";
pub const RESULTS_CSV: &str = "results.csv";

pub struct RacePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> RacePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }

    fn wants(&self, format: &str) -> bool {
        self.config.output_formats().iter().any(|f| f == format)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching race data from: {}", url);
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.config.request_timeout_seconds()))
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Source response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    fn output_location(&self, file_name: &str) -> String {
        Path::new(self.config.output_path())
            .join(file_name)
            .display()
            .to_string()
    }
}

fn is_http(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for RacePipeline<S, C> {
    async fn extract(&self) -> Result<RawPayload> {
        let source = self.config.source();

        let text = if is_http(source) {
            self.fetch(source).await?
        } else if source == "-" {
            tracing::debug!("Reading race data from stdin");
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        } else {
            tracing::debug!("Reading race data from file: {}", source);
            tokio::fs::read_to_string(source).await?
        };

        tracing::debug!("Extracted {} bytes", text.len());
        Ok(RawPayload {
            source: source.to_string(),
            text,
        })
    }

    async fn transform(&self, payload: RawPayload) -> Result<TransformResult> {
        let value: serde_json::Value = serde_json::from_str(&payload.text)?;
        let document = decode_document(&value, self.config.document_kind())?;
        tracing::debug!(
            "Decoded {} document from {} ({} races, {} horses, {} results)",
            document.kind(),
            payload.source,
            document.race_count(),
            document.horse_count(),
            document.result_count()
        );

        // 欄位不一致只記錄，不中斷
        let mut warnings = Vec::new();
        for (_, horse) in document.horses() {
            for issue in horse.inconsistencies() {
                tracing::warn!("⚠️ {}: {}", horse.name, issue);
                warnings.push(format!("{}: {}", horse.name, issue));
            }
        }

        Ok(TransformResult {
            horses_csv: horses_table(&document)?,
            results_csv: results_table(&document)?,
            document,
            warnings,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let mut files: Vec<(String, Vec<u8>)> = Vec::new();

        if self.wants("json") {
            let json = serde_json::to_string_pretty(&result.document)?;
            files.push((self.config.output_file().to_string(), json.into_bytes()));
        }
        if self.wants("csv") {
            files.push((HORSES_CSV.to_string(), result.horses_csv.into_bytes()));
            files.push((RESULTS_CSV.to_string(), result.results_csv.into_bytes()));
        }

        if let Some(archive_name) = self.config.archive_name() {
            tracing::debug!("Creating ZIP file with {} files", files.len());

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
                for (name, data) in &files {
                    zip.start_file(name.as_str(), SimpleFileOptions::default())?;
                    zip.write_all(data)?;
                }
                zip.finish()?.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(archive_name, &zip_data).await?;
            return Ok(self.output_location(archive_name));
        }

        for (name, data) in &files {
            tracing::debug!("Writing {} ({} bytes) to storage", name, data.len());
            self.storage.write_file(name, data).await?;
        }

        let primary = files
            .first()
            .map(|(name, _)| name.as_str())
            .ok_or_else(|| EtlError::ConfigError {
                message: "no output format selected".to_string(),
            })?;
        Ok(self.output_location(primary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decode::decode_str;
    use crate::domain::model::{Document, DocumentKind, FinishPosition};
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        source: String,
        output_path: String,
        kind: DocumentKind,
        formats: Vec<String>,
        archive: Option<String>,
    }

    impl MockConfig {
        fn new(source: String) -> Self {
            Self {
                source,
                output_path: "test_output".to_string(),
                kind: DocumentKind::Auto,
                formats: vec!["json".to_string(), "csv".to_string()],
                archive: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
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
            "output.json"
        }

        fn archive_name(&self) -> Option<&str> {
            self.archive.as_deref()
        }
    }

    fn race_json() -> serde_json::Value {
        serde_json::json!({
            "name": "東京大賞典",
            "racetrack": "大井",
            "distance": "ダ2000m",
            "horses": [
                {
                    "name": "ウシュバテソーロ",
                    "play_game_count": 20,
                    "win": 7,
                    "lose": 13,
                    "course_aptitude": "ダート",
                    "distance_aptitude": "ステイヤー",
                    "running_style": "追い込み",
                    "heavy_racetrack": "得意",
                    "results": [
                        {
                            "date": "2022-11-26T00:00:00+09:00",
                            "raceName": "ブラジルC",
                            "result": 1,
                            "distance": "ダ2100",
                            "baba": "良",
                            "time": "2:09.4"
                        }
                    ]
                },
                {
                    "name": "ノットゥルノ",
                    "play_game_count": 9,
                    "win": 3,
                    "lose": 5,
                    "results": []
                }
            ]
        })
    }

    fn payload(value: &serde_json::Value) -> RawPayload {
        RawPayload {
            source: "test".to_string(),
            text: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_extract_from_http_source() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/race");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(race_json());
            })
            .await;

        let pipeline = RacePipeline::new(MockStorage::new(), MockConfig::new(server.url("/race")));
        let payload = pipeline.extract().await.unwrap();

        api_mock.assert_async().await;
        assert!(payload.text.contains("東京大賞典"));
    }

    #[tokio::test]
    async fn test_extract_http_failure_is_error() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/race");
                then.status(500);
            })
            .await;

        let pipeline = RacePipeline::new(MockStorage::new(), MockConfig::new(server.url("/race")));
        let err = pipeline.extract().await.unwrap_err();

        api_mock.assert_async().await;
        assert!(matches!(err, EtlError::HttpStatusError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_extract_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), race_json().to_string()).unwrap();

        let source = file.path().to_str().unwrap().to_string();
        let pipeline = RacePipeline::new(MockStorage::new(), MockConfig::new(source.clone()));
        let payload = pipeline.extract().await.unwrap();

        assert_eq!(payload.source, source);
        assert!(payload.text.contains("ウシュバテソーロ"));
    }

    #[tokio::test]
    async fn test_extract_missing_file_is_io_error() {
        let pipeline = RacePipeline::new(
            MockStorage::new(),
            MockConfig::new("/nonexistent/race.json".to_string()),
        );
        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_decodes_race() {
        let pipeline = RacePipeline::new(MockStorage::new(), MockConfig::new("-".to_string()));
        let result = pipeline.transform(payload(&race_json())).await.unwrap();

        let Document::Race(race) = &result.document else {
            panic!("expected a race document");
        };
        assert_eq!(race.horses.len(), 2);
        assert_eq!(race.horses[0].results[0].result, FinishPosition::Placed(1));
        assert_eq!(result.horses_csv.lines().count(), 3);
        assert_eq!(result.results_csv.lines().count(), 2);

        // ノットゥルノ: 3 + 5 != 9
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("ノットゥルノ"));
    }

    #[tokio::test]
    async fn test_transform_reports_field_path() {
        let mut value = race_json();
        value["horses"][1]["win"] = serde_json::json!("three");

        let pipeline = RacePipeline::new(MockStorage::new(), MockConfig::new("-".to_string()));
        let err = pipeline.transform(payload(&value)).await.unwrap_err();
        assert_eq!(err.field_path(), Some("horses[1].win"));
    }

    #[tokio::test]
    async fn test_transform_rejects_malformed_json() {
        let pipeline = RacePipeline::new(MockStorage::new(), MockConfig::new("-".to_string()));
        let err = pipeline
            .transform(RawPayload {
                source: "test".to_string(),
                text: "{\"name\": ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_load_writes_json_and_csv() {
        let storage = MockStorage::new();
        let pipeline = RacePipeline::new(storage.clone(), MockConfig::new("-".to_string()));

        let result = pipeline.transform(payload(&race_json())).await.unwrap();
        let expected = result.document.clone();
        let output = pipeline.load(result).await.unwrap();

        assert!(output.ends_with("output.json"));
        let json = storage.get_file("output.json").await.unwrap();
        let reloaded: Document = decode_str(std::str::from_utf8(&json).unwrap()).unwrap();
        assert_eq!(reloaded, expected);

        assert!(storage.get_file(HORSES_CSV).await.is_some());
        assert!(storage.get_file(RESULTS_CSV).await.is_some());
    }

    #[tokio::test]
    async fn test_load_keeps_empty_race_list_kind() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new("-".to_string());
        config.kind = DocumentKind::Races;
        config.formats = vec!["json".to_string()];
        let pipeline = RacePipeline::new(storage.clone(), config);

        let result = pipeline.transform(payload(&serde_json::json!([]))).await.unwrap();
        assert_eq!(result.document, Document::Races(Vec::new()));
        pipeline.load(result).await.unwrap();

        let json = storage.get_file("output.json").await.unwrap();
        let reloaded: Document = decode_str(std::str::from_utf8(&json).unwrap()).unwrap();
        assert_eq!(reloaded, Document::Races(Vec::new()));
    }

    #[tokio::test]
    async fn test_load_json_uses_two_space_indent() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new("-".to_string());
        config.formats = vec!["json".to_string()];
        let pipeline = RacePipeline::new(storage.clone(), config);

        let result = pipeline.transform(payload(&race_json())).await.unwrap();
        pipeline.load(result).await.unwrap();

        let json = String::from_utf8(storage.get_file("output.json").await.unwrap()).unwrap();
        assert!(json.starts_with("{\n  \"name\": \"東京大賞典\""));
        assert!(storage.get_file(HORSES_CSV).await.is_none());
    }

    #[tokio::test]
    async fn test_load_bundles_zip() {
        let storage = MockStorage::new();
        let mut config = MockConfig::new("-".to_string());
        config.archive = Some("keiba_output.zip".to_string());
        let pipeline = RacePipeline::new(storage.clone(), config);

        let result = pipeline.transform(payload(&race_json())).await.unwrap();
        let output = pipeline.load(result).await.unwrap();
        assert!(output.ends_with("keiba_output.zip"));
        assert!(storage.get_file("output.json").await.is_none());

        let zip_data = storage.get_file("keiba_output.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 3);

        let mut csv = String::new();
        archive
            .by_name(RESULTS_CSV)
            .unwrap()
            .read_to_string(&mut csv)
            .unwrap();
        assert!(csv.contains("ブラジルC"));
    }
}
