use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting race data ETL...");

        // Extract
        let payload = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} bytes from {}", payload.text.len(), payload.source);

        // Transform
        let result = self.pipeline.transform(payload).await?;
        tracing::info!(
            "🔄 Decoded {} document: {} races, {} horses, {} results",
            result.document.kind(),
            result.document.race_count(),
            result.document.horse_count(),
            result.document.result_count()
        );
        if !result.warnings.is_empty() {
            tracing::warn!("⚠️ {} consistency warnings", result.warnings.len());
        }

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(output_path)
    }
}
