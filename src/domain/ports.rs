use crate::domain::model::{DocumentKind, RawPayload, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// 檔案路徑、http(s) URL 或 `-`
    fn source(&self) -> &str;
    fn output_path(&self) -> &str;
    fn document_kind(&self) -> DocumentKind;
    fn output_formats(&self) -> &[String];
    fn output_file(&self) -> &str;
    /// 啟用壓縮時的 zip 檔名
    fn archive_name(&self) -> Option<&str>;
    fn request_timeout_seconds(&self) -> u64 {
        30
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawPayload>;
    async fn transform(&self, payload: RawPayload) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
