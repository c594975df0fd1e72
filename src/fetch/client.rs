use async_trait::async_trait;
use reqwest::{Request, Response};

/// Seam between the pipeline and the HTTP stack, mockable in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
