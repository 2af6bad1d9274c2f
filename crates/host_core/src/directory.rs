use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{PresentationId, SlideId},
    protocol::{PresentationSlides, SlideDetail},
};

/// Request/response data access for presentations and slides. Fetches
/// happen once per presentation load or slide entry, never per vote event.
#[async_trait]
pub trait SlideDirectory: Send + Sync {
    async fn fetch_slide_sequence(
        &self,
        presentation_id: PresentationId,
    ) -> Result<PresentationSlides>;

    async fn fetch_slide_detail(&self, slide_id: SlideId) -> Result<SlideDetail>;
}

pub struct MissingSlideDirectory;

#[async_trait]
impl SlideDirectory for MissingSlideDirectory {
    async fn fetch_slide_sequence(
        &self,
        presentation_id: PresentationId,
    ) -> Result<PresentationSlides> {
        Err(anyhow!(
            "slide directory unavailable for presentation {}",
            presentation_id.0
        ))
    }

    async fn fetch_slide_detail(&self, slide_id: SlideId) -> Result<SlideDetail> {
        Err(anyhow!(
            "slide directory unavailable for slide {}",
            slide_id.0
        ))
    }
}

/// HTTP adapter over the presentation service.
pub struct HttpSlideDirectory {
    http: Client,
    server_url: String,
}

impl HttpSlideDirectory {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }
}

#[async_trait]
impl SlideDirectory for HttpSlideDirectory {
    async fn fetch_slide_sequence(
        &self,
        presentation_id: PresentationId,
    ) -> Result<PresentationSlides> {
        let slides: PresentationSlides = self
            .http
            .get(format!(
                "{}/presentations/{}/slides",
                self.server_url, presentation_id.0
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(slides)
    }

    async fn fetch_slide_detail(&self, slide_id: SlideId) -> Result<SlideDetail> {
        let detail: SlideDetail = self
            .http
            .get(format!("{}/slides/{}/host", self.server_url, slide_id.0))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(detail)
    }
}

#[cfg(test)]
#[path = "tests/directory_tests.rs"]
mod tests;
