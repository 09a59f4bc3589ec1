use crate::fetch::FetchError;
use crate::fetch::ResourceSource;
use crate::metrics::Metrics;
use crate::resources;
use crate::resources::DecodeError;
use crate::resources::ResourceSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("error fetching resources from device: {0}")]
    Fetch(#[from] FetchError),

    #[error("error decoding device payload: {0}")]
    Decode(#[from] DecodeError),
}

/// Run one fetch, decode and publish cycle against `metrics`.
///
/// On failure nothing is published and `scrape_success` drops to 0; series
/// from earlier cycles stay as they were.
#[tracing::instrument(skip_all)]
pub async fn scrape(
    source: &dyn ResourceSource,
    metrics: &Metrics,
) -> Result<ResourceSnapshot, ScrapeError> {
    let result = fetch_and_decode(source).await;

    match &result {
        Ok(snapshot) => {
            metrics.publish(snapshot);
            metrics.record_scrape(true);
            tracing::info!(
                pumps = snapshot.pumps.len(),
                sensors = snapshot.sensors.len(),
                "Published device resources"
            );
            tracing::debug!("Device resources:\n{}", snapshot);
        }
        Err(e) => {
            metrics.record_scrape(false);
            tracing::warn!(error = %e, "Scrape failed");
        }
    }

    result
}

async fn fetch_and_decode(source: &dyn ResourceSource) -> Result<ResourceSnapshot, ScrapeError> {
    let body = source.fetch().await?;
    Ok(resources::decode(&body)?)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;

    /// Mock source returning a canned body, or a status error when empty
    struct CannedSource(Option<&'static str>);

    #[async_trait]
    impl ResourceSource for CannedSource {
        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            match self.0 {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(FetchError::Status {
                    url: "http://device/allResources".to_string(),
                    status: StatusCode::BAD_GATEWAY,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_scrape_publishes_snapshot() {
        let metrics = Metrics::new().unwrap();
        let source = CannedSource(Some(r#"{"pS":[{"i":0,"s":true},{"i":1}],"mS":[]}"#));

        let snapshot = scrape(&source, &metrics).await.unwrap();

        assert_eq!(snapshot.pumps.len(), 2);
        let text = metrics.render().unwrap();
        assert!(text.contains("pump_state{pump=\"0\"} 1"));
        assert!(text.contains("pump_state{pump=\"1\"} 0"));
        assert!(text.contains("scrape_success 1"));
    }

    #[tokio::test]
    async fn test_scrape_fetch_failure_keeps_previous_values() {
        let metrics = Metrics::new().unwrap();
        scrape(&CannedSource(Some(r#"{"pS":[{"i":4,"s":true}]}"#)), &metrics)
            .await
            .unwrap();

        let err = scrape(&CannedSource(None), &metrics).await.unwrap_err();

        assert!(matches!(err, ScrapeError::Fetch(_)));
        assert!(err.to_string().starts_with("error fetching resources"));
        let text = metrics.render().unwrap();
        assert!(text.contains("pump_state{pump=\"4\"} 1"));
        assert!(text.contains("scrape_success 0"));
    }

    #[tokio::test]
    async fn test_scrape_decode_failure() {
        let metrics = Metrics::new().unwrap();

        let err = scrape(&CannedSource(Some("{\"pS\": [")), &metrics)
            .await
            .unwrap_err();

        assert!(matches!(err, ScrapeError::Decode(_)));
        let text = metrics.render().unwrap();
        assert!(!text.contains("pump_state"));
        assert!(text.contains("scrape_success 0"));
    }
}
