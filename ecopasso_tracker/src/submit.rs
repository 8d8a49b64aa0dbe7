use async_trait::async_trait;
use ecopasso_lib::trip_record::TripRecord;

use crate::{config::TrackerConfig, error::TrackerError};

/// Seam between the session machinery and the remote backend, so the
/// tracker can be driven against a scripted submitter in tests.
#[async_trait]
pub trait TripSubmitter: Send + Sync {
    async fn submit(&self, record: &TripRecord) -> Result<(), TrackerError>;
}

/// Submits finalized trips to the EcoPasso backend as a bearer-token
/// authenticated JSON POST.
pub struct HttpSubmitter {
    client: reqwest::Client,
    url: String,
    api_token: String,
}

impl HttpSubmitter {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}/activities", config.server_url.trim_end_matches('/')),
            api_token: config.api_token.clone(),
        }
    }
}

#[async_trait]
impl TripSubmitter for HttpSubmitter {
    async fn submit(&self, record: &TripRecord) -> Result<(), TrackerError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(record)
            .send()
            .await
            .map_err(|err| TrackerError::Submission(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TrackerError::Submission(format!(
                "server returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, time::Duration};

    #[test]
    fn endpoint_url_has_no_double_slash() {
        let config = TrackerConfig {
            server_url: "https://ecopasso.example.org/".into(),
            api_token: "token".into(),
            pending_path: PathBuf::from("data/unsent_trips.json"),
            idle_timeout: Duration::from_secs(300),
            tick_interval: Duration::from_secs(60),
            min_fix_distance_m: 10,
            min_fix_interval: Duration::from_secs(5),
        };

        let submitter = HttpSubmitter::new(&config);
        assert_eq!(submitter.url, "https://ecopasso.example.org/activities");
    }
}
