use super::DataSource;
use crate::error::{EcgError, Result};

use log::debug;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

pub const ECG_DATA_ROUTE: &str = "/getECGData";

/// Polls `GET http://{host}/getECGData` for a JSON array of samples.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EcgError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("http://{}{}", host, ECG_DATA_ROUTE),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl DataSource for HttpSource {
    fn fetch(&mut self) -> Result<Vec<f64>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| EcgError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::BAD_REQUEST => return Err(EcgError::BadRequest),
            status if !status.is_success() => {
                return Err(EcgError::Network(format!(
                    "{} answered HTTP {}",
                    self.url, status
                )))
            }
            _ => {}
        }

        let samples: Vec<f64> = response
            .json()
            .map_err(|e| EcgError::Network(format!("undecodable payload: {}", e)))?;

        debug!("fetched {} samples from {}", samples.len(), self.url);
        Ok(samples)
    }
}
