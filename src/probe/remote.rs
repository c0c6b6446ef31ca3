use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde::{Deserialize, Deserializer};

use super::Probe;
use super::result::Measurement;
use crate::config::vantage::VantagePoint;
use crate::error::{ConfigError, ProbeError};

const USER_AGENT: &str = "Mozilla/5.0 (KHTML, like Gecko) Safari/537.36";

/// Runs the test through the public load time service, which performs the
/// request from the data center named by the vantage id.
pub struct RemoteProbe {
    client: Client,
    service_url: String,
}

impl RemoteProbe {
    pub fn new(service_url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let service_url = service_url.into();
        let parsed = url::Url::parse(&service_url).map_err(|source| ConfigError::InvalidServiceUrl {
            url: service_url.clone(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        // The service only answers requests that look like they come from its own page.
        let origin = parsed.origin().ascii_serialization();
        if let Ok(value) = HeaderValue::from_str(&origin) {
            headers.insert(ORIGIN, value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{origin}/")) {
            headers.insert(REFERER, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            service_url,
        })
    }

    fn form<'a>(
        domain: &'a str,
        vantage: &'a VantagePoint,
        private: bool,
    ) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("load_time_tester", "1"),
            ("form_action", "test_load_time"),
            ("location", vantage.id.as_str()),
            ("domain", domain),
        ];

        if private {
            form.push(("is_private", "true"));
        }

        form
    }
}

impl Probe for RemoteProbe {
    async fn probe(
        &self,
        domain: &str,
        vantage: &VantagePoint,
        private: bool,
    ) -> Result<Measurement, ProbeError> {
        let http_error = |source| ProbeError::Http {
            vantage: vantage.id.clone(),
            source,
        };

        let response = self
            .client
            .post(&self.service_url)
            .form(&Self::form(domain, vantage, private))
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status {
                vantage: vantage.id.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(http_error)?;
        parse_response(&body, vantage)
    }
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    message: String,
    output: Option<ServiceOutput>,
}

#[derive(Debug, Deserialize)]
struct ServiceOutput {
    #[serde(deserialize_with = "seconds")]
    connect_time: f64,
    #[serde(deserialize_with = "seconds")]
    firstbyte_time: f64,
    #[serde(deserialize_with = "seconds")]
    total_time: f64,
}

/// The service sends timings as decimal strings, accept plain numbers too.
fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn parse_response(body: &str, vantage: &VantagePoint) -> Result<Measurement, ProbeError> {
    let data: ServiceResponse = serde_json::from_str(body).map_err(|source| ProbeError::Decode {
        vantage: vantage.id.clone(),
        source,
    })?;

    match data.output {
        Some(output) if data.status == 1 => Ok(Measurement {
            connect_time: output.connect_time,
            first_byte_time: output.firstbyte_time,
            total_time: output.total_time,
        }),
        _ => Err(ProbeError::Rejected {
            vantage: vantage.id.clone(),
            message: if data.message.is_empty() {
                "no result".to_string()
            } else {
                data.message
            },
        }),
    }
}
