//! Async HTTP client wrapping reqwest.
//!
//! Just requests — no protocol smarts beyond retry on 5xx and backoff
//! on 429. Both remote adapters share one client so connection pools are
//! reused across units.

use crate::error::{EngineError, Result};
use serde_json::Value;
use std::time::Duration;

/// A fetched JSON document plus how many bytes it arrived as.
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub value: Value,
    pub bytes: u64,
}

/// HTTP client for the acquisition engine.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// GET a JSON document with retry on 5xx and backoff on 429.
    pub async fn get_json(&self, url: &str) -> Result<JsonResponse> {
        let mut retries = 0u32;
        let max_retries = 2;

        loop {
            let resp = self.client.get(url).send().await;

            match resp {
                Ok(r) => {
                    let status = r.status();

                    if status.is_server_error() && retries < max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status.as_u16() == 429 && retries < max_retries {
                        retries += 1;
                        let retry_after = r
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(2);
                        tokio::time::sleep(Duration::from_secs(retry_after.min(10))).await;
                        continue;
                    }

                    let r = r.error_for_status()?;
                    let body = r.bytes().await?;
                    let bytes = body.len() as u64;
                    let value: Value = serde_json::from_slice(&body)?;
                    return Ok(JsonResponse { value, bytes });
                }
                Err(e) => {
                    if retries < max_retries {
                        retries += 1;
                        let delay = Duration::from_millis(500 * 2u64.pow(retries - 1));
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(EngineError::Http(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn retries_on_5xx_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/genesis.json"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/genesis.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"1": {}})))
            .mount(&server)
            .await;

        let client = HttpClient::new(5_000);
        let resp = client
            .get_json(&format!("{}/genesis.json", server.uri()))
            .await
            .unwrap();
        assert!(resp.value.is_object());
        assert!(resp.bytes > 0);
    }

    #[tokio::test]
    async fn status_404_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new(5_000);
        let err = client
            .get_json(&format!("{}/missing.json", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Http(_)));
    }
}
