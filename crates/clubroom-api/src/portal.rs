use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

/// The university portal, treated as an identity oracle: given portal
/// credentials it either confirms membership and yields a display name or
/// rejects. Its wire protocol is not our concern beyond this trait.
#[async_trait]
pub trait PortalVerifier: Send + Sync {
    /// `Ok(Some(name))` on success, `Ok(None)` when the portal rejects the
    /// credentials, `Err` when the portal itself is unreachable.
    async fn verify(&self, portal_id: &str, portal_pw: &str) -> Result<Option<String>>;
}

pub struct HttpPortal {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPortal {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[derive(Deserialize)]
struct PortalResponse {
    name: String,
}

#[async_trait]
impl PortalVerifier for HttpPortal {
    async fn verify(&self, portal_id: &str, portal_pw: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .form(&[("id", portal_id), ("pw", portal_pw)])
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("portal rejected credentials for {}", portal_id);
            return Ok(None);
        }

        let body: PortalResponse = response.json().await?;
        Ok(Some(body.name))
    }
}
