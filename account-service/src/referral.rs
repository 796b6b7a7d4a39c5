//! Referral service collaborator
//!
//! Referral codes live in a separate service. Calls to it never take part in
//! ledger transactions: a failed request is logged and parked in a
//! [`ReferralBacklog`] from which it can be replayed later.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Referral code issued for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub referral_code: String,
}

/// Client for the referral service
#[async_trait]
pub trait ReferralClient: Send + Sync {
    /// Issue a referral code for a user
    async fn create_referral(&self, user_id: Uuid) -> Result<Referral>;

    /// Redeem a referral code on behalf of a user
    async fn use_referral(&self, referral_code: &str, user_id: Uuid) -> Result<()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateReferralRequest {
    user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UseReferralRequest<'a> {
    referral_code: &'a str,
    user_id: String,
}

/// JSON-over-HTTP referral client
pub struct HttpReferralClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpReferralClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/rpc/{}", self.base_url, method)
    }

    async fn post<B: Serialize + Sync>(&self, method: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(self.endpoint(method))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Unavailable(format!("referral service: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!(
                "referral service {} returned {}",
                method,
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ReferralClient for HttpReferralClient {
    async fn create_referral(&self, user_id: Uuid) -> Result<Referral> {
        let body = CreateReferralRequest { user_id: user_id.to_string() };
        self.post("CreateReferral", &body)
            .await?
            .json::<Referral>()
            .await
            .map_err(|e| Error::Internal(format!("invalid referral response: {}", e)))
    }

    async fn use_referral(&self, referral_code: &str, user_id: Uuid) -> Result<()> {
        let body = UseReferralRequest { referral_code, user_id: user_id.to_string() };
        self.post("UseReferral", &body).await?;
        Ok(())
    }
}

/// Users whose referral code could not be issued yet
#[derive(Default)]
pub struct ReferralBacklog {
    pending: Mutex<Vec<Uuid>>,
}

impl ReferralBacklog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, user_id: Uuid) {
        let mut pending = self.pending.lock().await;
        if !pending.contains(&user_id) {
            pending.push(user_id);
        }
    }

    pub async fn pending(&self) -> Vec<Uuid> {
        self.pending.lock().await.clone()
    }

    /// Retry every parked user; returns how many succeeded
    pub async fn replay(&self, client: &dyn ReferralClient) -> usize {
        let parked = std::mem::take(&mut *self.pending.lock().await);
        let mut replayed = 0;

        for user_id in parked {
            match client.create_referral(user_id).await {
                Ok(_) => replayed += 1,
                Err(e) => {
                    warn!("Referral replay for user {} failed: {}", user_id, e);
                    self.record(user_id).await;
                }
            }
        }
        replayed
    }
}

/// Fire-and-forget referral issuance after provisioning
#[derive(Clone)]
pub struct ReferralNotifier {
    client: Arc<dyn ReferralClient>,
    backlog: Arc<ReferralBacklog>,
}

impl ReferralNotifier {
    pub fn new(client: Arc<dyn ReferralClient>) -> Self {
        Self {
            client,
            backlog: Arc::new(ReferralBacklog::new()),
        }
    }

    pub fn backlog(&self) -> &Arc<ReferralBacklog> {
        &self.backlog
    }

    pub fn client(&self) -> &Arc<dyn ReferralClient> {
        &self.client
    }

    /// Retry the backlog every `every` until the runtime shuts down
    pub fn spawn_replay(&self, every: Duration) -> JoinHandle<()> {
        let client = self.client.clone();
        let backlog = self.backlog.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if backlog.pending().await.is_empty() {
                    continue;
                }
                let replayed = backlog.replay(client.as_ref()).await;
                info!("Replayed {} parked referral requests", replayed);
            }
        })
    }

    /// Request a referral code without blocking the caller
    pub fn user_created(&self, user_id: Uuid) -> JoinHandle<()> {
        let client = self.client.clone();
        let backlog = self.backlog.clone();

        tokio::spawn(async move {
            match client.create_referral(user_id).await {
                Ok(referral) => info!("Issued referral code {} for user {}", referral.referral_code, user_id),
                Err(e) => {
                    warn!("Referral issuance for user {} failed, parked for replay: {}", user_id, e);
                    backlog.record(user_id).await;
                }
            }
        })
    }
}
