use async_trait::async_trait;
use board::{Referral, ReferralDraft, ReferralStore, StoreError, VoteCounts};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

/// Talks to the referral store service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base: Url,
}

impl HttpStore {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }

        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        let url = self.base.join(path).map_err(unavailable)?;
        debug!(%url, "Store request");

        Ok(url)
    }
}

#[async_trait]
impl ReferralStore for HttpStore {
    async fn list(&self) -> Result<Vec<Referral>, StoreError> {
        let response = self
            .client
            .get(self.url("referrals")?)
            .send()
            .await
            .map_err(unavailable)?;

        check(response, None)?.json().await.map_err(unavailable)
    }

    async fn create(&self, draft: ReferralDraft) -> Result<Referral, StoreError> {
        let response = self
            .client
            .post(self.url("referrals")?)
            .json(&draft)
            .send()
            .await
            .map_err(unavailable)?;

        check(response, None)?.json().await.map_err(unavailable)
    }

    async fn set_votes(&self, id: &str, upvotes: u32, downvotes: u32) -> Result<(), StoreError> {
        let response = self
            .client
            .put(self.url(&format!("referrals/{id}/votes"))?)
            .json(&VoteCounts { upvotes, downvotes })
            .send()
            .await
            .map_err(unavailable)?;

        check(response, Some(id))?;
        Ok(())
    }
}

fn check(response: Response, id: Option<&str>) -> Result<Response, StoreError> {
    match (response.status(), id) {
        (status, _) if status.is_success() => Ok(response),
        (StatusCode::NOT_FOUND, Some(id)) => Err(StoreError::NotFound(id.to_string())),
        (status, _) => Err(StoreError::Unavailable(format!("store responded {status}"))),
    }
}

fn unavailable(e: impl ToString) -> StoreError {
    StoreError::Unavailable(e.to_string())
}
