//! Twilio Elastic SIP Trunking REST client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use trunkline_types::{NewOriginationUrl, OriginationUrl, Trunk};

use crate::TelephonyError;

const BASE_URL: &str = "https://trunking.twilio.com/v1";

/// The trunk and origination URL operations the reconciler needs.
///
/// A seam for tests: the reconciler is generic over this trait so its
/// execution counts can be asserted against a recording fake.
#[async_trait]
pub trait TrunkingApi: Send + Sync {
    async fn list_trunks(&self) -> Result<Vec<Trunk>, TelephonyError>;
    async fn create_trunk(
        &self,
        friendly_name: &str,
        domain_name: &str,
    ) -> Result<Trunk, TelephonyError>;
    async fn delete_trunk(&self, trunk_sid: &str) -> Result<(), TelephonyError>;
    async fn list_origination_urls(
        &self,
        trunk_sid: &str,
    ) -> Result<Vec<OriginationUrl>, TelephonyError>;
    async fn create_origination_url(
        &self,
        trunk_sid: &str,
        url: &NewOriginationUrl,
    ) -> Result<OriginationUrl, TelephonyError>;
    async fn update_origination_url(
        &self,
        trunk_sid: &str,
        url_sid: &str,
        sip_url: &str,
    ) -> Result<OriginationUrl, TelephonyError>;
}

/// REST client authenticated with the account SID and auth token.
#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

#[derive(Deserialize)]
struct TrunkPage {
    trunks: Vec<Trunk>,
}

#[derive(Deserialize)]
struct OriginationUrlPage {
    origination_urls: Vec<OriginationUrl>,
}

impl TwilioClient {
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Points the client at a different API base. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get<R: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<R, TelephonyError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_form<R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<R, TelephonyError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<R: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<R, TelephonyError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TrunkingApi for TwilioClient {
    async fn list_trunks(&self) -> Result<Vec<Trunk>, TelephonyError> {
        let page: TrunkPage = self.get("/Trunks").await?;
        Ok(page.trunks)
    }

    async fn create_trunk(
        &self,
        friendly_name: &str,
        domain_name: &str,
    ) -> Result<Trunk, TelephonyError> {
        self.post_form(
            "/Trunks",
            &[
                ("FriendlyName", friendly_name.to_string()),
                ("DomainName", domain_name.to_string()),
            ],
        )
        .await
    }

    async fn delete_trunk(&self, trunk_sid: &str) -> Result<(), TelephonyError> {
        let response = self
            .client
            .delete(format!("{}/Trunks/{}", self.base_url, trunk_sid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    async fn list_origination_urls(
        &self,
        trunk_sid: &str,
    ) -> Result<Vec<OriginationUrl>, TelephonyError> {
        let page: OriginationUrlPage = self
            .get(&format!("/Trunks/{}/OriginationUrls", trunk_sid))
            .await?;
        Ok(page.origination_urls)
    }

    async fn create_origination_url(
        &self,
        trunk_sid: &str,
        url: &NewOriginationUrl,
    ) -> Result<OriginationUrl, TelephonyError> {
        self.post_form(
            &format!("/Trunks/{}/OriginationUrls", trunk_sid),
            &[
                ("FriendlyName", url.friendly_name.clone()),
                ("SipUrl", url.sip_url.clone()),
                ("Weight", url.weight.to_string()),
                ("Priority", url.priority.to_string()),
                ("Enabled", url.enabled.to_string()),
            ],
        )
        .await
    }

    async fn update_origination_url(
        &self,
        trunk_sid: &str,
        url_sid: &str,
        sip_url: &str,
    ) -> Result<OriginationUrl, TelephonyError> {
        self.post_form(
            &format!("/Trunks/{}/OriginationUrls/{}", trunk_sid, url_sid),
            &[("SipUrl", sip_url.to_string())],
        )
        .await
    }
}
