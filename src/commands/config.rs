use anyhow::{Result, bail};
use log::debug;
use std::time::Duration;

use crate::{
    client::SensiboClient,
    config::ClientConfig,
    credential::{ApiKey, CredentialPlacement},
};

/// Settings gathered from the command line and environment.
pub struct Config {
    pub api_key: ApiKey,
    pub client: ClientConfig,
}

impl Config {
    pub fn new(
        api_key: Option<String>,
        api_url: Option<String>,
        timeout_secs: Option<u64>,
        query_auth: bool,
    ) -> Result<Self> {
        let api_key = match api_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => ApiKey::new(key.trim()),
            None => bail!("No API key given. Set SENSIBO_API_KEY or pass --api-key."),
        };
        debug!("Using API key {}", api_key.masked());

        let mut client = ClientConfig::default();
        if let Some(url) = api_url {
            client = client.with_base_url(url);
        }
        if let Some(secs) = timeout_secs {
            client = client.with_timeout(Duration::from_secs(secs));
        }
        if query_auth {
            client = client.with_credential_placement(CredentialPlacement::Query);
        }

        Ok(Self { api_key, client })
    }

    /// Builds the cloud client these settings describe.
    pub fn build(&self) -> Result<SensiboClient> {
        Ok(SensiboClient::new(self.api_key.clone(), &self.client)?)
    }
}
