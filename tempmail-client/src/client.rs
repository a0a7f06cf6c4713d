// tempmail-client/src/client.rs
use crate::error::{MailboxError, Result};
use crate::generator::{random_local_part, random_password};
use crate::http::HttpClient;
use crate::types::{
    Credentials, DomainRecord, MailboxAccount, MailboxApiConfig, MessageDetail,
    MessageDetailRecord, MessageRecord, MessageSummary, TokenResponse,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Statuses a provider answers with when the address is already registered
const ALREADY_EXISTS: [u16; 2] = [409, 422];

pub struct MailboxClient<C: HttpClient> {
    http: C,
    api: MailboxApiConfig,
}

impl<C: HttpClient> MailboxClient<C> {
    pub fn new(http: C, api: MailboxApiConfig) -> Self {
        Self { http, api }
    }

    pub fn api(&self) -> &MailboxApiConfig {
        &self.api
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api.base_url.trim_end_matches('/'), path)
    }

    /// Pull the list out of the configured response envelope
    fn collection<T: DeserializeOwned>(&self, body: &[u8]) -> Result<Vec<T>> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        let key = self.api.collection_key.as_str();

        let list = if key.is_empty() {
            value
        } else {
            value
                .get(key)
                .cloned()
                .ok_or_else(|| MailboxError::malformed(format!("missing '{}'", key)))?
        };

        if !list.is_array() {
            return Err(MailboxError::malformed("collection is not a list"));
        }

        Ok(serde_json::from_value(list)?)
    }

    /// List the domains new accounts can be created under
    pub async fn list_domains(&self) -> Result<Vec<String>> {
        let body = self.http.get(&self.url(&self.api.domains_path), None).await?;
        let domains: Vec<DomainRecord> = self.collection(&body)?;

        Ok(domains
            .into_iter()
            .filter(|d| d.is_active)
            .map(|d| d.domain)
            .collect())
    }

    /// Register a new disposable account and obtain its token.
    ///
    /// Missing parts are generated. An "already exists" answer from the
    /// provider is not an error; the token request decides whether the
    /// credentials are usable.
    pub async fn create_account(
        &self,
        local_part: Option<&str>,
        password: Option<&str>,
    ) -> Result<MailboxAccount> {
        let local_part = match local_part {
            Some(local) => {
                let local = local.trim().to_lowercase();
                if local.is_empty() {
                    return Err(MailboxError::InvalidInput(
                        "username must not be empty".to_string(),
                    ));
                }
                local
            }
            None => random_local_part(),
        };

        let domains = self.list_domains().await?;
        let domain = domains
            .first()
            .ok_or_else(|| MailboxError::Service("no domains available".to_string()))?;

        let password = match password {
            Some(password) => password.to_string(),
            None => random_password(),
        };
        let address = format!("{}@{}", local_part, domain);

        let body = serde_json::to_vec(&Credentials {
            address: &address,
            password: &password,
        })?;

        match self
            .http
            .post_json(&self.url(&self.api.accounts_path), body, None)
            .await
        {
            Ok(_) => debug!(%address, "account registered"),
            Err(e) if e.status.is_some_and(|s| ALREADY_EXISTS.contains(&s)) => {
                debug!(%address, "account already exists, continuing to token request");
            }
            Err(e) => return Err(e.into()),
        }

        let (token, id) = self.request_token(&address, &password).await?;
        info!(%address, "disposable account ready");

        Ok(MailboxAccount {
            address,
            password,
            token,
            id,
        })
    }

    /// Exchange address and password for a bearer token
    pub async fn request_token(
        &self,
        address: &str,
        password: &str,
    ) -> Result<(String, Option<String>)> {
        let body = serde_json::to_vec(&Credentials { address, password })?;

        let resp = self
            .http
            .post_json(&self.url(&self.api.token_path), body, None)
            .await
            .map_err(|e| match e.status {
                Some(_) => MailboxError::Auth(format!("token request rejected: {}", e)),
                None => MailboxError::Service(e.to_string()),
            })?;

        let token: TokenResponse = serde_json::from_slice(&resp)?;
        match token.token {
            Some(t) if !t.is_empty() => Ok((t, token.id)),
            _ => Err(MailboxError::Auth(
                "token response did not contain a token".to_string(),
            )),
        }
    }

    /// List the newest messages, at most `limit` of them
    pub async fn list_messages(&self, token: &str, limit: usize) -> Result<Vec<MessageSummary>> {
        let url = format!("{}?page=1", self.url(&self.api.messages_path));
        let body = self.http.get(&url, Some(token)).await?;

        let records: Vec<MessageRecord> = self.collection(&body)?;
        Ok(records
            .into_iter()
            .take(limit)
            .map(MessageSummary::from)
            .collect())
    }

    /// Fetch one message with its bodies and attachment metadata
    pub async fn read_message(&self, token: &str, id: &str) -> Result<MessageDetail> {
        if !is_path_segment(id) {
            return Err(MailboxError::InvalidInput(format!("invalid message id '{}'", id)));
        }
        let url = format!("{}/{}", self.url(&self.api.messages_path), id);
        let body = self.http.get(&url, Some(token)).await?;

        let record: MessageDetailRecord = serde_json::from_slice(&body)?;
        Ok(record.into())
    }
}

/// Provider ids are opaque tokens; anything that could alter the request
/// path is refused
fn is_path_segment(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
