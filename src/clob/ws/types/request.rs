use secrecy::ExposeSecret as _;
use serde::Serialize;
use strum_macros::Display;

use crate::auth::Credentials;

#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Market,
    User,
}

/// Subscribe frame sent to the WebSocket server, always carrying the complete identifier set.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct SubscriptionRequest<'ids> {
    /// Asset IDs, on the market channel
    #[serde(rename = "assets_ids", skip_serializing_if = "Option::is_none")]
    pub asset_ids: Option<&'ids [String]>,
    /// Market IDs, on the user channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markets: Option<&'ids [String]>,
    /// Subscription type ("market" or "user")
    pub r#type: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Auth<'ids>>,
}

/// The credential triple as the user channel expects it.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Auth<'creds> {
    pub api_key: String,
    pub secret: &'creds str,
    pub passphrase: &'creds str,
}

impl<'creds> From<&'creds Credentials> for Auth<'creds> {
    fn from(credentials: &'creds Credentials) -> Self {
        Self {
            api_key: credentials.key.to_string(),
            secret: credentials.secret.expose_secret(),
            passphrase: credentials.passphrase.expose_secret(),
        }
    }
}

impl<'ids> SubscriptionRequest<'ids> {
    #[must_use]
    pub fn market(asset_ids: &'ids [String]) -> Self {
        Self {
            asset_ids: Some(asset_ids),
            markets: None,
            r#type: Channel::Market,
            auth: None,
        }
    }

    #[must_use]
    pub fn user(markets: &'ids [String], credentials: &'ids Credentials) -> Self {
        Self {
            asset_ids: None,
            markets: Some(markets),
            r#type: Channel::User,
            auth: Some(credentials.into()),
        }
    }
}
