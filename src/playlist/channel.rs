use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Group assigned to channels whose `#EXTINF` line carries no `group-title`.
pub const DEFAULT_GROUP: &str = "General";

/// One playable entry from an M3U playlist.
///
/// A channel is only considered valid once both `name` and `manifest_uri`
/// are non-empty; the parser drops anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub name: String,
    pub logo_url: Option<String>,
    pub group: String,
    pub manifest_uri: String,
    /// ClearKey key id; always paired with `drm_key`.
    pub drm_key_id: Option<String>,
    /// ClearKey key; always paired with `drm_key_id`.
    pub drm_key: Option<String>,
    /// User-Agent override the player should send for this channel.
    pub user_agent: Option<String>,
    /// Extra query/header parameters (e.g. a session cookie) from `#EXTHTTP`.
    pub auth_params: Option<HashMap<String, String>>,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            name: String::new(),
            logo_url: None,
            group: DEFAULT_GROUP.to_string(),
            manifest_uri: String::new(),
            drm_key_id: None,
            drm_key: None,
            user_agent: None,
            auth_params: None,
        }
    }
}

impl Channel {
    /// Whether the channel carries a complete ClearKey pair.
    pub fn has_drm(&self) -> bool {
        self.drm_key_id.is_some() && self.drm_key.is_some()
    }
}
