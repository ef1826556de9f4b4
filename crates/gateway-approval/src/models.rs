//! Parsed response payloads for the domain operations.

use serde::Deserialize;

/// Session fields carried by login/approval responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFields {
    /// Encrypted client IP, substituted for the plain address on update.
    #[serde(default)]
    pub eip: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub account_id: Option<u32>,
    #[serde(default)]
    pub station_id: Option<u32>,
}

impl SessionFields {
    /// Extract session fields from a delivered call result. Absent fields
    /// stay None; a result without a body yields the default.
    pub fn from_result(result: &crate::ApprovalResult) -> Self {
        result
            .raw_json
            .as_ref()
            .and_then(|json| serde_json::from_value(json.clone()).ok())
            .unwrap_or_default()
    }
}

/// Account record as returned under the `account` envelope field.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    pub account_id: u32,
    #[serde(default)]
    pub station_id: u32,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub admin_level: u32,
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub ban_expires: u32,
    #[serde(default)]
    pub ban_reason: String,
    #[serde(default)]
    pub ban_admin: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountEnvelope {
    pub account: AccountData,
}

/// Ban status for one account on this galaxy. The detail fields are only
/// populated when `isbanned` is true.
#[derive(Debug, Clone, Deserialize)]
pub struct BanStatus {
    pub isbanned: bool,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub admin_level: Option<u32>,
    #[serde(default)]
    pub ban_expires: u32,
    #[serde(default)]
    pub ban_reason: String,
    #[serde(default)]
    pub ban_admin: u32,
}

/// One galaxy-level ban for an account.
#[derive(Debug, Clone, Deserialize)]
pub struct GalaxyBanEntry {
    #[serde(default)]
    pub account_id: u32,
    #[serde(default)]
    pub issuer_id: u32,
    #[serde(default)]
    pub galaxy_id: u32,
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub expires: u32,
    #[serde(default)]
    pub reason: String,
}

/// One character-level ban for an account.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterBanEntry {
    #[serde(default)]
    pub account_id: u32,
    #[serde(default)]
    pub issuer_id: u32,
    #[serde(default)]
    pub galaxy_id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expires: u32,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BansEnvelope<T> {
    pub bans: Vec<T>,
}

/// One character as listed for an account.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterEntry {
    #[serde(default)]
    pub character_oid: u64,
    #[serde(default)]
    pub account_id: u32,
    #[serde(default)]
    pub galaxy_id: u32,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub gender: u32,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub creation_date: u64,
    #[serde(default)]
    pub galaxy_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CharacterListEnvelope {
    pub characters: Vec<CharacterEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CharacterOidRef {
    #[serde(default)]
    pub character_oid: u64,
}

/// Response to the deleted-characters query that opens a purge batch.
///
/// `batch_id` is null when there is nothing to purge.
#[derive(Debug, Deserialize)]
pub(crate) struct PurgeBatchEnvelope {
    pub batch_id: Option<String>,
    #[serde(default)]
    pub characters: Vec<CharacterOidRef>,
}

/// One page of the compact `[oid, firstname]` name listing.
#[derive(Debug, Deserialize)]
pub(crate) struct NamePageEnvelope {
    pub names: Vec<(u64, String)>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReservationEnvelope {
    pub reservation_id: String,
}

/// Galaxy connection directory entry.
#[derive(Debug, Clone, Deserialize)]
pub struct Galaxy {
    pub galaxy_id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub pingport: u16,
    #[serde(default)]
    pub population: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GalaxyListEnvelope {
    pub galaxies: Vec<Galaxy>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GalaxyEnvelope {
    pub galaxy: Galaxy,
}
