//! Domain-shaped public API of the approval gateway.
//!
//! Every operation is a thin path/body builder over the dispatcher; no
//! business logic lives here. Blocking variants bound their wait with the
//! configured timeout via the blocking slot. While the gateway is
//! administratively disabled, notify-style operations synthesize ALLOW and
//! authentication-critical ones synthesize REJECT, always through the
//! normal completion path so no caller ever hangs.

use crate::blocking::BlockingSlot;
use crate::dispatcher::{Callback, RequestDispatcher};
use crate::models::{
    AccountData, AccountEnvelope, BanStatus, BansEnvelope, CharacterBanEntry,
    CharacterEntry, CharacterListEnvelope, Galaxy, GalaxyBanEntry, GalaxyEnvelope,
    GalaxyListEnvelope, NamePageEnvelope, PurgeBatchEnvelope, ReservationEnvelope,
};
use crate::result::ApprovalResult;
use crate::{ApiResult, ApprovalError};
use gateway_core::logging::LogHandle;
use gateway_core::{event_key, now_micros, ApiStats, GatewayConfig};
use gateway_stream::EventStreamer;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Protocol revision reported on galaxy start/shutdown.
pub const CLIENT_API_VERSION: u32 = 1004;

/// Page size for the bulk character-name listing.
const NAME_PAGE_SIZE: u32 = 10_000;

/// The approval gateway service.
///
/// Owns the dispatcher, the durable event streamer, and the statistics
/// block for the lifetime of the server process.
pub struct ApprovalService {
    pub(crate) dispatcher: RequestDispatcher,
    pub(crate) streamer: Arc<EventStreamer>,
    pub(crate) stats: Arc<ApiStats>,
    pub(crate) galaxy_id: AtomicU32,
    pub(crate) timeout: Duration,
    pub(crate) metrics_interval_secs: u64,
    pub(crate) log_handle: Option<LogHandle>,
    pub(crate) has_credentials: bool,
}

impl ApprovalService {
    /// Build the service. Must be called from within a tokio runtime.
    pub fn new(config: GatewayConfig, log_handle: Option<LogHandle>) -> ApiResult<Self> {
        let stats = Arc::new(ApiStats::new());
        let dispatcher = RequestDispatcher::new(&config, Arc::clone(&stats))?;
        let streamer = Arc::new(EventStreamer::new(&config)?);

        if config.is_enabled() {
            info!(
                base_url = %config.base_url,
                galaxy_id = config.galaxy_id,
                fail_open = config.fail_open,
                dry_run = config.dry_run,
                "Approval gateway configured"
            );
        } else {
            warn!("Approval gateway disabled (base URL or API token not configured)");
        }

        Ok(Self {
            dispatcher,
            streamer,
            stats,
            galaxy_id: AtomicU32::new(config.galaxy_id),
            timeout: config.timeout(),
            metrics_interval_secs: config.clamped_metrics_interval_secs(),
            log_handle,
            has_credentials: config.is_enabled(),
        })
    }

    /// Start the event stream and the periodic metrics publisher.
    pub fn start(&self) {
        self.streamer.start();

        let interval = self.metrics_interval_secs;
        if interval == 0 || !self.streamer.is_enabled() {
            info!("Metrics publishing disabled");
            return;
        }

        let streamer = Arc::clone(&self.streamer);
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval));
            // The interval's first tick is immediate; metrics wait one full
            // period before the first sample.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let now = chrono::Utc::now();
                let mut gateway = stats.snapshot();
                gateway["streaming"] = streamer.stats_snapshot();
                let payload = json!({
                    "@timestamp": now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                    "@timestampMs": now.timestamp_millis(),
                    "gateway": gateway,
                });
                if let Err(e) = streamer.publish("metrics", &event_key(now_micros()), &payload) {
                    error!(error = %e, "Failed to publish metrics");
                }
            }
        });

        info!(interval_secs = interval, "Scheduled metrics publishing");
    }

    /// Stop the streaming connection and garbage collector.
    pub fn shutdown(&self) {
        self.streamer.shutdown();
    }

    pub fn galaxy_id(&self) -> u32 {
        self.galaxy_id.load(Ordering::Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    /// Combined statistics document: call pipeline plus streaming.
    pub fn stats_as_json(&self) -> Value {
        let mut stats = self.stats.snapshot();
        stats["apiEnabled"] = json!(self.dispatcher.is_enabled());
        stats["galaxyId"] = json!(self.galaxy_id());
        stats["failOpen"] = json!(self.dispatcher.fail_open());
        stats["dryRun"] = json!(self.dispatcher.is_dry_run());
        stats["streaming"] = self.streamer.stats_snapshot();
        stats
    }

    // ---- session operations (async, callback-style) ----

    /// Authenticate a login attempt. Authentication-critical: a disabled
    /// gateway synthesizes REJECT.
    pub fn create_session(
        &self,
        username: &str,
        password: &str,
        client_version: &str,
        client_ip: &str,
        callback: Callback,
    ) {
        if !self.dispatcher.is_enabled() {
            self.dispatcher
                .dispatch_synthetic(ApprovalResult::disabled_reject(), callback);
            return;
        }

        let body = json!({
            "username": username,
            "password": password,
            "client_version": client_version,
            "client_ip": client_ip,
            "galaxy_id": self.galaxy_id(),
        });
        self.dispatcher
            .call("create_session", Method::POST, paths::login(), Some(body), callback);
    }

    pub fn approve_new_session(&self, ip: &str, account_id: u32, callback: Callback) {
        let path = paths::session_approval(account_id, self.galaxy_id(), ip);
        self.dispatcher
            .call("approve_new_session", Method::GET, path, None, callback);
    }

    pub fn validate_session(&self, session_id: &str, account_id: u32, ip: &str, callback: Callback) {
        let path = paths::session_validate(account_id, self.galaxy_id(), ip, session_id);
        self.dispatcher
            .call("validate_session", Method::GET, path, None, callback);
    }

    pub fn approve_player_connect(
        &self,
        ip: &str,
        account_id: u32,
        character_id: u64,
        logged_in_accounts: &[u32],
        callback: Callback,
    ) {
        let path = paths::player_approval(
            account_id,
            self.galaxy_id(),
            ip,
            character_id,
            logged_in_accounts,
        );
        self.dispatcher
            .call("approve_player_connect", Method::GET, path, None, callback);
    }

    // ---- notifications (fire-and-forget) ----

    pub fn notify_galaxy_start(&self, galaxy_id: u32) {
        self.galaxy_id.store(galaxy_id, Ordering::Relaxed);
        self.notify("notify_galaxy_start", paths::galaxy_start(galaxy_id));
    }

    pub fn notify_galaxy_shutdown(&self) {
        self.notify(
            "notify_galaxy_shutdown",
            paths::galaxy_shutdown(self.galaxy_id()),
        );
    }

    pub fn notify_session_start(&self, ip: &str, account_id: u32) {
        self.notify(
            "notify_session_start",
            paths::session_start(account_id, self.galaxy_id(), ip),
        );
    }

    pub fn notify_disconnect_client(&self, ip: &str, account_id: u32, character_id: u64, event_type: &str) {
        self.notify(
            "notify_disconnect_client",
            paths::player_disconnect(account_id, self.galaxy_id(), ip, character_id, event_type),
        );
    }

    /// Player-online transition; with a callback this behaves like an
    /// approval call, without one it is a plain notification.
    pub fn notify_player_online(&self, ip: &str, account_id: u32, character_id: u64, callback: Option<Callback>) {
        let path = paths::player_online(account_id, self.galaxy_id(), ip, character_id);
        match callback {
            Some(callback) => {
                self.dispatcher
                    .call("notify_player_online", Method::GET, path, None, callback)
            }
            None => self.notify("notify_player_online", path),
        }
    }

    pub fn notify_player_offline(&self, ip: &str, account_id: u32, character_id: u64) {
        self.notify(
            "notify_player_offline",
            paths::player_offline(account_id, self.galaxy_id(), ip, character_id),
        );
    }

    fn notify(&self, src: &'static str, path: String) {
        self.dispatcher.call(
            src,
            Method::GET,
            path,
            None,
            Box::new(move |result| {
                if !result.is_allowed() {
                    error!(
                        src,
                        trx = %result.client_trx_id,
                        action = result.action.as_str(),
                        details = %result.details,
                        "Unexpected notify failure"
                    );
                }
            }),
        );
    }

    // ---- blocking core ----

    /// Issue a call and wait for its completion, bounded by the configured
    /// timeout. The late callback after a timeout is discarded.
    pub fn call_blocking(&self, src: &'static str, method: Method, path: String, body: Option<Value>) -> ApiResult<ApprovalResult> {
        if !self.dispatcher.is_enabled() {
            return Err(ApprovalError::Disabled);
        }

        self.stats.blocking_call_started();
        let started = Instant::now();

        let slot = BlockingSlot::new();
        self.dispatcher
            .call(src, method, path.clone(), body, slot.callback());

        let outcome = slot.wait(self.timeout);
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Some(result) => {
                self.stats
                    .blocking_call_finished(elapsed, result.req_time_ms());
                Ok(result)
            }
            None => {
                self.stats.blocking_call_finished(elapsed, None);
                warn!(
                    src,
                    timeout_ms = self.timeout.as_millis() as u64,
                    path = %path,
                    "Timeout waiting for API callback"
                );
                Err(ApprovalError::Timeout)
            }
        }
    }

    /// Blocking call that treats anything but ALLOW as a denial error.
    fn call_blocking_allowed(&self, src: &'static str, method: Method, path: String, body: Option<Value>) -> ApiResult<ApprovalResult> {
        let result = self.call_blocking(src, method, path, body)?;
        if result.is_allowed() {
            Ok(result)
        } else {
            Err(ApprovalError::Denied(result.user_message()))
        }
    }

    // ---- account operations (blocking) ----

    pub fn account_data(&self, account_id: u32) -> ApiResult<AccountData> {
        let result = self.call_blocking_allowed(
            "account_data",
            Method::GET,
            paths::account(self.galaxy_id(), account_id),
            None,
        )?;
        let envelope: AccountEnvelope = parse_body(&result)?;
        Ok(envelope.account)
    }

    pub fn account_id(&self, username: &str) -> ApiResult<u32> {
        let result = self.call_blocking_allowed(
            "account_id",
            Method::GET,
            paths::account_by_name(self.galaxy_id(), username),
            None,
        )?;
        let envelope: AccountEnvelope = parse_body(&result)?;
        Ok(envelope.account.account_id)
    }

    pub fn account_ban_status(&self, account_id: u32) -> ApiResult<BanStatus> {
        let result = self.call_blocking_allowed(
            "account_ban_status",
            Method::GET,
            paths::account_isbanned(self.galaxy_id(), account_id),
            None,
        )?;
        parse_body(&result)
    }

    pub fn ban_account(&self, account_id: u32, issuer_id: u32, expires: u64, reason: &str) -> ApiResult<()> {
        let body = json!({
            "issuer_id": issuer_id,
            "expires": expires,
            "reason": reason,
        });
        self.call_blocking_allowed(
            "ban_account",
            Method::POST,
            paths::account_ban(self.galaxy_id(), account_id),
            Some(body),
        )?;
        Ok(())
    }

    pub fn unban_account(&self, account_id: u32, reason: &str) -> ApiResult<()> {
        self.call_blocking_allowed(
            "unban_account",
            Method::PUT,
            paths::account_unban(self.galaxy_id(), account_id),
            Some(json!({"reason": reason})),
        )?;
        Ok(())
    }

    // ---- galaxy ban operations (blocking) ----

    pub fn galaxy_bans(&self, account_id: u32) -> ApiResult<Vec<GalaxyBanEntry>> {
        let result = self.call_blocking_allowed(
            "galaxy_bans",
            Method::GET,
            paths::galaxy_bans(self.galaxy_id(), account_id),
            None,
        )?;
        let envelope: BansEnvelope<GalaxyBanEntry> = parse_body(&result)?;
        Ok(envelope.bans)
    }

    pub fn ban_from_galaxy(
        &self,
        account_id: u32,
        target_galaxy_id: u32,
        issuer_id: u32,
        expires: u64,
        reason: &str,
    ) -> ApiResult<()> {
        let body = json!({
            "galaxy_id": target_galaxy_id,
            "issuer_id": issuer_id,
            "expires": expires,
            "reason": reason,
        });
        self.call_blocking_allowed(
            "ban_from_galaxy",
            Method::POST,
            paths::galaxy_ban(self.galaxy_id(), account_id),
            Some(body),
        )?;
        Ok(())
    }

    pub fn unban_from_galaxy(&self, account_id: u32, target_galaxy_id: u32, reason: &str) -> ApiResult<()> {
        self.call_blocking_allowed(
            "unban_from_galaxy",
            Method::PUT,
            paths::galaxy_unban(self.galaxy_id(), account_id, target_galaxy_id),
            Some(json!({"reason": reason})),
        )?;
        Ok(())
    }

    // ---- character ban operations (blocking) ----

    pub fn character_bans(&self, account_id: u32) -> ApiResult<Vec<CharacterBanEntry>> {
        let result = self.call_blocking_allowed(
            "character_bans",
            Method::GET,
            paths::character_bans(self.galaxy_id(), account_id),
            None,
        )?;
        let envelope: BansEnvelope<CharacterBanEntry> = parse_body(&result)?;
        Ok(envelope.bans)
    }

    pub fn ban_character(
        &self,
        account_id: u32,
        target_galaxy_id: u32,
        name: &str,
        issuer_id: u32,
        expires: u64,
        reason: &str,
    ) -> ApiResult<()> {
        let body = json!({
            "galaxy_id": target_galaxy_id,
            "name": name,
            "issuer_id": issuer_id,
            "expires": expires,
            "reason": reason,
        });
        self.call_blocking_allowed(
            "ban_character",
            Method::POST,
            paths::character_ban(self.galaxy_id(), account_id),
            Some(body),
        )?;
        Ok(())
    }

    pub fn unban_character(&self, account_id: u32, target_galaxy_id: u32, name: &str, reason: &str) -> ApiResult<()> {
        let body = json!({
            "galaxy_id": target_galaxy_id,
            "reason": reason,
        });
        self.call_blocking_allowed(
            "unban_character",
            Method::PUT,
            paths::character_unban(self.galaxy_id(), account_id, name),
            Some(body),
        )?;
        Ok(())
    }

    // ---- character operations (blocking) ----

    #[allow(clippy::too_many_arguments)]
    pub fn create_character(
        &self,
        character_oid: u64,
        account_id: u32,
        firstname: &str,
        surname: &str,
        race: u32,
        gender: u32,
        template: &str,
        reservation_id: Option<&str>,
    ) -> ApiResult<()> {
        let mut body = json!({
            "character_oid": character_oid,
            "account_id": account_id,
            "galaxy_id": self.galaxy_id(),
            "firstname": firstname,
            "surname": surname,
            "race": race,
            "gender": gender,
            "template": template,
        });
        if let Some(reservation_id) = reservation_id {
            body["reservation_id"] = json!(reservation_id);
        }
        self.call_blocking_allowed(
            "create_character",
            Method::POST,
            paths::account_characters(self.galaxy_id(), account_id),
            Some(body),
        )?;
        Ok(())
    }

    pub fn character_list(&self, account_id: u32) -> ApiResult<Vec<CharacterEntry>> {
        let result = self.call_blocking_allowed(
            "character_list",
            Method::GET,
            paths::account_characters(self.galaxy_id(), account_id),
            None,
        )?;
        let envelope: CharacterListEnvelope = parse_body(&result)?;
        Ok(envelope.characters)
    }

    /// Fetch one character record as raw JSON under the `character` field.
    pub fn character(&self, character_oid: u64) -> ApiResult<Value> {
        let result = self.call_blocking_allowed(
            "character",
            Method::GET,
            paths::character(self.galaxy_id(), character_oid),
            None,
        )?;
        let json = result
            .raw_json
            .ok_or_else(|| ApprovalError::MalformedResponse("empty response body".to_string()))?;
        match json.get("character") {
            Some(character) if !character.is_null() => Ok(character.clone()),
            _ => Err(ApprovalError::MalformedResponse(
                "No character field in response".to_string(),
            )),
        }
    }

    /// First name updates must never blank a character's name.
    pub fn update_character_firstname(&self, character_oid: u64, firstname: &str) -> ApiResult<()> {
        if firstname.is_empty() {
            return Err(ApprovalError::InvalidArgument(
                "First name cannot be empty".to_string(),
            ));
        }
        self.call_blocking_allowed(
            "update_character_firstname",
            Method::PUT,
            paths::character(self.galaxy_id(), character_oid),
            Some(json!({"firstname": firstname})),
        )?;
        Ok(())
    }

    /// Surnames may be blanked deliberately, so an empty value is sent.
    pub fn update_character_surname(&self, character_oid: u64, surname: &str) -> ApiResult<()> {
        self.call_blocking_allowed(
            "update_character_surname",
            Method::PUT,
            paths::character(self.galaxy_id(), character_oid),
            Some(json!({"surname": surname})),
        )?;
        Ok(())
    }

    pub fn delete_character(&self, character_oid: u64, account_id: u32) -> ApiResult<()> {
        self.call_blocking_allowed(
            "delete_character",
            Method::DELETE,
            paths::account_character(self.galaxy_id(), account_id, character_oid),
            None,
        )?;
        Ok(())
    }

    pub fn begin_characters_commit(&self) -> ApiResult<()> {
        self.call_blocking_allowed(
            "begin_characters_commit",
            Method::GET,
            paths::characters_dirty(self.galaxy_id()),
            None,
        )?;
        Ok(())
    }

    pub fn commit_characters(&self) -> ApiResult<()> {
        self.call_blocking_allowed(
            "commit_characters",
            Method::PUT,
            paths::characters_commit(self.galaxy_id()),
            None,
        )?;
        Ok(())
    }

    pub fn rollback_characters(&self) -> ApiResult<()> {
        self.call_blocking_allowed(
            "rollback_characters",
            Method::DELETE,
            paths::characters_rollback(self.galaxy_id()),
            None,
        )?;
        Ok(())
    }

    /// Open a purge batch over deleted characters. Returns None when the
    /// remote reports nothing to purge.
    pub fn begin_purge_batch(&self, limit: u32) -> ApiResult<Option<(String, Vec<u64>)>> {
        let result = self.call_blocking_allowed(
            "begin_purge_batch",
            Method::GET,
            paths::characters_deleted(self.galaxy_id(), limit),
            None,
        )?;
        let envelope: PurgeBatchEnvelope = parse_body(&result)?;
        match envelope.batch_id {
            None => Ok(None),
            Some(batch_id) => {
                let oids = envelope
                    .characters
                    .into_iter()
                    .map(|c| c.character_oid)
                    .collect();
                Ok(Some((batch_id, oids)))
            }
        }
    }

    pub fn commit_purge_batch(&self, batch_id: &str) -> ApiResult<()> {
        self.call_blocking_allowed(
            "commit_purge_batch",
            Method::PUT,
            paths::characters_purge(self.galaxy_id(), batch_id),
            None,
        )?;
        Ok(())
    }

    /// Load the full first-name → oid map, paging until a short page.
    ///
    /// Names are lowercased for lookup; collisions are logged and the later
    /// entry wins.
    pub fn load_character_names(&self) -> ApiResult<HashMap<String, u64>> {
        let started = Instant::now();
        let mut names: HashMap<String, u64> = HashMap::new();
        let mut offset = 0u32;

        loop {
            let result = self.call_blocking_allowed(
                "load_character_names",
                Method::GET,
                paths::character_names(self.galaxy_id(), NAME_PAGE_SIZE, offset),
                None,
            )?;
            let page: NamePageEnvelope = parse_body(&result)?;
            let page_count = page.names.len() as u32;

            for (oid, firstname) in page.names {
                let key = firstname.to_lowercase();
                if names.insert(key, oid).is_some() {
                    error!(name = %firstname, "Colliding character name");
                }
            }

            if page_count < NAME_PAGE_SIZE {
                break;
            }
            offset += NAME_PAGE_SIZE;
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let rate = if elapsed_ms > 0 {
            names.len() as u64 * 1000 / elapsed_ms
        } else {
            0
        };
        info!(
            count = names.len(),
            elapsed_ms,
            names_per_sec = rate,
            "Loaded character names"
        );
        Ok(names)
    }

    /// Reserve a character name ahead of creation; returns the reservation
    /// id to pass to `create_character`.
    pub fn reserve_character_name(&self, firstname: &str, surname: &str) -> ApiResult<String> {
        let mut body = json!({"firstname": firstname});
        if !surname.is_empty() {
            body["surname"] = json!(surname);
        }
        let result = self.call_blocking_allowed(
            "reserve_character_name",
            Method::POST,
            paths::character_names_reserve(self.galaxy_id()),
            Some(body),
        )?;
        let envelope: ReservationEnvelope = parse_body(&result)?;
        Ok(envelope.reservation_id)
    }

    // ---- galaxy directory (blocking) ----

    pub fn authorized_galaxies(&self, account_id: u32) -> ApiResult<Vec<Galaxy>> {
        let result = self.call_blocking_allowed(
            "authorized_galaxies",
            Method::GET,
            paths::account_galaxies(account_id),
            None,
        )?;
        let envelope: GalaxyListEnvelope = parse_body(&result)?;
        Ok(envelope.galaxies)
    }

    pub fn galaxy_entry(&self, galaxy_id: u32) -> ApiResult<Galaxy> {
        let result = self.call_blocking_allowed(
            "galaxy_entry",
            Method::GET,
            paths::galaxy(galaxy_id),
            None,
        )?;
        let envelope: GalaxyEnvelope = parse_body(&result)?;
        Ok(envelope.galaxy)
    }

    // ---- streaming proxies ----

    /// Durably publish one event on the export stream.
    pub fn publish(&self, channel: &str, key: &str, payload: &Value) -> ApiResult<()> {
        self.streamer.publish(channel, key, payload)?;
        Ok(())
    }

    pub fn publish_trx_log(&self, trx_id: &str, payload: &Value) -> ApiResult<()> {
        self.streamer.publish_trx_log(trx_id, payload)?;
        Ok(())
    }

    pub fn is_stream_connected(&self) -> bool {
        self.streamer.is_connected()
    }

    pub fn stream_pending_count(&self) -> u64 {
        self.streamer.pending_count()
    }
}

/// Deserialize the raw response payload of an allowed call.
fn parse_body<T: DeserializeOwned>(result: &ApprovalResult) -> ApiResult<T> {
    let json = result
        .raw_json
        .as_ref()
        .ok_or_else(|| ApprovalError::MalformedResponse("empty response body".to_string()))?;
    serde_json::from_value(json.clone())
        .map_err(|e| ApprovalError::MalformedResponse(e.to_string()))
}

/// Request path builders for the remote API.
pub(crate) mod paths {
    use super::CLIENT_API_VERSION;

    pub(crate) fn login() -> String {
        "/v1/core3/account/login".to_string()
    }

    pub(crate) fn galaxy_start(galaxy_id: u32) -> String {
        format!(
            "/v1/core3/galaxy/{}/start?client_version={}",
            galaxy_id, CLIENT_API_VERSION
        )
    }

    pub(crate) fn galaxy_shutdown(galaxy_id: u32) -> String {
        format!(
            "/v1/core3/galaxy/{}/shutdown?client_version={}",
            galaxy_id, CLIENT_API_VERSION
        )
    }

    fn session_base(account_id: u32, galaxy_id: u32, ip: &str) -> String {
        format!(
            "/v1/core3/account/{}/galaxy/{}/session/ip/{}",
            account_id, galaxy_id, ip
        )
    }

    pub(crate) fn session_approval(account_id: u32, galaxy_id: u32, ip: &str) -> String {
        format!("{}/approval", session_base(account_id, galaxy_id, ip))
    }

    pub(crate) fn session_validate(account_id: u32, galaxy_id: u32, ip: &str, session_id: &str) -> String {
        format!(
            "{}/sessionHash/{}/isvalidsession",
            session_base(account_id, galaxy_id, ip),
            session_id
        )
    }

    pub(crate) fn session_start(account_id: u32, galaxy_id: u32, ip: &str) -> String {
        format!("{}/start", session_base(account_id, galaxy_id, ip))
    }

    fn player_base(account_id: u32, galaxy_id: u32, ip: &str, character_id: u64) -> String {
        format!(
            "{}/player/{}",
            session_base(account_id, galaxy_id, ip),
            character_id
        )
    }

    pub(crate) fn player_approval(
        account_id: u32,
        galaxy_id: u32,
        ip: &str,
        character_id: u64,
        logged_in_accounts: &[u32],
    ) -> String {
        let mut path = format!(
            "{}/approval",
            player_base(account_id, galaxy_id, ip, character_id)
        );
        if !logged_in_accounts.is_empty() {
            let list = logged_in_accounts
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(",");
            path.push_str(&format!("?loggedin_accounts={}", list));
        }
        path
    }

    pub(crate) fn player_disconnect(
        account_id: u32,
        galaxy_id: u32,
        ip: &str,
        character_id: u64,
        event_type: &str,
    ) -> String {
        format!(
            "{}/disconnect?eventType={}",
            player_base(account_id, galaxy_id, ip, character_id),
            event_type
        )
    }

    pub(crate) fn player_online(account_id: u32, galaxy_id: u32, ip: &str, character_id: u64) -> String {
        format!("{}/online", player_base(account_id, galaxy_id, ip, character_id))
    }

    pub(crate) fn player_offline(account_id: u32, galaxy_id: u32, ip: &str, character_id: u64) -> String {
        format!("{}/offline", player_base(account_id, galaxy_id, ip, character_id))
    }

    fn galaxy_account(galaxy_id: u32, account_id: u32) -> String {
        format!("/v1/core3/galaxy/{}/account/{}", galaxy_id, account_id)
    }

    pub(crate) fn account(galaxy_id: u32, account_id: u32) -> String {
        galaxy_account(galaxy_id, account_id)
    }

    pub(crate) fn account_by_name(galaxy_id: u32, username: &str) -> String {
        format!("/v1/core3/galaxy/{}/account/{}", galaxy_id, username)
    }

    pub(crate) fn account_isbanned(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/isbanned", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn account_ban(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/ban", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn account_unban(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/unban", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn galaxy_bans(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/galaxybans", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn galaxy_ban(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/galaxyban", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn galaxy_unban(galaxy_id: u32, account_id: u32, target_galaxy_id: u32) -> String {
        format!(
            "{}/galaxyban/{}",
            galaxy_account(galaxy_id, account_id),
            target_galaxy_id
        )
    }

    pub(crate) fn character_bans(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/characterbans", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn character_ban(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/characterban", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn character_unban(galaxy_id: u32, account_id: u32, name: &str) -> String {
        format!("{}/characterban/{}", galaxy_account(galaxy_id, account_id), name)
    }

    pub(crate) fn account_characters(galaxy_id: u32, account_id: u32) -> String {
        format!("{}/characters", galaxy_account(galaxy_id, account_id))
    }

    pub(crate) fn account_character(galaxy_id: u32, account_id: u32, character_oid: u64) -> String {
        format!(
            "{}/characters/{}",
            galaxy_account(galaxy_id, account_id),
            character_oid
        )
    }

    pub(crate) fn character(galaxy_id: u32, character_oid: u64) -> String {
        format!("/v1/core3/galaxy/{}/characters/{}", galaxy_id, character_oid)
    }

    pub(crate) fn characters_dirty(galaxy_id: u32) -> String {
        format!("/v1/core3/galaxy/{}/characters?filter=dirty", galaxy_id)
    }

    pub(crate) fn characters_commit(galaxy_id: u32) -> String {
        format!("/v1/core3/galaxy/{}/characters/commit", galaxy_id)
    }

    pub(crate) fn characters_rollback(galaxy_id: u32) -> String {
        format!("/v1/core3/galaxy/{}/characters/rollback", galaxy_id)
    }

    pub(crate) fn characters_deleted(galaxy_id: u32, limit: u32) -> String {
        format!(
            "/v1/core3/galaxy/{}/characters?filter=deleted&limit={}",
            galaxy_id, limit
        )
    }

    pub(crate) fn characters_purge(galaxy_id: u32, batch_id: &str) -> String {
        format!(
            "/v1/core3/galaxy/{}/characters/purge?batch_id={}",
            galaxy_id, batch_id
        )
    }

    pub(crate) fn character_names(galaxy_id: u32, limit: u32, offset: u32) -> String {
        format!(
            "/v1/core3/galaxy/{}/characters/names?limit={}&offset={}",
            galaxy_id, limit, offset
        )
    }

    pub(crate) fn character_names_reserve(galaxy_id: u32) -> String {
        format!("/v1/core3/galaxy/{}/characters/names", galaxy_id)
    }

    pub(crate) fn account_galaxies(account_id: u32) -> String {
        format!("/v1/core3/account/{}/galaxies", account_id)
    }

    pub(crate) fn galaxy(galaxy_id: u32) -> String {
        format!("/v1/core3/galaxy/{}", galaxy_id)
    }
}
