//! Token Service
//!
//! Reads the bearer token the main application stores in the shared key-value store and
//! decodes the claim set carried in its middle segment. Decoding never fails loudly: a
//! token that is missing or malformed simply has no claims.

use crate::container::{require_container, ContainerResolver};
use crate::error::{AccessError, TokenError};
use crate::kv::KeyValueSession;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Key under which the token is stored
pub const TOKEN_KEY: &str = "Token";

/// Decoded claim set
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// `exp` as a UTC timestamp, when present and numeric.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let exp = self.0.get("exp")?;
        let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Whether the token had expired at `now`. A token without `exp` never expires.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|exp| exp <= now).unwrap_or(false)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Log-safe rendering of a token: a short prefix and the length.
pub fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{}…({} chars)", prefix, token.chars().count())
}

/// Decode the claim set of a three-segment claims token.
///
/// The payload segment is base64url; it is mapped onto the standard alphabet and padded
/// to a multiple of four before decoding.
pub fn decode_claims_from(token: &str) -> Result<Map<String, Value>, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::SegmentCount(segments.len()));
    }

    let mut payload: String = segments[1]
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let remainder = payload.len() % 4;
    if remainder != 0 {
        payload.extend(std::iter::repeat('=').take(4 - remainder));
    }

    let bytes = STANDARD.decode(payload.as_bytes())?;
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(map) => Ok(map),
        _ => Err(TokenError::NotAnObject),
    }
}

pub struct TokenService {
    resolver: Arc<dyn ContainerResolver>,
    kv: Arc<KeyValueSession>,
    token_key: String,
}

impl TokenService {
    pub fn new(resolver: Arc<dyn ContainerResolver>, kv: Arc<KeyValueSession>) -> Self {
        Self {
            resolver,
            kv,
            token_key: TOKEN_KEY.to_string(),
        }
    }

    pub fn with_token_key(mut self, token_key: impl Into<String>) -> Self {
        self.token_key = token_key.into();
        self
    }

    /// Raw token for `host_app_id`, if one is stored.
    pub fn get_token(&self, host_app_id: &str) -> Option<String> {
        match self.try_get_token(host_app_id) {
            Ok(token) => Some(token),
            Err(AccessError::MissingToken(_)) => {
                tracing::debug!(host_app_id, "No token stored");
                None
            }
            Err(e) => {
                tracing::warn!(host_app_id, error = %e, "Token unavailable");
                None
            }
        }
    }

    pub fn try_get_token(&self, host_app_id: &str) -> Result<String, AccessError> {
        let directory = require_container(self.resolver.as_ref(), host_app_id)?;
        let token = self
            .kv
            .try_with_default_store(&directory, |handle| {
                KeyValueSession::read_string(handle, &self.token_key)
            })?
            .ok_or_else(|| AccessError::MissingToken(host_app_id.to_string()))?;
        tracing::debug!(host_app_id, token = %redact(&token), "Token read");
        Ok(token)
    }

    /// Claim set of the stored token, or `None` if there is no usable token.
    pub fn decode_claims(&self, host_app_id: &str) -> Option<Map<String, Value>> {
        self.claims(host_app_id).map(Claims::into_map)
    }

    pub fn claims(&self, host_app_id: &str) -> Option<Claims> {
        let token = self.get_token(host_app_id)?;
        match decode_claims_from(&token) {
            Ok(map) => Some(Claims(map)),
            Err(e) => {
                tracing::warn!(
                    host_app_id,
                    token = %redact(&token),
                    error = %e,
                    "Token claims could not be decoded"
                );
                None
            }
        }
    }
}
