//! Bearer-token session store and identity decoding.
//!
//! # Design
//! `SessionStore` owns exactly one persisted value: the bearer token, kept
//! under a fixed file name inside an injected directory (or in memory for
//! tests and mock sessions). Every consumer receives the store explicitly;
//! there is no ambient global to reach for.
//!
//! The token is treated as a three-segment signed token whose middle segment
//! is a base64url JSON object of claims. Decoding performs no signature
//! verification: the resulting `Identity` is good enough for greeting text,
//! never for authorization, which the server enforces on every call. A token
//! that fails to decode at any step is simply "no identity"; corrupted or
//! foreign tokens are an expected condition, not an error.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine as _, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// File name of the persisted token inside the store directory.
const TOKEN_KEY: &str = "token";

/// base64url decoding that accepts both padded and unpadded segments; token
/// issuers omit padding but hand-copied tokens often carry it.
const URL_SAFE_FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Claims decoded from the session token, kept as a loose map because the
/// issuer is free to add claims the client has never heard of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity {
    claims: Map<String, Value>,
}

impl Identity {
    /// Raw access to every claim.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The user id claim, as issued.
    pub fn user_id(&self) -> Option<&str> {
        self.claim("user_id")?.as_str()
    }

    /// The subject claim; the issuing server sets it to the user's email.
    pub fn email(&self) -> Option<&str> {
        self.claim("sub")?.as_str()
    }
}

/// Persists and retrieves the single bearer token for the signed-in user.
#[derive(Debug)]
pub struct SessionStore {
    backend: Backend,
}

#[derive(Debug)]
enum Backend {
    Dir(PathBuf),
    Memory(Mutex<Option<String>>),
}

impl SessionStore {
    /// Store the token in a file named `token` inside `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Dir(dir.into()),
        }
    }

    /// Keep the token in memory only; nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(None)),
        }
    }

    /// The persisted token, or `None` when absent, unreadable, or blank.
    pub fn token(&self) -> Option<String> {
        let raw = match &self.backend {
            Backend::Dir(dir) => fs::read_to_string(dir.join(TOKEN_KEY)).ok()?,
            Backend::Memory(slot) => slot.lock().unwrap_or_else(PoisonError::into_inner).clone()?,
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Persist `token`, overwriting any prior value. Persistence is
    /// best-effort: on a storage-incapable environment the failure is logged
    /// and the session simply stays signed out.
    pub fn set_token(&self, token: &str) {
        match &self.backend {
            Backend::Dir(dir) => {
                let written =
                    fs::create_dir_all(dir).and_then(|()| fs::write(dir.join(TOKEN_KEY), token));
                if let Err(err) = written {
                    log::warn!("could not persist session token: {err}");
                }
            }
            Backend::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
            }
        }
    }

    /// Delete the persisted token. Idempotent; an absent token is fine.
    pub fn clear_token(&self) {
        match &self.backend {
            Backend::Dir(dir) => match fs::remove_file(dir.join(TOKEN_KEY)) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => log::warn!("could not remove session token: {err}"),
            },
            Backend::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Decode the stored token's claims. `None` when there is no token or
    /// when any decoding step fails: malformed segments, invalid base64,
    /// non-JSON or non-object payloads all land here.
    pub fn identity(&self) -> Option<Identity> {
        let token = self.token()?;
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_FORGIVING.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}
