//! Opaque pagination cursor.
//!
//! A cursor is URL-safe base64 (no padding) over a small versioned JSON
//! document holding the full [`SortKey`]. Callers only pass it back.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{SortKey, SortValue};
use crate::errors::ServiceError;

const CURSOR_VERSION: u8 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

#[derive(Serialize, Deserialize)]
struct Payload {
    v: u8,
    p: SortValue,
    id: Uuid,
}

impl Cursor {
    /// Wrap a client-supplied token without inspecting it.
    pub fn from_token(token: impl Into<String>) -> Self { Self(token.into()) }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn encode(key: &SortKey) -> Self {
        let payload = Payload { v: CURSOR_VERSION, p: key.primary.clone(), id: key.id };
        // a struct of plain fields cannot fail to serialize
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        Self(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(&self) -> Result<SortKey, ServiceError> {
        if self.0.is_empty() {
            return Err(ServiceError::InvalidCursor("empty cursor".into()));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(self.0.as_bytes())
            .map_err(|_| ServiceError::InvalidCursor("cursor is not valid base64".into()))?;
        let payload: Payload = serde_json::from_slice(&bytes)
            .map_err(|_| ServiceError::InvalidCursor("cursor payload is malformed".into()))?;
        if payload.v != CURSOR_VERSION {
            return Err(ServiceError::InvalidCursor(format!("unsupported cursor version {}", payload.v)));
        }
        Ok(SortKey::new(payload.p, payload.id))
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_recovers_key_and_tiebreak() {
        let key = SortKey::new(SortValue::Timestamp(1_700_000_000_123_456), Uuid::new_v4());
        let cursor = Cursor::encode(&key);
        assert_eq!(cursor.decode().unwrap(), key);
    }

    #[test]
    fn text_keys_survive() {
        let key = SortKey::new(SortValue::Text("Plumbing & Heating".into()), Uuid::new_v4());
        assert_eq!(Cursor::encode(&key).decode().unwrap(), key);
    }

    #[test]
    fn token_is_url_safe() {
        let key = SortKey::new(SortValue::Text("??>>//++".into()), Uuid::new_v4());
        let token = Cursor::encode(&key);
        assert!(token.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn encoding_is_deterministic() {
        let key = SortKey::new(SortValue::Integer(42), Uuid::from_u128(9));
        assert_eq!(Cursor::encode(&key), Cursor::encode(&key));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for bad in ["", "not base64!!", "bm90IGpzb24", "e30"] {
            let err = Cursor::from_token(bad).decode().unwrap_err();
            assert!(matches!(err, ServiceError::InvalidCursor(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn unknown_version_is_rejected() {
        let raw = format!(r#"{{"v":9,"p":{{"t":"integer","v":1}},"id":"{}"}}"#, Uuid::nil());
        let token = URL_SAFE_NO_PAD.encode(raw);
        assert!(matches!(Cursor::from_token(token).decode(), Err(ServiceError::InvalidCursor(_))));
    }
}
