//! The bridge message contract: allow-listed channel names and the paired
//! success/error reply envelope carried by every response channel.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeskError, Result};

// ── Channel ───────────────────────────────────────────────────────────────────

/// A named message channel on the allow-list.
///
/// Anything that does not parse into a `Channel` is dropped by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// UI → process. Payload: a [`crate::models::User`].
    AddUserRequest,
    /// Process → UI. Payload: `Reply<User>` echoing the inserted record.
    AddUserResponse,
    /// UI → process. No payload.
    ListUsersRequest,
    /// Process → UI. Payload: `Reply<Vec<User>>`.
    ListUsersResponse,
    /// Process → UI. Payload: `Reply<Value>` with the raw API body.
    FactResponse,
}

impl Channel {
    /// Every allow-listed channel.
    pub const ALL: [Channel; 5] = [
        Channel::AddUserRequest,
        Channel::AddUserResponse,
        Channel::ListUsersRequest,
        Channel::ListUsersResponse,
        Channel::FactResponse,
    ];

    /// Wire name of the channel.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddUserRequest => "add-user-request",
            Self::AddUserResponse => "add-user-response",
            Self::ListUsersRequest => "list-users-request",
            Self::ListUsersResponse => "list-users-response",
            Self::FactResponse => "fact-response",
        }
    }

    /// Look a wire name up in the allow-list.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// `true` for channels the background process answers.
    pub const fn is_request(self) -> bool {
        matches!(self, Self::AddUserRequest | Self::ListUsersRequest)
    }
}

impl FromStr for Channel {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s).ok_or_else(|| DeskError::UnknownChannel(s.to_string()))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// Outcome carried by every response channel.
///
/// Serialised as `{"status":"ok","data":..}` or
/// `{"status":"error","message":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Reply<T> {
    Ok { data: T },
    Error { message: String },
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self::Ok { data }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Convert into a plain `Result`, keeping the error text.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            Self::Ok { data } => Ok(data),
            Self::Error { message } => Err(message),
        }
    }
}

impl<T, E: fmt::Display> From<std::result::Result<T, E>> for Reply<T> {
    fn from(result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

impl<T: Serialize> Reply<T> {
    /// Encode as a bridge payload.
    pub fn to_payload(&self) -> Value {
        // A reply only ever wraps plain data types; fall back to an error
        // payload rather than panicking if serialisation is refused.
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "message": e.to_string() })
        })
    }
}

impl<T: DeserializeOwned> Reply<T> {
    /// Decode a bridge payload.
    pub fn from_payload(payload: Value) -> Result<Self> {
        Ok(serde_json::from_value(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use serde_json::json;

    // ── Channel ───────────────────────────────────────────────────────────────

    #[test]
    fn test_channel_lookup_round_trips_every_name() {
        for channel in Channel::ALL {
            assert_eq!(Channel::lookup(channel.as_str()), Some(channel));
        }
    }

    #[test]
    fn test_channel_lookup_rejects_unknown_names() {
        assert_eq!(Channel::lookup("delete-user-request"), None);
        assert_eq!(Channel::lookup(""), None);
        // Only exact allow-listed names match.
        assert_eq!(Channel::lookup("resultSent"), None);
        assert_eq!(Channel::lookup("ADD-USER-REQUEST"), None);
    }

    #[test]
    fn test_channel_from_str_error() {
        let err = "bogus".parse::<Channel>().unwrap_err();
        assert!(matches!(err, DeskError::UnknownChannel(ref n) if n == "bogus"));
    }

    #[test]
    fn test_channel_is_request() {
        assert!(Channel::AddUserRequest.is_request());
        assert!(Channel::ListUsersRequest.is_request());
        assert!(!Channel::ListUsersResponse.is_request());
        assert!(!Channel::FactResponse.is_request());
    }

    // ── Reply ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_reply_ok_payload_shape() {
        let reply = Reply::ok(vec![User::new("Alice", "a@x.com", "555-1")]);
        assert_eq!(
            reply.to_payload(),
            json!({
                "status": "ok",
                "data": [{ "name": "Alice", "email": "a@x.com", "phone": "555-1" }]
            })
        );
    }

    #[test]
    fn test_reply_error_payload_shape() {
        let reply: Reply<Value> = Reply::error("connection refused");
        assert_eq!(
            reply.to_payload(),
            json!({ "status": "error", "message": "connection refused" })
        );
    }

    #[test]
    fn test_reply_from_payload_keeps_opaque_data() {
        let body = json!({ "fact": "Cats sleep 70% of their lives.", "length": 31 });
        let payload = json!({ "status": "ok", "data": body.clone() });
        let reply = Reply::<Value>::from_payload(payload).unwrap();
        assert_eq!(reply.into_result(), Ok(body));
    }

    #[test]
    fn test_reply_from_result() {
        let ok: Reply<u8> = Ok::<u8, DeskError>(1).into();
        assert!(ok.is_ok());
        let err: Reply<u8> = Err::<u8, _>(DeskError::Storage("disk full".into())).into();
        assert_eq!(err.into_result(), Err("Storage error: disk full".to_string()));
    }
}
