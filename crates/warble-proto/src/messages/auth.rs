//! Authorization handshake body.
//!
//! The auth channel carries exactly one exchange: the client presents its
//! session token, the server answers with an authorization verdict.

use serde::{Deserialize, Serialize};

/// Authorization handshake message
///
/// Sent client-to-server with `session_token` populated, and server-to-client
/// with `authorized` populated. A server verdict of `Some(true)` opens the
/// realtime channel; anything else leaves the session waiting.
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl redacts `session_token` to prevent
///   accidental logging of credentials. Always use custom `Debug`
///   implementations for types containing secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthMessage {
    /// Bearer token proving the caller may join this call
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_token: Option<String>,
    /// Server verdict: `Some(true)` grants media access
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub authorized: Option<bool>,
}

impl std::fmt::Debug for AuthMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = self.session_token.as_ref().map(|t| format!("<redacted {} bytes>", t.len()));
        f.debug_struct("AuthMessage")
            .field("session_token", &token)
            .field("authorized", &self.authorized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_serde() {
        let auth = AuthMessage { session_token: Some("tok".to_string()), authorized: None };

        let cbor = ciborium::ser::into_writer(&auth, Vec::new());
        assert!(cbor.is_ok());
    }

    #[test]
    fn debug_redacts_token() {
        let auth =
            AuthMessage { session_token: Some("secret-token".to_string()), authorized: None };

        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn absent_fields_decode_as_none() {
        // An empty CBOR map carries no fields at all.
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&ciborium::value::Value::Map(Vec::new()), &mut bytes).unwrap();

        let auth: AuthMessage = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        assert_eq!(auth, AuthMessage::default());
    }
}
