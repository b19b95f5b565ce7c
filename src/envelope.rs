//! The envelope smuggled through the identity provider inside the OAuth 2.0 `state` parameter.
//!
//! The provider echoes `state` back unmodified (RFC 6749 §4.1.1), so the envelope is the only
//! in-flight state the proxy needs; nothing is stored server-side.

// self
use crate::_prelude::*;

/// Original `state` and `redirect_uri` of the caller, serialized as plain JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateEnvelope {
	/// Caller's original `state`; empty when the caller sent none.
	#[serde(rename = "origState", skip_serializing_if = "String::is_empty")]
	pub orig_state: String,
	/// Caller's original `redirect_uri`.
	#[serde(rename = "origRedirectURI", skip_serializing_if = "String::is_empty")]
	pub orig_redirect_uri: String,
}
impl StateEnvelope {
	/// Creates an envelope from the caller's original parameters.
	pub fn new(orig_state: impl Into<String>, orig_redirect_uri: impl Into<String>) -> Self {
		Self { orig_state: orig_state.into(), orig_redirect_uri: orig_redirect_uri.into() }
	}

	/// Renders the envelope as the literal value placed in the outgoing `state` parameter.
	pub fn encode(&self) -> String {
		// Two string fields cannot fail to serialize.
		serde_json::to_string(self).unwrap_or_default()
	}

	/// Decodes a `state` value received on the callback.
	pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
		let de = &mut serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(de)
			.map_err(|source| ProtocolError::UndecodableState { source })
	}

	/// Original `state`, or `None` when it must be dropped rather than sent back empty.
	pub fn state(&self) -> Option<&str> {
		(!self.orig_state.is_empty()).then_some(self.orig_state.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn encode_omits_empty_fields() {
		let envelope = StateEnvelope::new("foobar", "https://idp/auth");

		assert_eq!(
			envelope.encode(),
			r#"{"origState":"foobar","origRedirectURI":"https://idp/auth"}"#
		);
		assert_eq!(
			StateEnvelope::new("", "https://app.example/done").encode(),
			r#"{"origRedirectURI":"https://app.example/done"}"#
		);
	}

	#[test]
	fn decode_rejects_non_json_state() {
		assert!(matches!(
			StateEnvelope::decode("invalid"),
			Err(ProtocolError::UndecodableState { .. })
		));
		assert!(StateEnvelope::decode("").is_err());
	}

	#[test]
	fn decode_reports_field_path() {
		let err = StateEnvelope::decode(r#"{"origState":42}"#)
			.expect_err("Numeric origState should be rejected.");
		let ProtocolError::UndecodableState { source } = err else {
			panic!("Expected an undecodable state error.");
		};

		assert_eq!(source.path().to_string(), "origState");
	}

	#[test]
	fn missing_state_is_dropped_not_emptied() {
		let envelope = StateEnvelope::decode(r#"{"origRedirectURI":"https://app.example/done"}"#)
			.expect("Envelope without origState should decode.");

		assert_eq!(envelope.state(), None);
		assert_eq!(envelope.orig_redirect_uri, "https://app.example/done");
		assert_eq!(StateEnvelope::new("s1", "x").state(), Some("s1"));
	}
}
