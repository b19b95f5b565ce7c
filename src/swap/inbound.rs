//! Inbound leg: unpack the envelope from the provider's callback and send the caller home.

// self
use crate::{
	_prelude::*,
	binding::RegisteredBinding,
	envelope::StateEnvelope,
	http::BackendHttpClient,
	swap::{
		RedirectSwapProxy,
		query::{self, Params},
	},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

impl<C> RedirectSwapProxy<C>
where
	C: BackendHttpClient,
{
	pub(crate) async fn recover_inbound(
		&self,
		binding: &RegisteredBinding,
		request: Request<Body>,
	) -> Result<Response<Body>> {
		let (parts, body) = request.into_parts();
		let mut params = if parts.method == Method::POST {
			if !is_form(&parts.headers) {
				return Err(ProtocolError::UnsupportedForm.into());
			}

			query::parse(&self.read_body(&parts.headers, body).await?)
		} else {
			query::parse(parts.uri.query().unwrap_or_default().as_bytes())
		};
		let raw_state = query::first(&params, "state").ok_or(ProtocolError::MissingState)?;

		tracing::info!(id = %binding.id, state = raw_state, "request matches redirect URI, recovering state");

		let envelope = StateEnvelope::decode(raw_state)?;
		let location = recover_location(&envelope, &mut params)?;

		tracing::info!(id = %binding.id, location = %location, "recovered original redirect");

		let mut response = Response::new(Body::empty());

		*response.status_mut() = StatusCode::SEE_OTHER;
		response.headers_mut().insert(
			LOCATION,
			HeaderValue::from_str(location.as_str()).map_err(|_| ProtocolError::InvalidLocation {
				location: location.to_string(),
				source: None,
			})?,
		);

		Ok(response)
	}
}

/// Builds the caller's redirect target: its own origin and path, the callback's parameters, and
/// the caller's original `state` in place of the envelope (or no `state` at all).
fn recover_location(envelope: &StateEnvelope, params: &mut Params) -> Result<Url, ProtocolError> {
	let mut target = Url::parse(&envelope.orig_redirect_uri).map_err(|source| {
		ProtocolError::InvalidEnvelopeRedirect {
			redirect_uri: envelope.orig_redirect_uri.clone(),
			source,
		}
	})?;

	match envelope.state() {
		Some(state) => query::set(params, "state", state),
		None => query::remove(params, "state"),
	}

	target.set_fragment(None);
	query::write(&mut target, std::mem::take(params));

	Ok(target)
}

fn is_form(headers: &HeaderMap) -> bool {
	headers
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
