//! Outbound leg: forward to the backend and point the identity provider back at the proxy.

// self
use crate::{
	_prelude::*,
	binding::{ProxyBinding, RegisteredBinding},
	envelope::StateEnvelope,
	http::BackendHttpClient,
	swap::{
		RedirectSwapProxy,
		query::{self, LocationUrl},
	},
};

/// Connection-level headers that never cross a hop.
const HOP_BY_HOP_HEADERS: [&str; 7] = [
	"connection",
	"keep-alive",
	"proxy-connection",
	"te",
	"trailer",
	"transfer-encoding",
	"upgrade",
];

impl<C> RedirectSwapProxy<C>
where
	C: BackendHttpClient,
{
	pub(crate) async fn swap_outbound(
		&self,
		binding: &RegisteredBinding,
		request: Request<Body>,
	) -> Result<Response<Body>> {
		// A binding that cannot produce a callback URL never reaches its backend.
		let redirect = binding.redirect_url()?;
		let (parts, body) = request.into_parts();
		let body = self.read_body(&parts.headers, body).await?;
		let path = parts.uri.path().to_owned();
		let backend_request = retarget(binding, parts, body)?;

		tracing::info!(
			id = %binding.id,
			target = %backend_request.uri(),
			"forwarding request to backend"
		);

		let response = self.http_client.execute(backend_request).await.inspect_err(|e| {
			tracing::warn!(id = %binding.id, error = %e, "forwarding request to backend failed")
		})?;

		tracing::info!(id = %binding.id, status = %response.status(), "backend answered");

		let (mut parts, body) = response.into_parts();

		if binding.matches_path(&path)
			&& let Some(location) = parts.headers.get(LOCATION)
			&& let Some(rewritten) = rewrite_location(location, redirect)?
		{
			tracing::info!(id = %binding.id, location = %rewritten, "swapped redirect_uri and state");

			parts.headers.insert(
				LOCATION,
				HeaderValue::try_from(rewritten.to_string()).map_err(|_| {
					ProtocolError::InvalidLocation { location: rewritten.to_string(), source: None }
				})?,
			);
		}

		// The backend's Content-Length still describes the untouched body.
		strip_hop_by_hop(&mut parts.headers);

		Ok(Response::from_parts(parts, body))
	}
}

/// Clones the caller's request onto the backend: same method, path, query, headers, and `Host`.
///
/// `Content-Length` is dropped as well; the transport recomputes it from the buffered body.
fn retarget(
	binding: &ProxyBinding,
	parts: axum::http::request::Parts,
	body: Bytes,
) -> Result<Request<Bytes>> {
	let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
	let target = format!("http://{}{path_and_query}", binding.backend_authority());
	let uri = match target.parse::<axum::http::Uri>() {
		Ok(uri) => uri,
		Err(source) => return Err(ConfigError::InvalidBackend { target, source }.into()),
	};
	let mut headers = parts.headers;

	strip_hop_by_hop(&mut headers);
	headers.remove(header::CONTENT_LENGTH);

	if !headers.contains_key(HOST)
		&& let Some(authority) = parts.uri.authority()
		&& let Ok(value) = HeaderValue::from_str(authority.as_str())
	{
		headers.insert(HOST, value);
	}

	let mut request = Request::new(body);

	*request.method_mut() = parts.method;
	*request.uri_mut() = uri;
	*request.headers_mut() = headers;

	Ok(request)
}

/// Wraps the provider-bound `redirect_uri` and `state` into an envelope and substitutes the
/// binding's callback, keeping the caller's path.
///
/// Returns `None` when the location carries no `redirect_uri`, leaving the response untouched.
fn rewrite_location(location: &HeaderValue, redirect: &Url) -> Result<Option<LocationUrl>> {
	let raw = location.to_str().map_err(|_| ProtocolError::InvalidLocation {
		location: String::from_utf8_lossy(location.as_bytes()).into_owned(),
		source: None,
	})?;
	let mut target = LocationUrl::parse(raw)?;
	let mut params = target.params();
	let Some(orig_redirect_uri) = query::first(&params, "redirect_uri").filter(|v| !v.is_empty())
	else {
		return Ok(None);
	};
	let orig_redirect = Url::parse(orig_redirect_uri).map_err(|source| {
		ProtocolError::InvalidRedirectUri { redirect_uri: orig_redirect_uri.to_owned(), source }
	})?;
	let envelope =
		StateEnvelope::new(query::first(&params, "state").unwrap_or_default(), orig_redirect_uri);
	let mut swapped = redirect.clone();

	swapped.set_path(orig_redirect.path());
	query::set(&mut params, "state", envelope.encode());
	query::set(&mut params, "redirect_uri", swapped.as_str());
	target.set_params(params);

	Ok(Some(target))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
	for name in HOP_BY_HOP_HEADERS {
		headers.remove(name);
	}
}
