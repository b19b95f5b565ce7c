//! Query-parameter helpers shared by both legs.
//!
//! Parameters are kept as an ordered list of pairs so repeated keys survive a rewrite. When a
//! query is written back, keys are sorted (stably, so repeated values keep their order) and the
//! pairs are form-urlencoded.

// self
use crate::_prelude::*;

/// Ordered query or form parameters.
pub type Params = Vec<(String, String)>;

const RELATIVE_BASE: &str = "https://location.invalid/";

/// Parses `application/x-www-form-urlencoded` bytes into owned pairs.
pub fn parse(input: &[u8]) -> Params {
	url::form_urlencoded::parse(input).into_owned().collect()
}

/// First value for `key`, if any.
pub fn first<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
	params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Drops every value for `key`.
pub fn remove(params: &mut Params, key: &str) {
	params.retain(|(k, _)| k != key);
}

/// Replaces every value for `key` with a single `value`.
pub fn set(params: &mut Params, key: &str, value: impl Into<String>) {
	remove(params, key);
	params.push((key.to_owned(), value.into()));
}

/// Writes `params` as the query of `url`, dropping the `?` entirely when there are none.
pub fn write(url: &mut Url, mut params: Params) {
	params.sort_by(|(a, _), (b, _)| a.cmp(b));

	if params.is_empty() {
		url.set_query(None);
	} else {
		url.query_pairs_mut().clear().extend_pairs(params);
	}
}

/// A `Location` value: an absolute URL, a network-path reference such as `//idp/authorize`,
/// or an absolute-path reference such as `/login?x=1`.
#[derive(Clone, Debug)]
pub struct LocationUrl {
	url: Url,
	form: Reference,
}

/// How much of the URL the original value spelled out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reference {
	Absolute,
	NetworkPath,
	AbsolutePath,
}
impl LocationUrl {
	/// Parses a `Location` header value.
	pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
		let invalid = |source| ProtocolError::InvalidLocation {
			location: raw.to_owned(),
			source: Some(source),
		};

		match Url::parse(raw) {
			Ok(url) => Ok(Self { url, form: Reference::Absolute }),
			Err(url::ParseError::RelativeUrlWithoutBase) if raw.starts_with('/') => {
				let form =
					if raw.starts_with("//") { Reference::NetworkPath } else { Reference::AbsolutePath };
				let url = Url::parse(RELATIVE_BASE).and_then(|base| base.join(raw)).map_err(invalid)?;

				Ok(Self { url, form })
			},
			Err(source) => Err(invalid(source)),
		}
	}

	/// Query parameters carried by the location.
	pub fn params(&self) -> Params {
		self.url.query_pairs().into_owned().collect()
	}

	/// Replaces the query, see [`write`].
	pub fn set_params(&mut self, params: Params) {
		write(&mut self.url, params);
	}
}
impl Display for LocationUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.form {
			Reference::Absolute => f.write_str(self.url.as_str()),
			Reference::NetworkPath => write!(f, "//{}", &self.url[url::Position::BeforeUsername..]),
			Reference::AbsolutePath => f.write_str(&self.url[url::Position::BeforePath..]),
		}
	}
}
