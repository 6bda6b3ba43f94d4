// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Parsing of the [JWS Compact Serialization][1].
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7515.html#section-7.1

use bherror::{
    traits::{ForeignError as _, PropagateError as _},
    Error,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    base64url,
    error::{JwtError, JwtTypeError, Result},
};

/// The JSON payload of a JWT.
///
/// The engine never inspects the claims, it only carries them.
pub type ClaimsSet = Map<String, Value>;

/// The JOSE header of a JWS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// The `alg` header parameter. It is left as parsed so that a missing
    /// value, a `none` value and unknown values can be told apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Every other header parameter.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl JwsHeader {
    /// Creates a header holding only the `alg`.
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: Some(alg.into()),
            params: Map::new(),
        }
    }
}

/// A compact JWT split into its segments, with the header and claims set
/// decoded.
///
/// The signature segment is never decoded here.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactJwt {
    /// The header segment, as received.
    pub b64u_header: String,
    /// The claims set segment, as received.
    pub b64u_claims_set: String,
    /// The signature segment, as received.
    pub b64u_signature: String,
    /// The decoded header.
    pub header: JwsHeader,
    /// The decoded claims set.
    pub claims_set: ClaimsSet,
}

impl CompactJwt {
    /// Parses a compact JWT.
    ///
    /// # Errors
    ///
    /// - [`JwtTypeError::TokenNotAString`] for an empty token,
    /// - [`JwtError::MissingSegments`] unless there are exactly three
    ///   segments,
    /// - [`JwtError::HeaderNotDecodable`] if the header is not `base64url`
    ///   encoded UTF-8,
    /// - [`JwtError::MalformedHeader`] if the decoded header is not a JSON
    ///   object,
    /// - [`JwtError::MalformedClaimsSet`] if the claims set cannot be decoded
    ///   or is not a JSON object.
    pub fn parse(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::root(JwtTypeError::TokenNotAString.into()));
        }

        let segments: Vec<&str> = token.split('.').collect();
        let &[b64u_header, b64u_claims_set, b64u_signature] = segments.as_slice() else {
            return Err(Error::root(JwtError::MissingSegments.into()));
        };

        let header_json = base64url::decode_to_string(b64u_header)
            .with_err(|| crate::Error::Jwt(JwtError::HeaderNotDecodable))?;
        let header: JwsHeader = serde_json::from_str(&header_json)
            .foreign_err(|| crate::Error::Jwt(JwtError::MalformedHeader))?;

        let claims_set = decode_claims_set(b64u_claims_set)?;

        Ok(Self {
            b64u_header: b64u_header.to_owned(),
            b64u_claims_set: b64u_claims_set.to_owned(),
            b64u_signature: b64u_signature.to_owned(),
            header,
            claims_set,
        })
    }

    /// The bytes the signature was computed over.
    pub fn signing_input(&self) -> Vec<u8> {
        signing_input(&self.b64u_header, &self.b64u_claims_set)
    }
}

// Decoding and JSON failures of the claims set share one error.
fn decode_claims_set(b64u_claims_set: &str) -> Result<ClaimsSet> {
    let claims_json = base64url::decode_to_string(b64u_claims_set)
        .with_err(|| crate::Error::Jwt(JwtError::MalformedClaimsSet))?;
    serde_json::from_str(&claims_json).foreign_err(|| crate::Error::Jwt(JwtError::MalformedClaimsSet))
}

/// The JWS signing input: `b64u_header || '.' || b64u_claims_set`, as ASCII
/// bytes.
pub fn signing_input(b64u_header: &str, b64u_claims_set: &str) -> Vec<u8> {
    let mut input = Vec::with_capacity(b64u_header.len() + 1 + b64u_claims_set.len());
    input.extend_from_slice(b64u_header.as_bytes());
    input.push(b'.');
    input.extend_from_slice(b64u_claims_set.as_bytes());
    input
}
