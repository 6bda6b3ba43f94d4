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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate provides a JOSE engine for generating keys and for signing and
//! verifying [JSON Web Signatures (JWS)][1] in the compact serialization.
//!
//! [1]: https://datatracker.ietf.org/doc/html/rfc7515
//!
//! # Details
//!
//! The entry point is the [`JwtEngine`], built for an [`Environment`] and a
//! [`CryptoBackend`]. The environment names the deployment and carries a
//! [`SupportMatrix`] declaring which algorithms its backend can execute for
//! which [`Operation`]; requests outside of it are refused before the backend
//! is involved. The engine itself only deals with JWS framing: the
//! [`base64url`] encoding, JOSE headers and the signing input. Every
//! cryptographic primitive is delegated to the backend.
//!
//! The supported algorithms are `HS256`, `HS384`, `HS512` (HMAC), `RS256`,
//! `RS384`, `RS512` (RSASSA-PKCS1-v1_5) and `ES256`, `ES384`, `ES512`
//! (ECDSA), see [`Algorithm`].
//!
//! A default [`openssl`] backed implementation of the backend is available as
//! [`OpensslBackend`] under the default feature `openssl`, which can be
//! disabled and replaced by a custom [`CryptoBackend`] implementation.
//!
//! # Examples
//!
//! ## Generate a key, sign and verify a JWT
//!
//! ```
//! use bh_jose::{json_object, GenerateKeyRequest, GeneratedKey, JwtEngine, SignRequest, VerifyRequest};
//!
//! # #[tokio::main]
//! # async fn main() -> bh_jose::Result<()> {
//! let engine = JwtEngine::openssl();
//!
//! let GeneratedKey::KeyPair { public_key, private_key } =
//!     engine.generate_key(&GenerateKeyRequest::new("ES256")).await?
//! else {
//!     unreachable!("ECDSA keys come in pairs");
//! };
//!
//! // EC keys carry no `alg`, so the algorithm is given explicitly
//! let claims = json_object!({ "sub": "abc" });
//! let token = engine
//!     .sign(SignRequest::new(&claims, &private_key).with_alg("ES256"))
//!     .await?;
//!
//! let verified = engine.verify(VerifyRequest::new(&token, &public_key)).await?;
//! assert_eq!(verified, Some(claims));
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "openssl")]
mod openssl_impl;

mod algorithm;
mod backend;
pub mod base64url;
mod capability;
mod compact;
mod engine;
mod error;
pub mod jwk;
mod key_generator;
mod signer;
mod verifier;

#[cfg(test)]
mod test_utils;

pub use algorithm::*;
pub use backend::*;
pub use capability::*;
pub use compact::*;
pub use engine::*;
pub use error::*;
pub use jwk::Jwk;
pub use key_generator::*;
#[cfg(feature = "openssl")]
pub use openssl_impl::*;
pub use signer::*;
pub use verifier::*;

/// Helper macro with the same syntax as [`serde_json::json`] specialized for
/// constructing JSON objects, such as [`Jwk`]-s and claims sets.
///
/// It will construct a more specific type ([`serde_json::Map<String,Value>`])
/// than just [`serde_json::Value`] when constructing an object, and panic if
/// the syntax is valid JSON but not an object.
///
/// [`serde_json::Map<String,Value>`]: serde_json::Map
/// [`serde_json::Value`]: serde_json::Value
#[macro_export]
macro_rules! json_object {
    ($stuff:tt) => {
        match ::serde_json::json!($stuff) {
            ::serde_json::Value::Object(o) => o,
            _ => unreachable!("JSON literal wasn't an object"),
        }
    };
}
