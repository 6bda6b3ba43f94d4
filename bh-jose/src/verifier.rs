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

use bherror::{traits::PropagateError as _, Error};
use serde_json::Value;
use tracing::warn;

use crate::{
    algorithm::CryptoStep,
    backend::{CryptoBackend, KeyUsage},
    base64url,
    capability::Operation,
    compact::{ClaimsSet, CompactJwt},
    error::{ForeignMessage as _, JwtError, Result},
    jwk, Jwk, JwtEngine,
};

const ALG_NONE: &str = "none";

/// Parameters of [`JwtEngine::verify`].
///
/// Both members are required; they are optional so that incomplete requests
/// are rejected with a proper error.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyRequest<'a> {
    /// The compact JWS to verify.
    pub token: Option<&'a str>,
    /// The JWK to verify with.
    pub jwk: Option<&'a Jwk>,
}

impl<'a> VerifyRequest<'a> {
    /// Verify the `token` with the `jwk`.
    pub fn new(token: &'a str, jwk: &'a Jwk) -> Self {
        Self {
            token: Some(token),
            jwk: Some(jwk),
        }
    }
}

impl<B: CryptoBackend> JwtEngine<B> {
    /// Verifies the signature of a compact JWS.
    ///
    /// Returns the claims set if the signature is valid and [`None`] if it is
    /// not. The claims themselves are not validated.
    ///
    /// # Errors
    ///
    /// - [`JwtError::MissingTokenOrJwk`] for incomplete requests,
    /// - the errors of [`CompactJwt::parse`], unchanged,
    /// - [`JwtError::UndefinedAlgorithm`] if the header has no `alg` or uses
    ///   `none`,
    /// - [`JwtError::UnsupportedVerification`] if the environment cannot
    ///   verify using the `alg`,
    /// - [`JwtError::AlgorithmMismatch`] if the JWK is bound to another
    ///   `alg`,
    /// - [`JwtError::SignatureNotDecodable`] if the signature segment is not
    ///   `base64url`,
    /// - [`JwtError::KeyImport`] and [`JwtError::Verification`] for backend
    ///   failures.
    pub async fn verify(&self, request: VerifyRequest<'_>) -> Result<Option<ClaimsSet>> {
        let (Some(token), Some(jwk)) = (request.token.filter(|t| !t.is_empty()), request.jwk)
        else {
            return Err(Error::root(JwtError::MissingTokenOrJwk.into()));
        };

        let jwt = CompactJwt::parse(token)?;

        let alg = match jwt.header.alg.as_deref() {
            Some(ALG_NONE) => {
                warn!(environment = %self.environment().name, "rejected a jwt using alg none");
                return Err(Error::root(JwtError::UndefinedAlgorithm.into()));
            }
            Some(alg) => alg,
            None => return Err(Error::root(JwtError::UndefinedAlgorithm.into())),
        };
        self.log_operation(Operation::Verify, alg);
        let algorithm = self.ensure_supported(alg, Operation::Verify)?;

        if let Some(key_alg) = jwk.get("alg") {
            if key_alg.as_str() != Some(alg) {
                return Err(Error::root(
                    JwtError::AlgorithmMismatch {
                        token_alg: alg.to_owned(),
                        key_alg: display_alg(key_alg),
                    }
                    .into(),
                ));
            }
        }

        let jwk = jwk::without_metadata(jwk);
        let key = self
            .backend()
            .import_key(
                &jwk,
                &algorithm.for_operation(CryptoStep::ImportKey(&jwk)),
                true,
                &[KeyUsage::Verify],
            )
            .await
            .message_err(JwtError::KeyImport)?;

        let signature = base64url::decode(&jwt.b64u_signature)
            .with_err(|| crate::Error::Jwt(JwtError::SignatureNotDecodable))?;

        let valid = self
            .backend()
            .verify(
                &algorithm.for_operation(CryptoStep::Operate),
                &key,
                &signature,
                &jwt.signing_input(),
            )
            .await
            .message_err(JwtError::Verification)?;

        Ok(valid.then_some(jwt.claims_set))
    }
}

fn display_alg(alg: &Value) -> String {
    match alg {
        Value::String(alg) => alg.clone(),
        other => other.to_string(),
    }
}
