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

use bherror::{traits::ForeignError as _, Error};
use serde::Serialize;

use crate::{
    algorithm::CryptoStep,
    backend::{CryptoBackend, KeyUsage},
    base64url,
    capability::Operation,
    compact::{signing_input, JwsHeader},
    error::{ForeignMessage as _, JwtError, Result},
    jwk, Jwk, JwtEngine,
};

/// Parameters of [`JwtEngine::sign`].
///
/// The claims and the JWK are optional so that incomplete requests coming
/// from loosely typed callers are rejected with a proper error.
#[derive(Debug)]
pub struct SignRequest<'a, C: ?Sized> {
    /// The claims set to sign; anything serializing to JSON.
    pub claims: Option<&'a C>,
    /// The JWK to sign with.
    pub jwk: Option<&'a Jwk>,
    /// The algorithm to sign with. Defaults to the `alg` of the JWK.
    pub alg: Option<&'a str>,
}

impl<'a, C: ?Sized> SignRequest<'a, C> {
    /// Sign the `claims` with the `jwk`, using the JWK's `alg`.
    pub fn new(claims: &'a C, jwk: &'a Jwk) -> Self {
        Self {
            claims: Some(claims),
            jwk: Some(jwk),
            alg: None,
        }
    }

    /// Sign using the `alg` instead of the JWK's `alg`.
    ///
    /// Required for JWKs without an `alg`, such as exported ECDSA keys.
    pub fn with_alg(mut self, alg: &'a str) -> Self {
        self.alg = Some(alg);
        self
    }
}

impl<C: ?Sized> Default for SignRequest<'_, C> {
    fn default() -> Self {
        Self {
            claims: None,
            jwk: None,
            alg: None,
        }
    }
}

impl<C: ?Sized> Clone for SignRequest<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for SignRequest<'_, C> {}

impl<B: CryptoBackend> JwtEngine<B> {
    /// Signs the claims set, returning the compact JWS.
    ///
    /// The JOSE header holds the `alg` and nothing else.
    ///
    /// # Errors
    ///
    /// In the order they are checked:
    /// - [`JwtError::AlgRequired`] if neither the request nor the JWK names
    ///   an `alg`,
    /// - [`JwtError::UnsupportedSigning`] if the environment cannot sign
    ///   using the `alg`,
    /// - [`JwtError::MissingClaims`] and [`JwtError::MissingJwk`] for
    ///   incomplete requests,
    /// - [`JwtError::StringifyClaims`] if the claims do not serialize to
    ///   JSON,
    /// - [`JwtError::KeyImport`] and [`JwtError::Signing`] for backend
    ///   failures.
    pub async fn sign<C>(&self, request: SignRequest<'_, C>) -> Result<String>
    where
        C: Serialize + ?Sized,
    {
        let Some(alg) = request.alg.or_else(|| request.jwk.and_then(jwk::algorithm)) else {
            return Err(Error::root(JwtError::AlgRequired.into()));
        };
        self.log_operation(Operation::Sign, alg);
        let algorithm = self.ensure_supported(alg, Operation::Sign)?;

        let Some(claims) = request.claims else {
            return Err(Error::root(JwtError::MissingClaims.into()));
        };
        let Some(jwk) = request.jwk else {
            return Err(Error::root(JwtError::MissingJwk.into()));
        };

        let header = serde_json::to_string(&JwsHeader::new(alg))
            .foreign_err(|| crate::Error::Jwt(JwtError::EncodeHeader))?;
        let claims = serde_json::to_string(claims).message_err(JwtError::StringifyClaims)?;

        let b64u_header = base64url::encode(header);
        let b64u_claims_set = base64url::encode(claims);

        let key = self
            .backend()
            .import_key(
                jwk,
                &algorithm.for_operation(CryptoStep::ImportKey(jwk)),
                false,
                &[KeyUsage::Sign],
            )
            .await
            .message_err(JwtError::KeyImport)?;

        let signature = self
            .backend()
            .sign(
                &algorithm.for_operation(CryptoStep::Operate),
                &key,
                &signing_input(&b64u_header, &b64u_claims_set),
            )
            .await
            .message_err(JwtError::Signing)?;

        Ok(format!(
            "{b64u_header}.{b64u_claims_set}.{}",
            base64url::encode(signature)
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert_matches::assert_matches;
    use serde_json::Value;

    use super::*;
    use crate::{
        algorithm::{AlgorithmFamily, EcCurve, HashAlgorithm, OperationDescriptor},
        capability::{Environment, SupportMatrix},
        json_object,
        test_utils::{Call, Failures, SymbolicBackend},
        CompactJwt, Error as JoseError, GenerateKeyRequest, GeneratedKey,
    };

    fn full_engine(backend: SymbolicBackend) -> JwtEngine<SymbolicBackend> {
        JwtEngine::new(Environment::new("test", SupportMatrix::full()), backend)
    }

    async fn private_key(engine: &JwtEngine<SymbolicBackend>, alg: &str) -> Jwk {
        match engine
            .generate_key(&GenerateKeyRequest::new(alg))
            .await
            .unwrap()
        {
            GeneratedKey::KeyPair { private_key, .. } => private_key,
            GeneratedKey::Shared { shared_key } => shared_key,
        }
    }

    #[tokio::test]
    async fn produces_a_compact_jws_with_a_minimal_header() {
        let engine = full_engine(SymbolicBackend::default());
        let jwk = private_key(&engine, "RS256").await;
        let claims = json_object!({ "sub": "abc" });

        let token = engine.sign(SignRequest::new(&claims, &jwk)).await.unwrap();

        let jwt = CompactJwt::parse(&token).unwrap();
        assert_eq!(jwt.header, JwsHeader::new("RS256"));
        assert_eq!(
            base64url::decode_to_string(&jwt.b64u_header).unwrap(),
            r#"{"alg":"RS256"}"#
        );
        assert_eq!(jwt.claims_set, claims);
        assert!(!jwt.b64u_signature.is_empty());
    }

    #[tokio::test]
    async fn signs_any_serializable_claims() {
        #[derive(Serialize)]
        struct Claims<'a> {
            iss: &'a str,
            iat: u64,
        }

        let engine = full_engine(SymbolicBackend::default());
        let jwk = private_key(&engine, "HS384").await;

        let token = engine
            .sign(SignRequest::new(&Claims { iss: "me", iat: 7 }, &jwk))
            .await
            .unwrap();

        let jwt = CompactJwt::parse(&token).unwrap();
        assert_eq!(jwt.claims_set, json_object!({ "iss": "me", "iat": 7 }));
    }

    #[tokio::test]
    async fn ec_import_takes_the_curve_and_signing_takes_the_hash() {
        let engine = full_engine(SymbolicBackend::default());
        let jwk = private_key(&engine, "ES384").await;
        assert!(!jwk.contains_key("alg"));
        let claims = json_object!({});

        engine
            .sign(SignRequest::new(&claims, &jwk).with_alg("ES384"))
            .await
            .unwrap();

        let calls = engine.backend().calls();
        assert_matches!(
            &calls[calls.len() - 2..],
            [
                Call::ImportKey { descriptor: import, extractable: false, usages: import_usages },
                Call::Sign { descriptor: operate },
            ] => {
                assert_eq!(import, &OperationDescriptor {
                    family: AlgorithmFamily::Ecdsa,
                    hash: None,
                    named_curve: Some(EcCurve::P256),
                    modulus_length: None,
                    public_exponent: None,
                });
                assert_eq!(import_usages, &vec![KeyUsage::Sign]);
                assert_eq!(operate, &OperationDescriptor {
                    family: AlgorithmFamily::Ecdsa,
                    hash: Some(HashAlgorithm::Sha384),
                    named_curve: None,
                    modulus_length: None,
                    public_exponent: None,
                });
            }
        );
    }

    #[tokio::test]
    async fn explicit_alg_wins_over_the_jwk() {
        let engine = full_engine(SymbolicBackend::default());
        let jwk = private_key(&engine, "HS256").await;
        let claims = json_object!({});

        let token = engine
            .sign(SignRequest::new(&claims, &jwk).with_alg("HS512"))
            .await
            .unwrap();

        let jwt = CompactJwt::parse(&token).unwrap();
        assert_eq!(jwt.header.alg.as_deref(), Some("HS512"));
    }

    #[tokio::test]
    async fn alg_is_required_before_anything_else() {
        let engine = JwtEngine::new(
            Environment::new("empty", SupportMatrix::default()),
            SymbolicBackend::default(),
        );
        let jwk = json_object!({ "kty": "EC", "crv": "P-256" });
        let claims = json_object!({});

        let error = engine
            .sign(SignRequest::new(&claims, &jwk))
            .await
            .unwrap_err();
        assert_eq!(error.error, JoseError::Jwt(JwtError::AlgRequired));
        assert_eq!(error.to_string(), "An alg is required to sign using a jwk");

        let error = engine
            .sign(SignRequest::<Value>::default())
            .await
            .unwrap_err();
        assert_eq!(error.error, JoseError::Jwt(JwtError::AlgRequired));
    }

    #[tokio::test]
    async fn capability_is_checked_before_the_request() {
        let engine = JwtEngine::new(
            Environment::new("browser", SupportMatrix::constrained()),
            SymbolicBackend::default(),
        );

        let request = SignRequest::<Value> {
            alg: Some("ES256"),
            ..Default::default()
        };
        let error = engine.sign(request).await.unwrap_err();

        assert_eq!(error.to_string(), "jwt in browser cannot sign using ES256");
        assert!(engine.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn claims_then_jwk_are_required() {
        let engine = full_engine(SymbolicBackend::default());
        let jwk = json_object!({ "kty": "oct", "alg": "HS256", "k": "c2VjcmV0" });

        let request = SignRequest::<Value> {
            jwk: Some(&jwk),
            ..Default::default()
        };
        let error = engine.sign(request).await.unwrap_err();
        assert_eq!(error.to_string(), "Must provide claims to sign");

        let claims = json_object!({});
        let request = SignRequest {
            claims: Some(&claims),
            alg: Some("HS256"),
            ..Default::default()
        };
        let error = engine.sign(request).await.unwrap_err();
        assert_eq!(error.to_string(), "Must provide a jwk to sign with");

        assert!(engine.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn unserializable_claims_are_rejected() {
        let engine = full_engine(SymbolicBackend::default());
        let jwk = json_object!({ "kty": "oct", "alg": "HS256", "k": "c2VjcmV0" });
        let claims = BTreeMap::from([((1, 2), "tuple keys are not JSON")]);

        let error = engine
            .sign(SignRequest::new(&claims, &jwk))
            .await
            .unwrap_err();

        assert_matches!(error.error, JoseError::Jwt(JwtError::StringifyClaims(_)));
        assert!(error.to_string().starts_with("Unable to stringify claims: "));
        assert!(engine.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn backend_failures_are_wrapped() {
        let jwk = json_object!({ "kty": "oct", "alg": "HS256", "k": "c2VjcmV0" });
        let claims = json_object!({ "sub": "abc" });

        let engine = full_engine(SymbolicBackend::failing(Failures {
            import_key: Some("unsupported key"),
            ..Default::default()
        }));
        let error = engine
            .sign(SignRequest::new(&claims, &jwk))
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Unable to import key: unsupported key");

        let engine = full_engine(SymbolicBackend::failing(Failures {
            sign: Some("device locked"),
            ..Default::default()
        }));
        let error = engine
            .sign(SignRequest::new(&claims, &jwk))
            .await
            .unwrap_err();
        assert_eq!(
            error.error,
            JoseError::Jwt(JwtError::Signing("device locked".to_owned()))
        );
        assert_eq!(error.to_string(), "Unable to sign the claims: device locked");
    }
}
