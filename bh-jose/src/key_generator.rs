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

use bherror::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    algorithm::{AlgorithmFamily, CryptoStep, EcCurve, KeyParams},
    backend::{CryptoBackend, GeneratedCryptoKey, KeyUsage},
    capability::Operation,
    error::{ForeignMessage as _, JwtError, Result},
    JwtEngine, Jwk,
};

/// Parameters of [`JwtEngine::generate_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateKeyRequest {
    /// The algorithm the key is generated for.
    pub alg: String,
    /// Overrides of the algorithm's key generation defaults.
    pub params: KeyParams,
}

impl GenerateKeyRequest {
    /// Request a key for the `alg` with the default parameters.
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            params: KeyParams::default(),
        }
    }

    /// Use the curve for ECDSA keys.
    pub fn with_named_curve(mut self, named_curve: EcCurve) -> Self {
        self.params.named_curve = Some(named_curve);
        self
    }

    /// Use the modulus length, in bits, for RSA keys.
    pub fn with_modulus_length(mut self, modulus_length: u32) -> Self {
        self.params.modulus_length = Some(modulus_length);
        self
    }

    /// Use the big-endian public exponent for RSA keys.
    pub fn with_public_exponent(mut self, public_exponent: Vec<u8>) -> Self {
        self.params.public_exponent = Some(public_exponent);
        self
    }
}

/// A freshly generated key, exported as JWK.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratedKey {
    /// The key pair of an asymmetric algorithm.
    #[serde(rename_all = "camelCase")]
    KeyPair {
        /// The public key, for verifying.
        public_key: Jwk,
        /// The private key, for signing.
        private_key: Jwk,
    },
    /// The shared key of an HMAC algorithm, for both signing and verifying.
    #[serde(rename_all = "camelCase")]
    Shared {
        /// The shared key.
        shared_key: Jwk,
    },
}

impl<B: CryptoBackend> JwtEngine<B> {
    /// Generates a key for the requested algorithm.
    ///
    /// HMAC algorithms produce a [`GeneratedKey::Shared`] key carrying
    /// `key_ops` `["sign", "verify"]`; the others produce a
    /// [`GeneratedKey::KeyPair`].
    ///
    /// # Errors
    ///
    /// - [`JwtError::UnsupportedKeyGeneration`] if the environment cannot
    ///   generate keys for the `alg`,
    /// - [`JwtError::KeyGeneration`] if the backend fails to generate the key,
    /// - [`JwtError::KeyExport`] if the backend fails to export it.
    pub async fn generate_key(&self, request: &GenerateKeyRequest) -> Result<GeneratedKey> {
        self.log_operation(Operation::GenerateKey, &request.alg);
        let algorithm = self.ensure_supported(&request.alg, Operation::GenerateKey)?;

        let descriptor = algorithm.for_operation(CryptoStep::GenerateKey(&request.params));
        let generated = self
            .backend()
            .generate_key(&descriptor, true, &[KeyUsage::Sign, KeyUsage::Verify])
            .await
            .message_err(JwtError::KeyGeneration)?;

        match (algorithm.family, generated) {
            (AlgorithmFamily::Hmac, GeneratedCryptoKey::Secret(key)) => {
                let mut shared_key = self.export(&key).await?;
                shared_key
                    .entry("key_ops")
                    .or_insert_with(|| Value::from(vec!["sign", "verify"]));
                Ok(GeneratedKey::Shared { shared_key })
            }
            (
                AlgorithmFamily::RsassaPkcs1V15 | AlgorithmFamily::Ecdsa,
                GeneratedCryptoKey::Pair {
                    public_key,
                    private_key,
                },
            ) => Ok(GeneratedKey::KeyPair {
                public_key: self.export(&public_key).await?,
                private_key: self.export(&private_key).await?,
            }),
            (family, _) => Err(Error::root(
                JwtError::KeyGeneration(format!(
                    "backend produced the wrong kind of key for {family}"
                ))
                .into(),
            )),
        }
    }

    async fn export(&self, key: &B::Key) -> Result<Jwk> {
        self.backend()
            .export_key(key)
            .await
            .message_err(JwtError::KeyExport)
    }
}
