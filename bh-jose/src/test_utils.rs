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

use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    algorithm::{Algorithm, AlgorithmFamily, OperationDescriptor},
    backend::{BoxError, CryptoBackend, GeneratedCryptoKey, KeyUsage},
    json_object, jwk, Jwk,
};

/// A primitive invocation seen by the [`SymbolicBackend`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    GenerateKey {
        descriptor: OperationDescriptor,
        extractable: bool,
        usages: Vec<KeyUsage>,
    },
    ImportKey {
        descriptor: OperationDescriptor,
        extractable: bool,
        usages: Vec<KeyUsage>,
    },
    ExportKey,
    Sign {
        descriptor: OperationDescriptor,
    },
    Verify {
        descriptor: OperationDescriptor,
    },
}

/// Primitives the [`SymbolicBackend`] fails, with the failure message.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Failures {
    pub(crate) generate_key: Option<&'static str>,
    pub(crate) import_key: Option<&'static str>,
    pub(crate) export_key: Option<&'static str>,
    pub(crate) sign: Option<&'static str>,
    pub(crate) verify: Option<&'static str>,
}

/// Symbolic signature over the given message with the key identified by the
/// given identity, in lieu of a real signature algorithm.
///
/// Tests over which message and using which key the signature was produced,
/// regardless of any real cryptography.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct StubSignature<'m, 'k>(Cow<'m, [u8]>, Cow<'k, str>);

/// The symbolic backend's key: just its JWK.
#[derive(Debug, Clone)]
pub(crate) struct SymbolicKey(Jwk);

/// An in-memory [`CryptoBackend`] producing symbolic keys and signatures,
/// recording every primitive invocation.
#[derive(Debug, Default)]
pub(crate) struct SymbolicBackend {
    failures: Failures,
    hmac_key_ops: Option<Vec<&'static str>>,
    next_key_id: AtomicUsize,
    calls: Mutex<Vec<Call>>,
    imported_jwks: Mutex<Vec<Jwk>>,
}

impl SymbolicBackend {
    pub(crate) fn failing(failures: Failures) -> Self {
        Self {
            failures,
            ..Default::default()
        }
    }

    /// Generated HMAC keys carry the `key_ops`; by default they carry none.
    pub(crate) fn with_hmac_key_ops(mut self, key_ops: Vec<&'static str>) -> Self {
        self.hmac_key_ops = Some(key_ops);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn imported_jwks(&self) -> Vec<Jwk> {
        self.imported_jwks.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn fail(failure: Option<&'static str>) -> Result<(), BoxError> {
    match failure {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

fn algorithm(descriptor: &OperationDescriptor) -> Result<Algorithm, BoxError> {
    descriptor
        .hash
        .and_then(|hash| Algorithm::from_family_and_hash(descriptor.family, hash))
        .ok_or_else(|| "descriptor names no algorithm".into())
}

fn identity(jwk: &Jwk) -> Result<&str, BoxError> {
    let member = match jwk::key_type(jwk) {
        Some(jwk::KTY_OCT) => "k",
        Some(jwk::KTY_RSA) => "n",
        Some(jwk::KTY_EC) => "x",
        _ => return Err("unknown key type".into()),
    };
    jwk::string_member(jwk, member).ok_or_else(|| format!("missing {member}").into())
}

impl CryptoBackend for SymbolicBackend {
    type Key = SymbolicKey;

    async fn generate_key(
        &self,
        descriptor: &OperationDescriptor,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<GeneratedCryptoKey<SymbolicKey>, BoxError> {
        self.record(Call::GenerateKey {
            descriptor: descriptor.clone(),
            extractable,
            usages: usages.to_vec(),
        });
        fail(self.failures.generate_key)?;

        let id = format!("key-{}", self.next_key_id.fetch_add(1, Ordering::Relaxed));

        let (public_key, identity_member) = match descriptor.family {
            AlgorithmFamily::Hmac => {
                let mut shared_key = json_object!({
                    "kty": "oct",
                    "alg": algorithm(descriptor)?.as_str(),
                    "k": id,
                    "ext": extractable,
                });
                if let Some(key_ops) = &self.hmac_key_ops {
                    shared_key.insert("key_ops".to_owned(), Value::from(key_ops.clone()));
                }
                return Ok(GeneratedCryptoKey::Secret(SymbolicKey(shared_key)));
            }
            AlgorithmFamily::RsassaPkcs1V15 => {
                let public_key = json_object!({
                    "kty": "RSA",
                    "alg": algorithm(descriptor)?.as_str(),
                    "n": id,
                    "e": "AQAB",
                });
                (public_key, "n")
            }
            AlgorithmFamily::Ecdsa => {
                let curve = descriptor.named_curve.ok_or("descriptor names no curve")?;
                let public_key = json_object!({
                    "kty": "EC",
                    "crv": curve.as_str(),
                    "x": id,
                    "y": id,
                });
                (public_key, "x")
            }
        };
        let mut private_key = public_key.clone();
        private_key.insert("d".to_owned(), public_key[identity_member].clone());

        Ok(GeneratedCryptoKey::Pair {
            public_key: SymbolicKey(with_ops(public_key, "verify", true)),
            private_key: SymbolicKey(with_ops(private_key, "sign", extractable)),
        })
    }

    async fn import_key(
        &self,
        jwk: &Jwk,
        descriptor: &OperationDescriptor,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Result<SymbolicKey, BoxError> {
        self.record(Call::ImportKey {
            descriptor: descriptor.clone(),
            extractable,
            usages: usages.to_vec(),
        });
        fail(self.failures.import_key)?;

        self.imported_jwks.lock().unwrap().push(jwk.clone());
        Ok(SymbolicKey(jwk.clone()))
    }

    async fn export_key(&self, key: &SymbolicKey) -> Result<Jwk, BoxError> {
        self.record(Call::ExportKey);
        fail(self.failures.export_key)?;

        Ok(key.0.clone())
    }

    async fn sign(
        &self,
        descriptor: &OperationDescriptor,
        key: &SymbolicKey,
        data: &[u8],
    ) -> Result<Vec<u8>, BoxError> {
        self.record(Call::Sign {
            descriptor: descriptor.clone(),
        });
        fail(self.failures.sign)?;

        if jwk::key_type(&key.0) != Some(jwk::KTY_OCT) && !key.0.contains_key("d") {
            return Err("not a private key".into());
        }

        let signature = StubSignature(data.into(), identity(&key.0)?.into());
        Ok(serde_json::to_vec(&signature)?)
    }

    async fn verify(
        &self,
        descriptor: &OperationDescriptor,
        key: &SymbolicKey,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool, BoxError> {
        self.record(Call::Verify {
            descriptor: descriptor.clone(),
        });
        fail(self.failures.verify)?;

        let Ok(signature) = serde_json::from_slice::<StubSignature>(signature) else {
            return Ok(false);
        };
        Ok(signature == StubSignature(data.into(), identity(&key.0)?.into()))
    }
}

fn with_ops(mut jwk: Jwk, operation: &str, extractable: bool) -> Jwk {
    jwk.insert("key_ops".to_owned(), Value::from(vec![operation]));
    jwk.insert("ext".to_owned(), Value::from(extractable));
    jwk
}
