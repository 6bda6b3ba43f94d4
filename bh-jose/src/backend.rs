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

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{algorithm::OperationDescriptor, Jwk};

/// Boxed error type used for the errors of an external [`CryptoBackend`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What an imported or generated key may be used for.
#[derive(
    strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum KeyUsage {
    /// Producing signatures.
    #[strum(to_string = "sign")]
    Sign,
    /// Checking signatures.
    #[strum(to_string = "verify")]
    Verify,
}

/// The output of [`CryptoBackend::generate_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedCryptoKey<K> {
    /// An asymmetric key pair.
    Pair {
        /// The public half, usable for verifying.
        public_key: K,
        /// The private half, usable for signing.
        private_key: K,
    },
    /// A symmetric key, usable for both signing and verifying.
    Secret(K),
}

/// An external cryptographic backend executing the primitives of the engine.
///
/// Every primitive takes an [`OperationDescriptor`] built for the step being
/// performed; a backend must not assume that the descriptor used to import a
/// key is the one later used to sign or verify with it. ECDSA import
/// descriptors carry a curve but no hash, while sign and verify descriptors
/// carry the hash.
///
/// Errors are reported as [`BoxError`]-s; the engine wraps them with the
/// failed phase and keeps the backend error as the source.
pub trait CryptoBackend: Sync {
    /// The backend's handle to imported or generated key material.
    type Key: Send + Sync;

    /// Generates a new key, or key pair, for the descriptor.
    fn generate_key(
        &self,
        descriptor: &OperationDescriptor,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> impl Future<Output = Result<GeneratedCryptoKey<Self::Key>, BoxError>> + Send;

    /// Imports key material given as a JWK.
    fn import_key(
        &self,
        jwk: &Jwk,
        descriptor: &OperationDescriptor,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> impl Future<Output = Result<Self::Key, BoxError>> + Send;

    /// Exports key material as a JWK.
    fn export_key(&self, key: &Self::Key) -> impl Future<Output = Result<Jwk, BoxError>> + Send;

    /// Signs the `data`, returning the raw JWS signature bytes.
    fn sign(
        &self,
        descriptor: &OperationDescriptor,
        key: &Self::Key,
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, BoxError>> + Send;

    /// Checks the raw JWS `signature` over the `data`.
    ///
    /// # Return
    /// Returns `Ok(true)` if the signature is valid, `Ok(false)` if it isn't,
    /// and `Err(_)` when the backend itself fails for any other reason.
    fn verify(
        &self,
        descriptor: &OperationDescriptor,
        key: &Self::Key,
        signature: &[u8],
        data: &[u8],
    ) -> impl Future<Output = Result<bool, BoxError>> + Send;
}
