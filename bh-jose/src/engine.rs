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
use tracing::{debug, trace};

use crate::{
    algorithm::{Algorithm, AlgorithmDescriptor},
    capability::{Environment, Operation},
    compact::{ClaimsSet, CompactJwt},
    error::{JwtError, Result},
    CryptoBackend,
};

/// The JWT engine: decoding, key generation, signing and verification of
/// compact JWS over a [`CryptoBackend`].
///
/// The engine refuses any operation its [`Environment`] does not list as
/// supported, before the backend is involved. It holds no mutable state, so
/// a single instance can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct JwtEngine<B> {
    environment: Environment,
    backend: B,
}

impl<B: CryptoBackend> JwtEngine<B> {
    /// Creates an engine executing the operations the `environment` supports
    /// with the `backend`.
    pub fn new(environment: Environment, backend: B) -> Self {
        Self {
            environment,
            backend,
        }
    }

    /// The environment of the engine.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// The backend of the engine.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Answers a capability query, see
    /// [`SupportMatrix::supports`](crate::SupportMatrix::supports).
    pub async fn supports<I, A, O>(&self, query: I) -> bool
    where
        I: IntoIterator<Item = (A, O)>,
        A: AsRef<str>,
        O: AsRef<[Operation]>,
    {
        self.environment.supported_algorithms.supports(query)
    }

    /// The algorithms the environment supports for the operation, in registry
    /// order.
    pub fn supported_algorithms(&self, operation: Operation) -> Vec<Algorithm> {
        self.environment
            .supported_algorithms
            .algorithms_for(operation)
    }

    /// Decodes a compact JWT without verifying it.
    ///
    /// See [`CompactJwt::parse`] for the errors.
    pub async fn decode(&self, token: &str) -> Result<CompactJwt> {
        CompactJwt::parse(token)
    }

    /// Decodes a compact JWT without verifying it, returning only its claims
    /// set.
    pub async fn decode_claims(&self, token: &str) -> Result<ClaimsSet> {
        Ok(CompactJwt::parse(token)?.claims_set)
    }

    /// Returns the registry entry of the `alg` if the environment supports
    /// the operation for it.
    pub(crate) fn ensure_supported(
        &self,
        alg: &str,
        operation: Operation,
    ) -> Result<&'static AlgorithmDescriptor> {
        let supported = self
            .environment
            .supported_algorithms
            .allows(alg, operation);

        trace!(
            environment = %self.environment.name,
            alg,
            %operation,
            supported,
            "capability query"
        );

        match Algorithm::lookup(alg) {
            Some(algorithm) if supported => Ok(algorithm.descriptor()),
            _ => Err(Error::root(self.unsupported(alg, operation).into())),
        }
    }

    fn unsupported(&self, alg: &str, operation: Operation) -> JwtError {
        let environment = self.environment.name.clone();
        let alg = alg.to_owned();

        match operation {
            Operation::GenerateKey => JwtError::UnsupportedKeyGeneration { environment, alg },
            Operation::Sign => JwtError::UnsupportedSigning { environment, alg },
            Operation::Verify => JwtError::UnsupportedVerification { environment, alg },
        }
    }

    pub(crate) fn log_operation(&self, operation: Operation, alg: &str) {
        debug!(environment = %self.environment.name, alg, %operation, "jwt operation");
    }
}
