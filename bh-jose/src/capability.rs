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

//! Which algorithms and operations an environment can execute.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;

/// An operation the engine performs with an algorithm.
#[derive(
    strum_macros::Display,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    /// Generating a key, or key pair, for the algorithm.
    #[strum(to_string = "generateKey")]
    GenerateKey,
    /// Signing a claims set.
    #[strum(to_string = "sign")]
    Sign,
    /// Verifying a signed token.
    #[strum(to_string = "verify")]
    Verify,
}

impl Operation {
    /// Every operation.
    pub const ALL: [Operation; 3] = [Operation::GenerateKey, Operation::Sign, Operation::Verify];
}

/// The per-environment table of which algorithms support which operations.
///
/// Built once, read-only afterwards. Deserializes from a JSON object keyed
/// by `alg`, e.g. `{"HS256": ["sign", "verify"]}`; unknown `alg` keys are
/// rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupportMatrix(BTreeMap<Algorithm, BTreeSet<Operation>>);

impl SupportMatrix {
    /// Every registered algorithm with every operation.
    pub fn full() -> Self {
        Self::with_all_operations(Algorithm::ALL)
    }

    /// The subset available in constrained runtimes: `HS256`, `HS384`,
    /// `RS256` and `RS384`.
    pub fn constrained() -> Self {
        Self::with_all_operations([
            Algorithm::Hs256,
            Algorithm::Hs384,
            Algorithm::Rs256,
            Algorithm::Rs384,
        ])
    }

    /// The subset available through OS and hardware key stores: the RSA and
    /// HMAC algorithms, without ECDSA.
    pub fn hardware_backed() -> Self {
        Self::with_all_operations([
            Algorithm::Rs256,
            Algorithm::Rs384,
            Algorithm::Rs512,
            Algorithm::Hs256,
            Algorithm::Hs384,
            Algorithm::Hs512,
        ])
    }

    /// Every given algorithm with every operation.
    pub fn with_all_operations(algorithms: impl IntoIterator<Item = Algorithm>) -> Self {
        algorithms
            .into_iter()
            .map(|alg| (alg, Operation::ALL))
            .collect()
    }

    /// Whether the `alg` supports the operation. Unknown algorithms support
    /// nothing.
    pub fn allows(&self, alg: &str, operation: Operation) -> bool {
        Algorithm::lookup(alg)
            .and_then(|alg| self.0.get(&alg))
            .is_some_and(|operations| operations.contains(&operation))
    }

    /// Answers a capability query mapping each `alg` to the operations
    /// needed for it.
    ///
    /// True iff every requested operation of every `alg` in the query is
    /// supported. An empty query asks for nothing and is therefore
    /// supported.
    pub fn supports<I, A, O>(&self, query: I) -> bool
    where
        I: IntoIterator<Item = (A, O)>,
        A: AsRef<str>,
        O: AsRef<[Operation]>,
    {
        query.into_iter().all(|(alg, operations)| {
            operations
                .as_ref()
                .iter()
                .all(|operation| self.allows(alg.as_ref(), *operation))
        })
    }

    /// The algorithms supporting the operation, in registry order.
    pub fn algorithms_for(&self, operation: Operation) -> Vec<Algorithm> {
        self.0
            .iter()
            .filter(|(_, operations)| operations.contains(&operation))
            .map(|(alg, _)| *alg)
            .collect()
    }
}

impl<O> FromIterator<(Algorithm, O)> for SupportMatrix
where
    O: IntoIterator<Item = Operation>,
{
    fn from_iter<T: IntoIterator<Item = (Algorithm, O)>>(iter: T) -> Self {
        let mut matrix = BTreeMap::<Algorithm, BTreeSet<Operation>>::new();
        for (alg, operations) in iter {
            matrix.entry(alg).or_default().extend(operations);
        }
        Self(matrix)
    }
}

/// A named deployment environment and what its backend can execute.
///
/// The name shows up verbatim in "cannot generate / sign / verify" errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Name of the environment, e.g. `openssl`.
    pub name: String,
    /// Algorithms and operations the environment supports.
    pub supported_algorithms: SupportMatrix,
}

impl Environment {
    /// Creates a new environment.
    pub fn new(name: impl Into<String>, supported_algorithms: SupportMatrix) -> Self {
        Self {
            name: name.into(),
            supported_algorithms,
        }
    }

    /// The environment of the bundled OpenSSL backend, supporting every
    /// registered algorithm.
    pub fn openssl() -> Self {
        Self::new("openssl", SupportMatrix::full())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_matrix_supports_everything() {
        let matrix = SupportMatrix::full();

        for alg in Algorithm::ALL {
            assert!(matrix.supports([(alg.as_str(), Operation::ALL)]));
        }
        assert_eq!(matrix.algorithms_for(Operation::Verify), Algorithm::ALL);
    }

    #[test]
    fn constrained_matrix_is_a_subset() {
        let matrix = SupportMatrix::constrained();

        assert!(matrix.supports([("HS384", [Operation::Sign, Operation::Verify])]));
        assert!(!matrix.supports([("HS512", [Operation::Sign])]));
        assert!(!matrix.supports([("ES256", [Operation::GenerateKey])]));
        assert_eq!(
            matrix.algorithms_for(Operation::GenerateKey),
            vec![
                Algorithm::Hs256,
                Algorithm::Hs384,
                Algorithm::Rs256,
                Algorithm::Rs384
            ]
        );
    }

    #[test]
    fn hardware_backed_matrix_has_no_ecdsa() {
        let matrix = SupportMatrix::hardware_backed();

        assert!(matrix.supports([("RS512", [Operation::Sign])]));
        assert!(matrix.supports([("HS512", [Operation::Verify])]));
        for alg in ["ES256", "ES384", "ES512"] {
            assert!(!matrix.supports([(alg, [Operation::Verify])]));
        }
    }

    #[test]
    fn unknown_algorithms_are_unsupported() {
        let matrix = SupportMatrix::full();

        assert!(!matrix.supports([("nonexistent", [Operation::GenerateKey])]));
        assert!(!matrix.supports([("none", [Operation::Verify])]));
    }

    #[test]
    fn every_key_and_operation_must_be_supported() {
        let matrix: SupportMatrix = [
            (Algorithm::Hs256, vec![Operation::Sign, Operation::Verify]),
            (Algorithm::Rs256, vec![Operation::Verify]),
        ]
        .into_iter()
        .collect();

        assert!(matrix.supports([("HS256", vec![Operation::Sign]), ("RS256", vec![Operation::Verify])]));
        assert!(!matrix.supports([("HS256", vec![Operation::Sign]), ("RS256", vec![Operation::Sign])]));
        assert!(!matrix.supports([("RS256", vec![Operation::Verify]), ("ES256", vec![Operation::Verify])]));
        assert!(!matrix.supports([("HS256", vec![Operation::Sign, Operation::GenerateKey])]));
    }

    #[test]
    fn empty_queries_are_supported() {
        let query: [(&str, Vec<Operation>); 0] = [];

        assert!(SupportMatrix::default().supports(query));
        assert!(SupportMatrix::full().supports([("HS256", Vec::<Operation>::new())]));
    }

    #[test]
    fn environment_deserializes_from_json() {
        let environment: Environment = serde_json::from_str(
            r#"{
                "name": "browser",
                "supported_algorithms": {
                    "HS256": ["generateKey", "sign", "verify"],
                    "RS256": ["verify"]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(environment.name, "browser");
        assert!(environment
            .supported_algorithms
            .supports([("HS256", Operation::ALL)]));
        assert!(environment
            .supported_algorithms
            .supports([("RS256", [Operation::Verify])]));
        assert!(!environment
            .supported_algorithms
            .supports([("RS256", [Operation::Sign])]));
    }

    #[test]
    fn unknown_algorithms_are_rejected_when_deserializing() {
        let result = serde_json::from_str::<SupportMatrix>(r#"{"PS256": ["sign"]}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<SupportMatrix>(r#"{"HS256": ["encrypt"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn operations_use_their_protocol_names() {
        assert_eq!(Operation::GenerateKey.to_string(), "generateKey");
        assert_eq!(
            serde_json::to_string(&Operation::GenerateKey).unwrap(),
            "\"generateKey\""
        );
        assert_eq!(Environment::openssl().name, "openssl");
    }
}
