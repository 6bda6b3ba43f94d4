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

//! The algorithm registry.
//!
//! Every supported JWS `alg` maps to one immutable, backend-neutral
//! [`AlgorithmDescriptor`]. Backends never see the registry entry itself;
//! each call derives a fresh [`OperationDescriptor`] for the step it is
//! about to perform via [`AlgorithmDescriptor::for_operation`].

use std::str::FromStr;

use bherror::Error;
use serde::{Deserialize, Serialize};

use crate::{error::JwtError, jwk, Jwk};

/// JWS `"alg"` header parameter value for **HMAC using SHA-256**, as
/// specified in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
pub const ALG_HS256: &str = "HS256";
/// JWS `"alg"` header parameter value for **HMAC using SHA-384**.
pub const ALG_HS384: &str = "HS384";
/// JWS `"alg"` header parameter value for **HMAC using SHA-512**.
pub const ALG_HS512: &str = "HS512";
/// JWS `"alg"` header parameter value for **RSASSA-PKCS1-v1_5 using
/// SHA-256**, as specified in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
pub const ALG_RS256: &str = "RS256";
/// JWS `"alg"` header parameter value for **RSASSA-PKCS1-v1_5 using
/// SHA-384**.
pub const ALG_RS384: &str = "RS384";
/// JWS `"alg"` header parameter value for **RSASSA-PKCS1-v1_5 using
/// SHA-512**.
pub const ALG_RS512: &str = "RS512";
/// JWS `"alg"` header parameter value for **ECDSA using P-256 and SHA-256**,
/// as specified in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
pub const ALG_ES256: &str = "ES256";
/// JWS `"alg"` header parameter value for **ECDSA using P-384 and SHA-384**.
pub const ALG_ES384: &str = "ES384";
/// JWS `"alg"` header parameter value for **ECDSA using P-521 and SHA-512**.
pub const ALG_ES512: &str = "ES512";

/// Default RSA modulus length, in bits.
pub const DEFAULT_MODULUS_LENGTH: u32 = 2048;

/// Default RSA public exponent (65537), big-endian.
pub const DEFAULT_PUBLIC_EXPONENT: [u8; 3] = [0x01, 0x00, 0x01];

/// Default curve of ECDSA keys, whatever the `alg`.
pub const DEFAULT_NAMED_CURVE: EcCurve = EcCurve::P256;

/// The JWS signature algorithms known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Algorithm {
    /// HMAC using SHA-256
    Hs256,
    /// HMAC using SHA-384
    Hs384,
    /// HMAC using SHA-512
    Hs512,
    /// RSASSA-PKCS1-v1_5 using SHA-256
    Rs256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    Rs384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    Rs512,
    /// ECDSA using P-256 and SHA-256
    Es256,
    /// ECDSA using P-384 and SHA-384
    Es384,
    /// ECDSA using P-521 and SHA-512
    Es512,
}

impl Algorithm {
    /// Every registered algorithm, in registry order.
    pub const ALL: [Algorithm; 9] = [
        Algorithm::Hs256,
        Algorithm::Hs384,
        Algorithm::Hs512,
        Algorithm::Rs256,
        Algorithm::Rs384,
        Algorithm::Rs512,
        Algorithm::Es256,
        Algorithm::Es384,
        Algorithm::Es512,
    ];

    /// Look up an `alg` identifier in the registry.
    ///
    /// Returns [`None`] for identifiers the registry does not know, which
    /// includes `none`.
    pub fn lookup(alg: &str) -> Option<Self> {
        match alg {
            ALG_HS256 => Some(Self::Hs256),
            ALG_HS384 => Some(Self::Hs384),
            ALG_HS512 => Some(Self::Hs512),
            ALG_RS256 => Some(Self::Rs256),
            ALG_RS384 => Some(Self::Rs384),
            ALG_RS512 => Some(Self::Rs512),
            ALG_ES256 => Some(Self::Es256),
            ALG_ES384 => Some(Self::Es384),
            ALG_ES512 => Some(Self::Es512),
            _ => None,
        }
    }

    /// The JWS `alg` identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hs256 => ALG_HS256,
            Self::Hs384 => ALG_HS384,
            Self::Hs512 => ALG_HS512,
            Self::Rs256 => ALG_RS256,
            Self::Rs384 => ALG_RS384,
            Self::Rs512 => ALG_RS512,
            Self::Es256 => ALG_ES256,
            Self::Es384 => ALG_ES384,
            Self::Es512 => ALG_ES512,
        }
    }

    /// The registry entry of this algorithm.
    pub fn descriptor(&self) -> &'static AlgorithmDescriptor {
        match self {
            Self::Hs256 => &HS256,
            Self::Hs384 => &HS384,
            Self::Hs512 => &HS512,
            Self::Rs256 => &RS256,
            Self::Rs384 => &RS384,
            Self::Rs512 => &RS512,
            Self::Es256 => &ES256,
            Self::Es384 => &ES384,
            Self::Es512 => &ES512,
        }
    }

    /// Find the algorithm of the given family and hash.
    ///
    /// ECDSA is deliberately absent: the `alg` of an ECDSA key cannot be told
    /// from the family and hash alone, and ECDSA JWKs do not carry one.
    pub fn from_family_and_hash(family: AlgorithmFamily, hash: HashAlgorithm) -> Option<Self> {
        match (family, hash) {
            (AlgorithmFamily::Hmac, HashAlgorithm::Sha256) => Some(Self::Hs256),
            (AlgorithmFamily::Hmac, HashAlgorithm::Sha384) => Some(Self::Hs384),
            (AlgorithmFamily::Hmac, HashAlgorithm::Sha512) => Some(Self::Hs512),
            (AlgorithmFamily::RsassaPkcs1V15, HashAlgorithm::Sha256) => Some(Self::Rs256),
            (AlgorithmFamily::RsassaPkcs1V15, HashAlgorithm::Sha384) => Some(Self::Rs384),
            (AlgorithmFamily::RsassaPkcs1V15, HashAlgorithm::Sha512) => Some(Self::Rs512),
            (AlgorithmFamily::Ecdsa, _) => None,
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error<crate::Error>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::lookup(value).ok_or_else(|| {
            Error::root(crate::Error::Jwt(JwtError::UnrecognizedAlgorithm(
                value.to_owned(),
            )))
        })
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family of the signature scheme, named as in the WebCrypto API.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Keyed-hash message authentication, with a shared secret.
    #[strum(to_string = "HMAC")]
    Hmac,
    /// RSA signatures with PKCS #1 v1.5 padding.
    #[strum(to_string = "RSASSA-PKCS1-v1_5")]
    RsassaPkcs1V15,
    /// Elliptic curve signatures.
    #[strum(to_string = "ECDSA")]
    Ecdsa,
}

impl AlgorithmFamily {
    /// The JWK `kty` of keys for this family.
    pub fn key_type(&self) -> &'static str {
        match self {
            Self::Hmac => jwk::KTY_OCT,
            Self::RsassaPkcs1V15 => jwk::KTY_RSA,
            Self::Ecdsa => jwk::KTY_EC,
        }
    }
}

/// Hash function of a signature scheme.
#[derive(strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256
    #[strum(to_string = "SHA-256")]
    Sha256,
    /// SHA-384
    #[strum(to_string = "SHA-384")]
    Sha384,
    /// SHA-512
    #[strum(to_string = "SHA-512")]
    Sha512,
}

impl HashAlgorithm {
    /// Block size of the hash function in bytes, which is also the length of
    /// freshly generated HMAC keys.
    pub fn block_size(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha384 | Self::Sha512 => 128,
        }
    }
}

/// Named elliptic curves, with their JWK `crv` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcCurve {
    /// NIST P-256, a.k.a. secp256r1 or prime256v1
    #[serde(rename = "P-256")]
    P256,
    /// NIST P-384, a.k.a. secp384r1
    #[serde(rename = "P-384")]
    P384,
    /// NIST P-521, a.k.a. secp521r1
    #[serde(rename = "P-521")]
    P521,
}

impl EcCurve {
    /// Look up a JWK `crv` value.
    pub fn lookup(crv: &str) -> Option<Self> {
        match crv {
            "P-256" => Some(Self::P256),
            "P-384" => Some(Self::P384),
            "P-521" => Some(Self::P521),
            _ => None,
        }
    }

    /// The JWK `crv` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Length in bytes of a coordinate or scalar on this curve.
    pub fn coordinate_size(&self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

impl std::fmt::Display for EcCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key generation defaults of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDefaults {
    /// HMAC keys have no parameters besides the hash.
    Hmac,
    /// RSA key generation defaults.
    Rsa {
        /// Modulus length in bits.
        modulus_length: u32,
        /// Public exponent, big-endian.
        public_exponent: [u8; 3],
    },
    /// ECDSA key generation defaults.
    Ec {
        /// The curve keys are generated on.
        named_curve: EcCurve,
    },
}

/// Immutable registry entry of an [`Algorithm`].
#[derive(Debug, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    /// The algorithm this entry describes.
    pub alg: Algorithm,
    /// The signature scheme family.
    pub family: AlgorithmFamily,
    /// The hash function used when signing and verifying.
    pub hash: HashAlgorithm,
    /// Key generation defaults.
    pub defaults: KeyDefaults,
}

const RSA_DEFAULTS: KeyDefaults = KeyDefaults::Rsa {
    modulus_length: DEFAULT_MODULUS_LENGTH,
    public_exponent: DEFAULT_PUBLIC_EXPONENT,
};

const EC_DEFAULTS: KeyDefaults = KeyDefaults::Ec {
    named_curve: DEFAULT_NAMED_CURVE,
};

static HS256: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Hs256,
    family: AlgorithmFamily::Hmac,
    hash: HashAlgorithm::Sha256,
    defaults: KeyDefaults::Hmac,
};
static HS384: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Hs384,
    family: AlgorithmFamily::Hmac,
    hash: HashAlgorithm::Sha384,
    defaults: KeyDefaults::Hmac,
};
static HS512: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Hs512,
    family: AlgorithmFamily::Hmac,
    hash: HashAlgorithm::Sha512,
    defaults: KeyDefaults::Hmac,
};
static RS256: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Rs256,
    family: AlgorithmFamily::RsassaPkcs1V15,
    hash: HashAlgorithm::Sha256,
    defaults: RSA_DEFAULTS,
};
static RS384: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Rs384,
    family: AlgorithmFamily::RsassaPkcs1V15,
    hash: HashAlgorithm::Sha384,
    defaults: RSA_DEFAULTS,
};
static RS512: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Rs512,
    family: AlgorithmFamily::RsassaPkcs1V15,
    hash: HashAlgorithm::Sha512,
    defaults: RSA_DEFAULTS,
};
static ES256: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Es256,
    family: AlgorithmFamily::Ecdsa,
    hash: HashAlgorithm::Sha256,
    defaults: EC_DEFAULTS,
};
static ES384: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Es384,
    family: AlgorithmFamily::Ecdsa,
    hash: HashAlgorithm::Sha384,
    defaults: EC_DEFAULTS,
};
static ES512: AlgorithmDescriptor = AlgorithmDescriptor {
    alg: Algorithm::Es512,
    family: AlgorithmFamily::Ecdsa,
    hash: HashAlgorithm::Sha512,
    defaults: EC_DEFAULTS,
};

/// Caller overrides for key generation. Unset fields fall back to the
/// [`KeyDefaults`] of the registry entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyParams {
    /// Curve for ECDSA keys.
    pub named_curve: Option<EcCurve>,
    /// Modulus length in bits for RSA keys.
    pub modulus_length: Option<u32>,
    /// Public exponent, big-endian, for RSA keys.
    pub public_exponent: Option<Vec<u8>>,
}

/// The cryptographic step an [`OperationDescriptor`] is derived for.
#[derive(Debug, Clone, Copy)]
pub enum CryptoStep<'a> {
    /// Generating a new key, with the caller's overrides.
    GenerateKey(&'a KeyParams),
    /// Importing the given JWK.
    ImportKey(&'a Jwk),
    /// Signing or verifying.
    Operate,
}

/// Per-call algorithm parameters handed to a
/// [`CryptoBackend`](crate::CryptoBackend).
///
/// Always derived from a registry entry with
/// [`AlgorithmDescriptor::for_operation`] and owned by a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// The signature scheme family.
    pub family: AlgorithmFamily,
    /// The hash function. Absent for ECDSA key generation and import.
    pub hash: Option<HashAlgorithm>,
    /// The curve, for ECDSA key generation and import.
    pub named_curve: Option<EcCurve>,
    /// The RSA modulus length in bits, for RSA key generation.
    pub modulus_length: Option<u32>,
    /// The RSA public exponent, big-endian, for RSA key generation.
    pub public_exponent: Option<Vec<u8>>,
}

impl AlgorithmDescriptor {
    /// Derive the parameters for one cryptographic step.
    ///
    /// * Key generation: RSA gets a modulus length and public exponent; ECDSA
    ///   gets a curve and loses the hash; HMAC keeps the hash.
    /// * Key import: when the JWK has `"kty": "EC"` the curve comes from its
    ///   `crv` and the hash is dropped; any other key keeps the hash.
    /// * Sign and verify: the family and the hash.
    pub fn for_operation(&self, step: CryptoStep<'_>) -> OperationDescriptor {
        let mut descriptor = OperationDescriptor {
            family: self.family,
            hash: Some(self.hash),
            named_curve: None,
            modulus_length: None,
            public_exponent: None,
        };

        match step {
            CryptoStep::GenerateKey(params) => match self.defaults {
                KeyDefaults::Hmac => {}
                KeyDefaults::Rsa {
                    modulus_length,
                    public_exponent,
                } => {
                    descriptor.modulus_length = Some(params.modulus_length.unwrap_or(modulus_length));
                    descriptor.public_exponent = Some(
                        params
                            .public_exponent
                            .clone()
                            .unwrap_or_else(|| public_exponent.to_vec()),
                    );
                }
                KeyDefaults::Ec { named_curve } => {
                    descriptor.named_curve = Some(params.named_curve.unwrap_or(named_curve));
                    descriptor.hash = None;
                }
            },
            CryptoStep::ImportKey(key) => {
                if jwk::key_type(key) == Some(jwk::KTY_EC) {
                    descriptor.named_curve = jwk::curve(key);
                    descriptor.hash = None;
                }
            }
            CryptoStep::Operate => {}
        }

        descriptor
    }
}
