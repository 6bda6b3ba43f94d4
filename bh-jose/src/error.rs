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

use bherror::traits::ForeignBoxed as _;

use crate::BoxError;

/// Top-level error type of the engine.
///
/// The rendered message of either variant is exactly the message of the
/// wrapped error, so callers can match on `error.to_string()` as well as on
/// the variants.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum Error {
    /// The input has the wrong shape at the API boundary.
    #[strum(to_string = "{0}")]
    Type(JwtTypeError),

    /// The input violates the JWS protocol, or the cryptographic backend
    /// failed.
    #[strum(to_string = "{0}")]
    Jwt(JwtError),
}

impl bherror::BhError for Error {}

impl From<JwtTypeError> for Error {
    fn from(value: JwtTypeError) -> Self {
        Self::Type(value)
    }
}

impl From<JwtError> for Error {
    fn from(value: JwtError) -> Self {
        Self::Jwt(value)
    }
}

/// Input of the wrong shape at the API boundary.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum JwtTypeError {
    /// The token is missing (empty).
    #[strum(to_string = "A jwt must be provided as a string")]
    TokenNotAString,
}

/// Protocol or cryptographic error.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum JwtError {
    /// The token does not consist of exactly three `.` separated segments.
    #[strum(to_string = "The jwt must have a header, claims set and signature")]
    MissingSegments,

    /// The header segment is not valid `base64url` encoded UTF-8.
    #[strum(to_string = "The jwt header could not be decoded")]
    HeaderNotDecodable,

    /// The header segment decoded fine, but is not a JSON object.
    #[strum(to_string = "The jwt header is malformed")]
    MalformedHeader,

    /// The claims set segment could not be decoded or parsed as a JSON object.
    #[strum(to_string = "The jwt claims set is malformed")]
    MalformedClaimsSet,

    /// The signature segment is not valid `base64url`.
    #[strum(to_string = "The jwt signature could not be decoded")]
    SignatureNotDecodable,

    /// The `alg` value is not present in the algorithm registry.
    #[strum(to_string = "{0} is an unrecognized algorithm type")]
    UnrecognizedAlgorithm(String),

    /// The environment cannot generate keys for the algorithm.
    #[strum(to_string = "jwt in {environment} cannot generate {alg} keys")]
    UnsupportedKeyGeneration {
        /// Name of the active environment.
        environment: String,
        /// The requested algorithm, verbatim.
        alg: String,
    },

    /// The environment cannot sign using the algorithm.
    #[strum(to_string = "jwt in {environment} cannot sign using {alg}")]
    UnsupportedSigning {
        /// Name of the active environment.
        environment: String,
        /// The requested algorithm, verbatim.
        alg: String,
    },

    /// The environment cannot verify using the algorithm.
    #[strum(to_string = "jwt in {environment} cannot verify using {alg}")]
    UnsupportedVerification {
        /// Name of the active environment.
        environment: String,
        /// The requested algorithm, verbatim.
        alg: String,
    },

    /// Neither the request nor the JWK named an algorithm.
    #[strum(to_string = "An alg is required to sign using a jwk")]
    AlgRequired,

    /// No claims were given to sign.
    #[strum(to_string = "Must provide claims to sign")]
    MissingClaims,

    /// No JWK was given to sign with.
    #[strum(to_string = "Must provide a jwk to sign with")]
    MissingJwk,

    /// The claims could not be serialized to JSON.
    #[strum(to_string = "Unable to stringify claims: {0}")]
    StringifyClaims(String),

    /// The JOSE header could not be serialized and encoded.
    #[strum(to_string = "Unable to encode header")]
    EncodeHeader,

    /// The backend failed to generate a key.
    #[strum(to_string = "Unable to generate key: {0}")]
    KeyGeneration(String),

    /// The backend failed to export a key as a JWK.
    #[strum(to_string = "Unable to export key: {0}")]
    KeyExport(String),

    /// The backend refused to import the JWK.
    #[strum(to_string = "Unable to import key: {0}")]
    KeyImport(String),

    /// The backend failed to produce a signature.
    #[strum(to_string = "Unable to sign the claims: {0}")]
    Signing(String),

    /// The backend failed while checking a signature. A signature that is
    /// merely wrong is not an error.
    #[strum(to_string = "Unable to verify the signature: {0}")]
    Verification(String),

    /// `verify` was called without a token or without a JWK.
    #[strum(to_string = "jwt.verify requires a token and jwk")]
    MissingTokenOrJwk,

    /// The header has no `alg`, or it is `none`.
    #[strum(to_string = "The jwt must have a defined algorithm to verify")]
    UndefinedAlgorithm,

    /// The JWK is bound to another algorithm than the one in the header.
    #[strum(to_string = "The jwt has an alg of {token_alg}, but the key is for {key_alg}")]
    AlgorithmMismatch {
        /// The `alg` of the token header.
        token_alg: String,
        /// The `alg` of the JWK.
        key_alg: String,
    },
}

/// Error of the [`base64url`](crate::base64url) codec.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum DecodingError {
    /// The input carries a character of the standard base64 alphabet, or
    /// padding, which never appears in `base64url` without padding.
    #[strum(to_string = "Character '{0}' is not allowed in base64url input")]
    StandardBase64Character(char),

    /// The input is not valid `base64url`.
    #[strum(to_string = "Invalid base64url input")]
    InvalidBase64Url,

    /// The decoded bytes are not valid UTF-8.
    #[strum(to_string = "Decoded base64url input is not valid UTF-8")]
    InvalidUtf8,
}

impl bherror::BhError for DecodingError {}

/// The [`bherror::Result`] type with the error type of [`Error`], used
/// throughout this crate.
pub type Result<T> = bherror::Result<T, Error>;

/// Wraps foreign failures, such as those of [`CryptoBackend`](crate::CryptoBackend)
/// primitives, into [`JwtError`]-s carrying the foreign message, keeping the
/// foreign error as the source.
pub(crate) trait ForeignMessage<T> {
    fn message_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(String) -> JwtError;
}

impl<T, E> ForeignMessage<T> for std::result::Result<T, E>
where
    E: Into<BoxError>,
{
    #[track_caller]
    fn message_err<F>(self, f: F) -> Result<T>
    where
        F: FnOnce(String) -> JwtError,
    {
        self.map_err(Into::<BoxError>::into).or_else(|error| {
            let message = error.to_string();
            Err(error).foreign_boxed_err(|| Error::Jwt(f(message)))
        })
    }
}
