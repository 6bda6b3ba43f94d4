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

//! JSON Web Keys ([RFC 7517][1]) and accessors for their common members.
//!
//! [1]: https://www.rfc-editor.org/rfc/rfc7517.html

use serde_json::{Map, Value};

use crate::algorithm::EcCurve;

/// A JSON object meant to represent a JWK, public, private or symmetric.
///
/// Since this is a type alias, no aspects of the schema are enforced; this is
/// left to the [`CryptoBackend`](crate::CryptoBackend) importing the key.
pub type Jwk = Map<String, Value>;

/// `kty` of symmetric keys.
pub const KTY_OCT: &str = "oct";
/// `kty` of RSA keys.
pub const KTY_RSA: &str = "RSA";
/// `kty` of elliptic curve keys.
pub const KTY_EC: &str = "EC";

/// Members that only describe how a key may be used, and that the import
/// step must not see.
const METADATA_MEMBERS: [&str; 1] = ["use"];

/// Returns the string member `name` of the JWK, if present.
pub fn string_member<'a>(jwk: &'a Jwk, name: &str) -> Option<&'a str> {
    jwk.get(name).and_then(Value::as_str)
}

/// The `kty` of the JWK.
pub fn key_type(jwk: &Jwk) -> Option<&str> {
    string_member(jwk, "kty")
}

/// The `alg` of the JWK, when it is a string.
pub fn algorithm(jwk: &Jwk) -> Option<&str> {
    string_member(jwk, "alg")
}

/// The `crv` of the JWK, when it names a supported curve.
pub fn curve(jwk: &Jwk) -> Option<EcCurve> {
    string_member(jwk, "crv").and_then(EcCurve::lookup)
}

/// The `key_ops` of the JWK. Non-string entries are skipped.
pub fn key_ops(jwk: &Jwk) -> Option<Vec<&str>> {
    jwk.get("key_ops")
        .and_then(Value::as_array)
        .map(|ops| ops.iter().filter_map(Value::as_str).collect())
}

/// Returns a copy of the JWK without its metadata members, such as `use`.
///
/// The caller's JWK is left untouched.
pub fn without_metadata(jwk: &Jwk) -> Jwk {
    let mut stripped = jwk.clone();
    for member in METADATA_MEMBERS {
        stripped.remove(member);
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_object;

    #[test]
    fn reads_string_members() {
        let jwk = json_object!({
            "kty": "EC",
            "crv": "P-256",
            "alg": 256,
            "key_ops": ["verify", 1, "sign"],
        });

        assert_eq!(key_type(&jwk), Some(KTY_EC));
        assert_eq!(curve(&jwk), Some(EcCurve::P256));
        assert_eq!(algorithm(&jwk), None);
        assert_eq!(key_ops(&jwk), Some(vec!["verify", "sign"]));
        assert_eq!(string_member(&jwk, "x"), None);
    }

    #[test]
    fn unknown_curves_are_absent() {
        let jwk = json_object!({ "kty": "EC", "crv": "secp256k1" });

        assert_eq!(curve(&jwk), None);
    }

    #[test]
    fn strips_use_without_touching_the_original() {
        let jwk = json_object!({
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "n": "AQAB",
            "e": "AQAB",
        });

        let stripped = without_metadata(&jwk);

        assert!(!stripped.contains_key("use"));
        assert_eq!(stripped.len(), 4);
        assert_eq!(jwk["use"], "sig");
        assert_eq!(jwk.len(), 5);
    }
}
