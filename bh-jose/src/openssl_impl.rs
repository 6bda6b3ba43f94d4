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

//! The default [`CryptoBackend`], backed by [`openssl`].
//!
//! Keys follow the semantics of the WebCrypto API: every key remembers
//! whether it is extractable and which usages it allows, HMAC and RSA keys
//! are bound to a hash at import, and exported JWKs carry `ext` and
//! `key_ops`. The primitives run synchronously on the calling task.

use std::result::Result as StdResult;

use bherror::{
    traits::{ForeignError as _, PropagateError as _},
    Error, Result,
};
use openssl::{
    bn::{BigNum, BigNumContext},
    ec::{EcGroup, EcKey},
    ecdsa::EcdsaSig,
    error::ErrorStack,
    hash::{hash, MessageDigest},
    memcmp,
    nid::Nid,
    pkey::{PKey, Private, Public},
    rand::rand_bytes,
    rsa::{Padding, Rsa},
    sign::{Signer, Verifier},
};
use serde_json::Value;

use crate::{
    algorithm::{Algorithm, AlgorithmFamily, EcCurve, HashAlgorithm, OperationDescriptor},
    backend::{BoxError, CryptoBackend, GeneratedCryptoKey, KeyUsage},
    base64url,
    capability::Environment,
    json_object, jwk, Jwk, JwtEngine,
};

/// Error of the [`OpensslBackend`].
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum OpensslError {
    /// The JWK is incomplete, or describes a key of another type.
    #[strum(to_string = "Invalid JWK: {0}")]
    InvalidJwk(String),
    /// The `alg` of the JWK is not the requested algorithm.
    #[strum(to_string = "The JWK is for {0}")]
    AlgorithmMismatch(String),
    /// The key does not allow the operation.
    #[strum(to_string = "The key does not allow the {0} operation")]
    UsageNotAllowed(KeyUsage),
    /// Export of a key created as not extractable.
    #[strum(to_string = "The key is not extractable")]
    NotExtractable,
    /// The operation descriptor lacks a parameter, or has an invalid one.
    #[strum(to_string = "Invalid algorithm parameters: {0}")]
    InvalidParameters(String),
    /// The key is for another algorithm than the operation.
    #[strum(to_string = "The key cannot be used with {0}")]
    KeyMismatch(String),
    /// OpenSSL itself failed.
    #[strum(to_string = "OpenSSL failure")]
    Backend,
}

impl bherror::BhError for OpensslError {}

/// [`CryptoBackend`] implementation supporting every registered algorithm:
/// HMAC, RSASSA-PKCS1-v1_5 and ECDSA over P-256, P-384 and P-521, each with
/// SHA-256, SHA-384 and SHA-512.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpensslBackend;

impl JwtEngine<OpensslBackend> {
    /// An engine over the [`OpensslBackend`] in the [`Environment::openssl`]
    /// environment.
    pub fn openssl() -> Self {
        Self::new(Environment::openssl(), OpensslBackend)
    }
}

/// A key of the [`OpensslBackend`].
pub struct OpensslKey {
    material: KeyMaterial,
    family: AlgorithmFamily,
    // Bound at import for HMAC and RSA keys; ECDSA keys take the hash per
    // operation.
    hash: Option<HashAlgorithm>,
    extractable: bool,
    usages: Vec<KeyUsage>,
}

enum KeyMaterial {
    Secret(Vec<u8>),
    RsaPrivate(Rsa<Private>),
    RsaPublic(Rsa<Public>),
    EcPrivate(EcKey<Private>, EcCurve),
    EcPublic(EcKey<Public>, EcCurve),
}

impl KeyMaterial {
    fn kind(&self) -> &'static str {
        match self {
            Self::Secret(_) => "secret",
            Self::RsaPrivate(_) | Self::EcPrivate(..) => "private",
            Self::RsaPublic(_) | Self::EcPublic(..) => "public",
        }
    }

    fn allows(&self, usage: KeyUsage) -> bool {
        match self {
            Self::Secret(_) => true,
            Self::RsaPrivate(_) | Self::EcPrivate(..) => usage == KeyUsage::Sign,
            Self::RsaPublic(_) | Self::EcPublic(..) => usage == KeyUsage::Verify,
        }
    }
}

impl OpensslKey {
    /// The family of algorithms the key is for.
    pub fn family(&self) -> AlgorithmFamily {
        self.family
    }

    /// Whether the key can be exported.
    pub fn is_extractable(&self) -> bool {
        self.extractable
    }

    /// What the key may be used for.
    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    fn new(
        material: KeyMaterial,
        family: AlgorithmFamily,
        hash: Option<HashAlgorithm>,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> Self {
        let usages = usages
            .iter()
            .copied()
            .filter(|usage| material.allows(*usage))
            .collect();
        Self {
            material,
            family,
            hash,
            extractable,
            usages,
        }
    }
}

// Key material is never printed.
impl std::fmt::Debug for OpensslKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpensslKey")
            .field("kind", &self.material.kind())
            .field("family", &self.family)
            .field("hash", &self.hash)
            .field("extractable", &self.extractable)
            .field("usages", &self.usages)
            .finish_non_exhaustive()
    }
}

impl CryptoBackend for OpensslBackend {
    type Key = OpensslKey;

    async fn generate_key(
        &self,
        descriptor: &OperationDescriptor,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> StdResult<GeneratedCryptoKey<OpensslKey>, BoxError> {
        Ok(generate_key(descriptor, extractable, usages)?)
    }

    async fn import_key(
        &self,
        jwk: &Jwk,
        descriptor: &OperationDescriptor,
        extractable: bool,
        usages: &[KeyUsage],
    ) -> StdResult<OpensslKey, BoxError> {
        Ok(import_key(jwk, descriptor, extractable, usages)?)
    }

    async fn export_key(&self, key: &OpensslKey) -> StdResult<Jwk, BoxError> {
        Ok(export_key(key)?)
    }

    async fn sign(
        &self,
        descriptor: &OperationDescriptor,
        key: &OpensslKey,
        data: &[u8],
    ) -> StdResult<Vec<u8>, BoxError> {
        Ok(sign(descriptor, key, data)?)
    }

    async fn verify(
        &self,
        descriptor: &OperationDescriptor,
        key: &OpensslKey,
        signature: &[u8],
        data: &[u8],
    ) -> StdResult<bool, BoxError> {
        Ok(verify(descriptor, key, signature, data)?)
    }
}

fn generate_key(
    descriptor: &OperationDescriptor,
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<GeneratedCryptoKey<OpensslKey>, OpensslError> {
    let family = descriptor.family;

    match family {
        AlgorithmFamily::Hmac => {
            let hash = required(descriptor.hash, "hash")?;
            let mut secret = vec![0; hash.block_size()];
            rand_bytes(&mut secret).foreign_err(|| OpensslError::Backend)?;

            Ok(GeneratedCryptoKey::Secret(OpensslKey::new(
                KeyMaterial::Secret(secret),
                family,
                Some(hash),
                extractable,
                usages,
            )))
        }
        AlgorithmFamily::RsassaPkcs1V15 => {
            let hash = required(descriptor.hash, "hash")?;
            let modulus_length = required(descriptor.modulus_length, "modulusLength")?;
            let public_exponent = required(descriptor.public_exponent.as_deref(), "publicExponent")?;
            let public_exponent =
                BigNum::from_slice(public_exponent).foreign_err(|| OpensslError::Backend)?;

            let private_key = Rsa::generate_with_e(modulus_length, &public_exponent)
                .foreign_err(|| {
                    OpensslError::InvalidParameters(format!(
                        "cannot generate a {modulus_length} bit RSA key"
                    ))
                })?;
            let public_key = Rsa::from_public_components(
                private_key.n().to_owned().foreign_err(|| OpensslError::Backend)?,
                private_key.e().to_owned().foreign_err(|| OpensslError::Backend)?,
            )
            .foreign_err(|| OpensslError::Backend)?;

            Ok(GeneratedCryptoKey::Pair {
                public_key: OpensslKey::new(
                    KeyMaterial::RsaPublic(public_key),
                    family,
                    Some(hash),
                    true,
                    usages,
                ),
                private_key: OpensslKey::new(
                    KeyMaterial::RsaPrivate(private_key),
                    family,
                    Some(hash),
                    extractable,
                    usages,
                ),
            })
        }
        AlgorithmFamily::Ecdsa => {
            let curve = required(descriptor.named_curve, "namedCurve")?;
            let group = ec_group(curve)?;

            let private_key = EcKey::generate(&group).foreign_err(|| OpensslError::Backend)?;
            let public_key = EcKey::from_public_key(&group, private_key.public_key())
                .foreign_err(|| OpensslError::Backend)?;

            Ok(GeneratedCryptoKey::Pair {
                public_key: OpensslKey::new(
                    KeyMaterial::EcPublic(public_key, curve),
                    family,
                    None,
                    true,
                    usages,
                ),
                private_key: OpensslKey::new(
                    KeyMaterial::EcPrivate(private_key, curve),
                    family,
                    None,
                    extractable,
                    usages,
                ),
            })
        }
    }
}

fn import_key(
    jwk: &Jwk,
    descriptor: &OperationDescriptor,
    extractable: bool,
    usages: &[KeyUsage],
) -> Result<OpensslKey, OpensslError> {
    let family = descriptor.family;

    let expected_kty = family.key_type();
    match jwk::key_type(jwk) {
        Some(kty) if kty == expected_kty => {}
        Some(kty) => return Err(invalid_jwk(format!("expected kty {expected_kty}, found {kty}"))),
        None => return Err(invalid_jwk("missing kty")),
    }

    let hash = match family {
        AlgorithmFamily::Hmac | AlgorithmFamily::RsassaPkcs1V15 => {
            let hash = required(descriptor.hash, "hash")?;
            check_alg(jwk, family, hash)?;
            Some(hash)
        }
        AlgorithmFamily::Ecdsa => None,
    };

    if let Some(key_ops) = jwk::key_ops(jwk) {
        if let Some(usage) = usages
            .iter()
            .find(|usage| !key_ops.contains(&usage.to_string().as_str()))
        {
            return Err(invalid_jwk(format!("key_ops does not allow {usage}")));
        }
    }

    if extractable && jwk.get("ext") == Some(&Value::Bool(false)) {
        return Err(invalid_jwk("a non-extractable JWK cannot be imported as extractable"));
    }

    let material = match family {
        AlgorithmFamily::Hmac => {
            let secret = decode_member(jwk, "k")?;
            if secret.is_empty() {
                return Err(invalid_jwk("empty k"));
            }
            KeyMaterial::Secret(secret)
        }
        AlgorithmFamily::RsassaPkcs1V15 => import_rsa(jwk)?,
        AlgorithmFamily::Ecdsa => import_ec(jwk, descriptor.named_curve)?,
    };

    if let Some(usage) = usages.iter().find(|usage| !material.allows(**usage)) {
        return Err(Error::root(OpensslError::UsageNotAllowed(*usage))
            .ctx(format!("the key is {}", material.kind())));
    }

    Ok(OpensslKey::new(material, family, hash, extractable, usages))
}

fn check_alg(jwk: &Jwk, family: AlgorithmFamily, hash: HashAlgorithm) -> Result<(), OpensslError> {
    let Some(alg) = jwk.get("alg") else {
        return Ok(());
    };
    let expected = Algorithm::from_family_and_hash(family, hash)
        .ok_or_else(|| Error::root(OpensslError::InvalidParameters(format!("{family} with {hash}"))))?;

    if alg.as_str() != Some(expected.as_str()) {
        let alg = alg.as_str().map_or_else(|| alg.to_string(), str::to_owned);
        return Err(Error::root(OpensslError::AlgorithmMismatch(alg))
            .ctx(format!("expected {expected}")));
    }
    Ok(())
}

fn import_rsa(jwk: &Jwk) -> Result<KeyMaterial, OpensslError> {
    let n = big_num_member(jwk, "n")?;
    let e = big_num_member(jwk, "e")?;

    if !jwk.contains_key("d") {
        let public_key = Rsa::from_public_components(n, e)
            .foreign_err(|| OpensslError::InvalidJwk("invalid RSA public key".to_owned()))?;
        return Ok(KeyMaterial::RsaPublic(public_key));
    }

    let private_key = Rsa::from_private_components(
        n,
        e,
        big_num_member(jwk, "d")?,
        big_num_member(jwk, "p")?,
        big_num_member(jwk, "q")?,
        big_num_member(jwk, "dp")?,
        big_num_member(jwk, "dq")?,
        big_num_member(jwk, "qi")?,
    )
    .foreign_err(|| OpensslError::InvalidJwk("invalid RSA private key".to_owned()))?;

    let consistent =
        clean_up_after_openssl(|| private_key.check_key()).foreign_err(|| OpensslError::Backend)?;
    if !consistent {
        return Err(invalid_jwk("inconsistent RSA private key"));
    }

    Ok(KeyMaterial::RsaPrivate(private_key))
}

fn import_ec(jwk: &Jwk, expected_curve: Option<EcCurve>) -> Result<KeyMaterial, OpensslError> {
    let curve = jwk::curve(jwk).ok_or_else(|| invalid_jwk("missing or unsupported crv"))?;
    if let Some(expected) = expected_curve.filter(|expected| *expected != curve) {
        return Err(invalid_jwk(format!("expected crv {expected}, found {curve}")));
    }

    let group = ec_group(curve)?;
    let x = coordinate_member(jwk, "x", curve)?;
    let y = coordinate_member(jwk, "y", curve)?;
    let public_key = EcKey::from_public_key_affine_coordinates(&group, &x, &y)
        .foreign_err(|| OpensslError::InvalidJwk("the point is not on the curve".to_owned()))?;

    if !jwk.contains_key("d") {
        return Ok(KeyMaterial::EcPublic(public_key, curve));
    }

    let d = coordinate_member(jwk, "d", curve)?;
    let private_key = EcKey::from_private_components(&group, &d, public_key.public_key())
        .foreign_err(|| OpensslError::InvalidJwk("invalid EC private key".to_owned()))?;
    clean_up_after_openssl(|| private_key.check_key())
        .foreign_err(|| OpensslError::InvalidJwk("inconsistent EC private key".to_owned()))?;

    Ok(KeyMaterial::EcPrivate(private_key, curve))
}

fn export_key(key: &OpensslKey) -> Result<Jwk, OpensslError> {
    if !key.extractable {
        return Err(Error::root(OpensslError::NotExtractable));
    }

    let key_ops: Vec<String> = key.usages.iter().map(ToString::to_string).collect();
    let mut exported = json_object!({
        "kty": key.family.key_type(),
        "ext": true,
        "key_ops": key_ops,
    });

    if let Some(alg) = key
        .hash
        .and_then(|hash| Algorithm::from_family_and_hash(key.family, hash))
    {
        exported.insert("alg".to_owned(), Value::from(alg.as_str()));
    }

    match &key.material {
        KeyMaterial::Secret(secret) => {
            insert_b64u(&mut exported, "k", secret);
        }
        KeyMaterial::RsaPublic(public_key) => {
            insert_b64u(&mut exported, "n", public_key.n().to_vec());
            insert_b64u(&mut exported, "e", public_key.e().to_vec());
        }
        KeyMaterial::RsaPrivate(private_key) => {
            let components = [
                ("n", Some(private_key.n())),
                ("e", Some(private_key.e())),
                ("d", Some(private_key.d())),
                ("p", private_key.p()),
                ("q", private_key.q()),
                ("dp", private_key.dmp1()),
                ("dq", private_key.dmq1()),
                ("qi", private_key.iqmp()),
            ];
            for (member, component) in components {
                let component = component.ok_or_else(|| {
                    Error::root(OpensslError::Backend).ctx(format!("RSA key lacks {member}"))
                })?;
                insert_b64u(&mut exported, member, component.to_vec());
            }
        }
        KeyMaterial::EcPublic(public_key, curve) => {
            exported.insert("crv".to_owned(), Value::from(curve.as_str()));
            insert_affine_coordinates(&mut exported, public_key, *curve)?;
        }
        KeyMaterial::EcPrivate(private_key, curve) => {
            exported.insert("crv".to_owned(), Value::from(curve.as_str()));
            insert_affine_coordinates(&mut exported, private_key, *curve)?;
            let d = private_key
                .private_key()
                .to_vec_padded(coordinate_length(*curve))
                .foreign_err(|| OpensslError::Backend)?;
            insert_b64u(&mut exported, "d", d);
        }
    }

    Ok(exported)
}

fn sign(
    descriptor: &OperationDescriptor,
    key: &OpensslKey,
    data: &[u8],
) -> Result<Vec<u8>, OpensslError> {
    let digest = check_operation(descriptor, key, KeyUsage::Sign)?;

    match &key.material {
        KeyMaterial::Secret(secret) => hmac(digest, secret, data),
        KeyMaterial::RsaPrivate(private_key) => {
            let private_key =
                PKey::from_rsa(private_key.clone()).foreign_err(|| OpensslError::Backend)?;
            let mut signer = Signer::new(digest, &private_key).foreign_err(|| OpensslError::Backend)?;
            signer
                .set_rsa_padding(Padding::PKCS1)
                .foreign_err(|| OpensslError::Backend)?;
            signer.update(data).foreign_err(|| OpensslError::Backend)?;
            signer.sign_to_vec().foreign_err(|| OpensslError::Backend)
        }
        KeyMaterial::EcPrivate(private_key, curve) => {
            let digest = hash(digest, data).foreign_err(|| OpensslError::Backend)?;
            let signature =
                EcdsaSig::sign(&digest, private_key).foreign_err(|| OpensslError::Backend)?;

            let length = coordinate_length(*curve);
            let mut jws = signature
                .r()
                .to_vec_padded(length)
                .foreign_err(|| OpensslError::Backend)?;
            jws.extend(
                signature
                    .s()
                    .to_vec_padded(length)
                    .foreign_err(|| OpensslError::Backend)?,
            );
            Ok(jws)
        }
        KeyMaterial::RsaPublic(_) | KeyMaterial::EcPublic(..) => {
            Err(Error::root(OpensslError::UsageNotAllowed(KeyUsage::Sign)))
        }
    }
}

fn verify(
    descriptor: &OperationDescriptor,
    key: &OpensslKey,
    signature: &[u8],
    data: &[u8],
) -> Result<bool, OpensslError> {
    let digest = check_operation(descriptor, key, KeyUsage::Verify)?;

    match &key.material {
        KeyMaterial::Secret(secret) => {
            let expected = hmac(digest, secret, data)?;
            Ok(expected.len() == signature.len() && memcmp::eq(&expected, signature))
        }
        KeyMaterial::RsaPublic(public_key) => {
            if signature.len() != public_key.size() as usize {
                return Ok(false);
            }
            let public_key =
                PKey::from_rsa(public_key.clone()).foreign_err(|| OpensslError::Backend)?;
            let mut verifier =
                Verifier::new(digest, &public_key).foreign_err(|| OpensslError::Backend)?;
            verifier
                .set_rsa_padding(Padding::PKCS1)
                .foreign_err(|| OpensslError::Backend)?;
            verifier.update(data).foreign_err(|| OpensslError::Backend)?;
            // A signature representative out of the modulus range is reported
            // as an error, but it is just a wrong signature.
            Ok(clean_up_after_openssl(|| verifier.verify(signature)).unwrap_or(false))
        }
        KeyMaterial::EcPublic(public_key, curve) => {
            let length = curve.coordinate_size();
            if signature.len() != 2 * length {
                return Ok(false);
            }
            let (r, s) = signature.split_at(length);
            let r = BigNum::from_slice(r).foreign_err(|| OpensslError::Backend)?;
            let s = BigNum::from_slice(s).foreign_err(|| OpensslError::Backend)?;
            let signature =
                EcdsaSig::from_private_components(r, s).foreign_err(|| OpensslError::Backend)?;

            let digest = hash(digest, data).foreign_err(|| OpensslError::Backend)?;
            clean_up_after_openssl(|| signature.verify(&digest, public_key))
                .foreign_err(|| OpensslError::Backend)
        }
        KeyMaterial::RsaPrivate(_) | KeyMaterial::EcPrivate(..) => {
            Err(Error::root(OpensslError::UsageNotAllowed(KeyUsage::Verify)))
        }
    }
}

/// Checks the key may perform the operation, returning the digest to use.
fn check_operation(
    descriptor: &OperationDescriptor,
    key: &OpensslKey,
    usage: KeyUsage,
) -> Result<MessageDigest, OpensslError> {
    if !key.usages.contains(&usage) {
        return Err(Error::root(OpensslError::UsageNotAllowed(usage)));
    }
    if key.family != descriptor.family {
        return Err(Error::root(OpensslError::KeyMismatch(descriptor.family.to_string()))
            .ctx(format!("the key is for {}", key.family)));
    }

    let hash = required(descriptor.hash, "hash")?;
    if key.hash.is_some_and(|key_hash| key_hash != hash) {
        return Err(Error::root(OpensslError::KeyMismatch(format!(
            "{} with {hash}",
            descriptor.family
        ))));
    }

    Ok(message_digest(hash))
}

fn hmac(digest: MessageDigest, secret: &[u8], data: &[u8]) -> Result<Vec<u8>, OpensslError> {
    let secret = PKey::hmac(secret).foreign_err(|| OpensslError::Backend)?;
    let mut signer = Signer::new(digest, &secret).foreign_err(|| OpensslError::Backend)?;
    signer.update(data).foreign_err(|| OpensslError::Backend)?;
    signer.sign_to_vec().foreign_err(|| OpensslError::Backend)
}

fn message_digest(hash: HashAlgorithm) -> MessageDigest {
    match hash {
        HashAlgorithm::Sha256 => MessageDigest::sha256(),
        HashAlgorithm::Sha384 => MessageDigest::sha384(),
        HashAlgorithm::Sha512 => MessageDigest::sha512(),
    }
}

fn ec_group(curve: EcCurve) -> Result<EcGroup, OpensslError> {
    // X9_62_PRIME256V1 is the ANSI X9.62 name of NIST P-256, a.k.a. secp256r1
    let nid = match curve {
        EcCurve::P256 => Nid::X9_62_PRIME256V1,
        EcCurve::P384 => Nid::SECP384R1,
        EcCurve::P521 => Nid::SECP521R1,
    };
    EcGroup::from_curve_name(nid).foreign_err(|| OpensslError::Backend)
}

fn coordinate_length(curve: EcCurve) -> i32 {
    // At most 66, always fits.
    curve.coordinate_size() as i32
}

fn insert_affine_coordinates<T>(
    jwk: &mut Jwk,
    key: &EcKey<T>,
    curve: EcCurve,
) -> Result<(), OpensslError>
where
    T: openssl::pkey::HasPublic,
{
    let mut x = BigNum::new().foreign_err(|| OpensslError::Backend)?;
    let mut y = BigNum::new().foreign_err(|| OpensslError::Backend)?;
    let mut ctx = BigNumContext::new().foreign_err(|| OpensslError::Backend)?;
    key.public_key()
        .affine_coordinates(key.group(), &mut x, &mut y, &mut ctx)
        .foreign_err(|| OpensslError::Backend)?;

    for (member, coordinate) in [("x", &x), ("y", &y)] {
        let coordinate = coordinate
            .to_vec_padded(coordinate_length(curve))
            .foreign_err(|| OpensslError::Backend)?;
        insert_b64u(jwk, member, coordinate);
    }
    Ok(())
}

fn insert_b64u<T: AsRef<[u8]>>(jwk: &mut Jwk, member: &str, bytes: T) {
    jwk.insert(member.to_owned(), Value::from(base64url::encode(bytes)));
}

fn decode_member(jwk: &Jwk, member: &str) -> Result<Vec<u8>, OpensslError> {
    let value = jwk::string_member(jwk, member)
        .ok_or_else(|| invalid_jwk(format!("missing {member}")))?;
    base64url::decode(value).with_err(|| OpensslError::InvalidJwk(format!("{member} is not base64url")))
}

fn big_num_member(jwk: &Jwk, member: &str) -> Result<BigNum, OpensslError> {
    let bytes = decode_member(jwk, member)?;
    BigNum::from_slice(&bytes).foreign_err(|| OpensslError::Backend)
}

fn coordinate_member(jwk: &Jwk, member: &str, curve: EcCurve) -> Result<BigNum, OpensslError> {
    let bytes = decode_member(jwk, member)?;
    if bytes.len() != curve.coordinate_size() {
        return Err(invalid_jwk(format!(
            "{member} must be {} bytes long on {curve}",
            curve.coordinate_size()
        )));
    }
    BigNum::from_slice(&bytes).foreign_err(|| OpensslError::Backend)
}

fn required<T>(parameter: Option<T>, name: &str) -> Result<T, OpensslError> {
    parameter.ok_or_else(|| Error::root(OpensslError::InvalidParameters(format!("missing {name}"))))
}

fn invalid_jwk(message: impl Into<String>) -> Error<OpensslError> {
    Error::root(OpensslError::InvalidJwk(message.into()))
}

/// Runs an OpenSSL call, clearing the OpenSSL error stack if it succeeded.
///
/// Some checks leave entries on the thread's error stack even when they
/// report their outcome through the return value.
fn clean_up_after_openssl<T>(
    f: impl FnOnce() -> StdResult<T, ErrorStack>,
) -> StdResult<T, ErrorStack> {
    let return_value = f()?;
    drop(ErrorStack::get());
    Ok(return_value)
}
