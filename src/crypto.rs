// Copyright 2020 The Exonum Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-size cryptographic primitives and the signer-recovery boundary.
//!
//! Key management and signature schemes are, per the validation core's scope,
//! an external collaborator: the only capability the validators actually need
//! is `recover_signer(payload_bytes, signature) -> Address`. [`SignatureScheme`]
//! is that boundary; [`Secp256k1RecoverableScheme`] is one concrete realization
//! of it, built on the same `secp256k1` + `sha3` pairing used by Ethereum-family
//! consensus clients.

use hex::{FromHex, ToHex};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SECP256K1,
};
use serde::{Deserialize, Serialize};
use sha3::{Digest as _, Keccak256};

use std::{fmt, str::FromStr};

use crate::error::ValidationError;

/// 20-byte validator identifier, derived from a public key the same way an
/// Ethereum account address is: the low 20 bytes of `keccak256(pubkey)`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Number of bytes an `Address` occupies on the wire.
    pub const LEN: usize = 20;

    /// Wraps a raw 20-byte array.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Returns the address as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0.encode_hex::<String>())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0.encode_hex::<String>())
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: Vec<u8> = Vec::from_hex(s.trim_start_matches("0x"))?;
        let mut out = [0_u8; 20];
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        out.copy_from_slice(&bytes);
        Ok(Address(out))
    }
}

/// 32-byte digest: a block hash or a committed-seal hash.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Number of bytes a `Digest` occupies on the wire.
    pub const LEN: usize = 32;

    /// Wraps a raw 32-byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Digest(bytes)
    }

    /// Returns the digest as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.0.encode_hex::<String>())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.0.encode_hex::<String>())
    }
}

/// 65-byte recoverable ECDSA signature, `r ‖ s ‖ v`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub [u8; 65]);

impl Signature {
    /// Number of bytes a `Signature` occupies on the wire.
    pub const LEN: usize = 65;

    /// Wraps a raw 65-byte array.
    pub fn from_bytes(bytes: [u8; 65]) -> Self {
        Signature(bytes)
    }

    /// Returns the signature as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.0.encode_hex::<String>())
    }
}

/// Abstract capability to recover the signer of a payload from its signature.
///
/// This is the entirety of the cryptographic surface the validation core
/// depends on; it never inspects key material directly.
pub trait SignatureScheme {
    /// Recovers the address that produced `signature` over `payload_bytes`.
    ///
    /// Returns [`ValidationError::InvalidSignature`] if the signature does not
    /// recover to a valid public key.
    fn recover_signer(
        &self,
        payload_bytes: &[u8],
        signature: &Signature,
    ) -> Result<Address, ValidationError>;
}

/// Derives an [`Address`] from a raw (uncompressed, without the leading
/// parity byte) public key using Keccak-256, mirroring Ethereum-family
/// address derivation.
fn address_from_pubkey(pubkey: &PublicKey) -> Address {
    let uncompressed = pubkey.serialize_uncompressed();
    // Skip the leading 0x04 prefix byte before hashing.
    let hash = Keccak256::digest(&uncompressed[1..]);
    let mut out = [0_u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address(out)
}

/// [`SignatureScheme`] backed by `secp256k1` recoverable ECDSA signatures.
///
/// The message digest handed to recovery is the Keccak-256 hash of the
/// canonical wire encoding of the payload, matching how the wire codec
/// (see [`crate::codec`]) frames every payload before it is signed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1RecoverableScheme;

impl SignatureScheme for Secp256k1RecoverableScheme {
    fn recover_signer(
        &self,
        payload_bytes: &[u8],
        signature: &Signature,
    ) -> Result<Address, ValidationError> {
        let digest = Keccak256::digest(payload_bytes);
        let message =
            Message::from_digest_slice(&digest).map_err(|_| ValidationError::InvalidSignature)?;

        let recovery_id = i32::from(signature.0[64]);
        let recovery_id =
            RecoveryId::from_i32(recovery_id).map_err(|_| ValidationError::InvalidSignature)?;
        let recoverable = RecoverableSignature::from_compact(&signature.0[..64], recovery_id)
            .map_err(|_| ValidationError::InvalidSignature)?;

        let pubkey = SECP256K1
            .recover_ecdsa(&message, &recoverable)
            .map_err(|_| ValidationError::InvalidSignature)?;

        Ok(address_from_pubkey(&pubkey))
    }
}

/// Fixture helpers for building signed test/benchmark data.
///
/// Kept as an always-compiled `pub` module rather than `#[cfg(test)]` so that
/// the integration tests and the `criterion` benchmarks, which depend on this
/// crate the same way an external caller would, can build fixtures without
/// reimplementing signing.
pub mod testing {
    use super::*;
    use secp256k1::SecretKey;

    /// Signs `payload_bytes` the same way [`Secp256k1RecoverableScheme`] expects
    /// to recover it; used throughout the crate's tests to build fixtures.
    pub fn sign(payload_bytes: &[u8], secret_key: &SecretKey) -> Signature {
        let digest = Keccak256::digest(payload_bytes);
        let message = Message::from_digest_slice(&digest).expect("32-byte digest");
        let (recovery_id, compact) = SECP256K1
            .sign_ecdsa_recoverable(&message, secret_key)
            .serialize_compact();
        let mut bytes = [0_u8; 65];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = recovery_id.to_i32() as u8;
        Signature(bytes)
    }

    /// Derives the [`Address`] a secret key would sign messages as.
    pub fn address_of(secret_key: &SecretKey) -> Address {
        let pubkey = PublicKey::from_secret_key(SECP256K1, secret_key);
        address_from_pubkey(&pubkey)
    }
}
