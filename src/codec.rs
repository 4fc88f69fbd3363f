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

//! Deterministic binary wire codec.
//!
//! Every payload is framed as a length-prefixed list of fields; nested
//! payloads and certificates become nested lists. Integers are big-endian
//! with the minimal number of bytes needed to represent their value, the
//! same shape `exonum`'s old `MessageWriter`/`MessageBuffer` pair used for
//! its hand-rolled message framing, generalized here to be recursive.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::io::{self, Cursor, Read};

use crate::error::WireError;

/// One node of the recursive field tree every payload encodes to before
/// being serialized, and decodes from after being parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// A non-negative integer, written with the minimal number of
    /// big-endian bytes (zero itself encodes as zero bytes).
    UInt(u64),
    /// A fixed- or variable-length opaque byte string (addresses, digests,
    /// signatures, opaque block bodies).
    Bytes(Vec<u8>),
    /// An ordered, nested list of fields — used both for a payload's own
    /// field list and for repeated/optional sub-structures.
    List(Vec<Field>),
}

const TAG_UINT: u8 = 0;
const TAG_BYTES: u8 = 1;
const TAG_LIST: u8 = 2;

impl Field {
    /// Serializes this field (and, recursively, its children) to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Field::UInt(value) => {
                let bytes = minimal_be_bytes(*value);
                out.push(TAG_UINT);
                out.push(bytes.len() as u8);
                out.extend_from_slice(&bytes);
            }
            Field::Bytes(bytes) => {
                out.push(TAG_BYTES);
                out.write_u32::<BigEndian>(bytes.len() as u32).expect("writing to Vec never fails");
                out.extend_from_slice(bytes);
            }
            Field::List(items) => {
                let mut body = Vec::new();
                for item in items {
                    item.write_to(&mut body);
                }
                out.push(TAG_LIST);
                out.write_u32::<BigEndian>(body.len() as u32).expect("writing to Vec never fails");
                out.extend_from_slice(&body);
            }
        }
    }

    /// Encodes this field tree into a standalone byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    /// Decodes a single field (and all of its children) from `cursor`.
    pub fn read_from(cursor: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let tag = read_u8(cursor)?;
        match tag {
            TAG_UINT => {
                let len = read_u8(cursor)? as usize;
                if len > 8 {
                    return Err(WireError::MalformedFrame(format!(
                        "integer field of {} bytes exceeds u64 width",
                        len
                    )));
                }
                let mut buf = [0_u8; 8];
                read_exact(cursor, &mut buf[8 - len..])?;
                if len > 0 && buf[8 - len] == 0 {
                    return Err(WireError::MalformedFrame(
                        "integer field has a non-minimal leading zero byte".into(),
                    ));
                }
                Ok(Field::UInt(u64::from_be_bytes(buf)))
            }
            TAG_BYTES => {
                let len = read_u32(cursor)? as usize;
                let mut buf = vec![0_u8; len];
                read_exact(cursor, &mut buf)?;
                Ok(Field::Bytes(buf))
            }
            TAG_LIST => {
                let len = read_u32(cursor)? as usize;
                let start = cursor.position() as usize;
                let end = start
                    .checked_add(len)
                    .ok_or_else(|| WireError::MalformedFrame("list length overflow".into()))?;
                if end > cursor.get_ref().len() {
                    return Err(WireError::MalformedFrame(
                        "list body runs past end of buffer".into(),
                    ));
                }
                let mut items = Vec::new();
                while (cursor.position() as usize) < end {
                    items.push(Field::read_from(cursor)?);
                }
                if cursor.position() as usize != end {
                    return Err(WireError::MalformedFrame(
                        "nested field did not consume exactly its declared length".into(),
                    ));
                }
                Ok(Field::List(items))
            }
            other => Err(WireError::MalformedFrame(format!(
                "unknown field tag {}",
                other
            ))),
        }
    }

    /// Decodes a field tree from a complete byte slice, requiring that the
    /// entire slice is consumed.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let mut cursor = Cursor::new(bytes);
        let field = Field::read_from(&mut cursor)?;
        if (cursor.position() as usize) != bytes.len() {
            return Err(WireError::MalformedFrame(
                "trailing bytes after a complete field".into(),
            ));
        }
        Ok(field)
    }

    /// Convenience accessor for destructuring a top-level list.
    pub fn into_list(self) -> Result<Vec<Field>, WireError> {
        match self {
            Field::List(items) => Ok(items),
            _ => Err(WireError::MalformedFrame("expected a list field".into())),
        }
    }

    /// Convenience accessor for an integer field.
    pub fn into_uint(self) -> Result<u64, WireError> {
        match self {
            Field::UInt(value) => Ok(value),
            _ => Err(WireError::MalformedFrame("expected an integer field".into())),
        }
    }

    /// Convenience accessor for a byte-string field.
    pub fn into_bytes(self) -> Result<Vec<u8>, WireError> {
        match self {
            Field::Bytes(bytes) => Ok(bytes),
            _ => Err(WireError::MalformedFrame("expected a bytes field".into())),
        }
    }
}

fn minimal_be_bytes(value: u64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let full = value.to_be_bytes();
    let skip = full.iter().take_while(|b| **b == 0).count();
    full[skip..].to_vec()
}

fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, WireError> {
    cursor
        .read_u8()
        .map_err(|e| WireError::MalformedFrame(io_err(e)))
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, WireError> {
    cursor
        .read_u32::<BigEndian>()
        .map_err(|e| WireError::MalformedFrame(io_err(e)))
}

fn read_exact(cursor: &mut Cursor<&[u8]>, buf: &mut [u8]) -> Result<(), WireError> {
    Read::read_exact(cursor, buf).map_err(|e| WireError::MalformedFrame(io_err(e)))
}

fn io_err(e: io::Error) -> String {
    format!("unexpected end of frame ({})", e)
}

/// Fixed-size byte-field helpers shared by every payload's (de)serialization.
pub(crate) fn fixed_bytes<const N: usize>(field: Field) -> Result<[u8; N], WireError> {
    let bytes = field.into_bytes()?;
    if bytes.len() != N {
        return Err(WireError::MalformedFrame(format!(
            "expected a {}-byte field, got {}",
            N,
            bytes.len()
        )));
    }
    let mut out = [0_u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Checks a decoded frame's size against a configured cap, producing
/// [`WireError::OversizedMessage`] when it is exceeded. Call this on the raw
/// bytes before doing any further decoding work, per the hard size cap the
/// concurrency model calls for.
pub fn check_size_cap(bytes: &[u8], limit: usize) -> Result<(), WireError> {
    if bytes.len() > limit {
        return Err(WireError::OversizedMessage {
            actual: bytes.len(),
            limit,
        });
    }
    Ok(())
}

/// Conservative upper bound, in encoded wire bytes, for a single signed
/// `Prepare` envelope: a round identifier (two minimally-encoded integers),
/// a 32-byte digest, and a 65-byte recoverable signature, plus field framing.
const PREPARE_ENVELOPE_MAX_WIRE_SIZE: usize = 128;

/// Conservative upper bound, in encoded wire bytes, for a single signed
/// `RoundChange` envelope excluding any embedded `PreparedCertificate`: a
/// round identifier, a presence flag, and a signature, plus field framing.
const ROUND_CHANGE_ENVELOPE_MAX_WIRE_SIZE: usize = 96;

/// Conservative upper bound, in encoded wire bytes, for a signed `Proposal`
/// envelope excluding its block body: a round identifier, the block's fixed
/// fields, and a signature, plus field framing.
const PROPOSAL_ENVELOPE_MAX_WIRE_SIZE: usize = 256;

/// Maximum number of `Prepare` messages a single `PreparedCertificate` may
/// carry at the given `quorum_size`: a quorum minus the proposer's own
/// implicit prepare, per [`crate::validation::validate_prepared_certificate`].
/// Reject a decoded certificate with more prepares than this without
/// validating a single one of them.
pub fn max_prepares_per_certificate(quorum_size: usize) -> usize {
    quorum_size.saturating_sub(1)
}

/// Conservative upper bound, in encoded wire bytes, for one `NewRound`
/// message's round-change certificate at the given `quorum_size`:
/// `quorum_size` round-change envelopes, each potentially carrying a
/// prepared certificate with one proposal and up to
/// [`max_prepares_per_certificate`] prepares.
pub fn max_round_change_certificate_size(quorum_size: usize) -> usize {
    let max_prepared_certificate_size = PROPOSAL_ENVELOPE_MAX_WIRE_SIZE
        + max_prepares_per_certificate(quorum_size) * PREPARE_ENVELOPE_MAX_WIRE_SIZE;
    quorum_size * (ROUND_CHANGE_ENVELOPE_MAX_WIRE_SIZE + max_prepared_certificate_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_encoding_has_no_leading_zero() {
        assert_eq!(minimal_be_bytes(0), Vec::<u8>::new());
        assert_eq!(minimal_be_bytes(1), vec![1]);
        assert_eq!(minimal_be_bytes(256), vec![1, 0]);
        assert_eq!(minimal_be_bytes(u64::MAX), vec![0xff; 8]);
    }

    #[test]
    fn uint_round_trips() {
        for value in [0_u64, 1, 255, 256, 70_000, u64::MAX] {
            let field = Field::UInt(value);
            let bytes = field.encode();
            let decoded = Field::decode(&bytes).unwrap();
            assert_eq!(decoded, field);
        }
    }

    #[test]
    fn list_round_trips() {
        let field = Field::List(vec![
            Field::UInt(10),
            Field::Bytes(vec![1, 2, 3]),
            Field::List(vec![Field::UInt(1), Field::UInt(2)]),
        ]);
        let bytes = field.encode();
        let decoded = Field::decode(&bytes).unwrap();
        assert_eq!(decoded, field);
    }

    #[test]
    fn non_minimal_integer_is_rejected() {
        // Hand-craft a UInt field with a redundant leading zero byte.
        let mut bytes = vec![TAG_UINT, 2, 0x00, 0x01];
        let err = Field::decode(&bytes).unwrap_err();
        assert!(matches!(err, WireError::MalformedFrame(_)));

        bytes[1] = 1;
        bytes.truncate(3);
        assert!(Field::decode(&bytes).is_ok());
    }

    #[test]
    fn truncated_list_is_malformed() {
        let field = Field::List(vec![Field::UInt(5), Field::UInt(6)]);
        let mut bytes = field.encode();
        bytes.truncate(bytes.len() - 1);
        assert!(Field::decode(&bytes).is_err());
    }

    #[test]
    fn oversized_message_is_rejected() {
        let bytes = vec![0_u8; 100];
        assert!(check_size_cap(&bytes, 200).is_ok());
        let err = check_size_cap(&bytes, 50).unwrap_err();
        assert!(matches!(err, WireError::OversizedMessage { actual: 100, limit: 50 }));
    }

    #[test]
    fn max_prepares_per_certificate_is_quorum_minus_the_proposer() {
        assert_eq!(max_prepares_per_certificate(3), 2);
        assert_eq!(max_prepares_per_certificate(1), 0);
        assert_eq!(max_prepares_per_certificate(0), 0);
    }

    #[test]
    fn max_round_change_certificate_size_grows_with_quorum() {
        let small = max_round_change_certificate_size(3);
        let large = max_round_change_certificate_size(7);
        assert!(large > small);
        assert!(small > 0);
    }
}
