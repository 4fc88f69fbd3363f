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

//! The algebraic set of IBFT payload shapes.
//!
//! Each payload implements [`Payload`], which fixes its wire type tag and its
//! conversion to/from the recursive [`Field`] tree the codec deals in.
//! `PreparedCertificate` is nested inside `RoundChangePayload` as a sum
//! alternative (present/absent), never as a sentinel value — see the design
//! notes on optional fields.

use std::convert::TryInto;

use crate::block::Block;
use crate::codec::{fixed_bytes, Field};
use crate::crypto::{Address, Digest, Signature};
use crate::error::WireError;
use crate::ids::ConsensusRoundIdentifier;
use crate::messages::signed::SignedData;

/// The one-byte tag identifying a payload's shape on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// [`ProposalPayload`].
    Proposal = 0,
    /// [`PreparePayload`].
    Prepare = 1,
    /// [`CommitPayload`].
    Commit = 2,
    /// [`RoundChangePayload`].
    RoundChange = 3,
    /// [`NewRoundPayload`].
    NewRound = 4,
}

impl MessageType {
    /// Maps a raw wire byte to a known message type.
    pub fn from_tag(tag: u8) -> Result<Self, WireError> {
        match tag {
            0 => Ok(MessageType::Proposal),
            1 => Ok(MessageType::Prepare),
            2 => Ok(MessageType::Commit),
            3 => Ok(MessageType::RoundChange),
            4 => Ok(MessageType::NewRound),
            other => Err(WireError::UnknownMessageType(other)),
        }
    }

    /// Returns the raw wire byte for this message type.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// A type that can appear as the payload of a [`SignedData`] envelope.
pub trait Payload: Sized + Clone + PartialEq + Eq + std::fmt::Debug {
    /// Wire type tag for this payload shape.
    const TAG: MessageType;

    /// Converts this payload into its canonical field-tree representation.
    /// This is exactly the byte string a [`crate::crypto::SignatureScheme`]
    /// recovers a signer over.
    fn to_field(&self) -> Field;

    /// Parses this payload back out of a field tree produced by `to_field`.
    fn from_field(field: Field) -> Result<Self, WireError>;

    /// Encodes this payload to its canonical wire bytes.
    fn encode(&self) -> Vec<u8> {
        self.to_field().encode()
    }
}

fn digest_field(digest: Digest) -> Field {
    Field::Bytes(digest.0.to_vec())
}

fn digest_from_field(field: Field) -> Result<Digest, WireError> {
    Ok(Digest(fixed_bytes::<32>(field)?))
}

fn address_field(address: Address) -> Field {
    Field::Bytes(address.0.to_vec())
}

fn address_from_field(field: Field) -> Result<Address, WireError> {
    Ok(Address(fixed_bytes::<20>(field)?))
}

fn round_identifier_field(id: ConsensusRoundIdentifier) -> Field {
    Field::List(vec![
        Field::UInt(id.sequence_number.0),
        Field::UInt(u64::from(id.round_number.0)),
    ])
}

fn round_identifier_from_field(field: Field) -> Result<ConsensusRoundIdentifier, WireError> {
    let items = field.into_list()?;
    let [sequence_number, round_number]: [Field; 2] = items
        .try_into()
        .map_err(|_| WireError::MalformedFrame("round identifier needs 2 fields".into()))?;
    let sequence_number = sequence_number.into_uint()?;
    let round_number = round_number.into_uint()?;
    if round_number > u64::from(u32::MAX) {
        return Err(WireError::MalformedFrame("round number overflows u32".into()));
    }
    Ok(ConsensusRoundIdentifier::new(sequence_number, round_number as u32))
}

fn block_field(block: &Block) -> Field {
    Field::List(vec![
        Field::UInt(block.number),
        digest_field(block.hash),
        digest_field(block.seal_hash),
        Field::Bytes(block.body.clone()),
    ])
}

fn block_from_field(field: Field) -> Result<Block, WireError> {
    let items = field.into_list()?;
    let [number, hash, seal_hash, body]: [Field; 4] = items
        .try_into()
        .map_err(|_| WireError::MalformedFrame("block needs 4 fields".into()))?;
    Ok(Block {
        number: number.into_uint()?,
        hash: digest_from_field(hash)?,
        seal_hash: digest_from_field(seal_hash)?,
        body: body.into_bytes()?,
    })
}

fn signature_field(signature: &Signature) -> Field {
    Field::Bytes(signature.0.to_vec())
}

fn signature_from_field(field: Field) -> Result<Signature, WireError> {
    Ok(Signature(fixed_bytes::<65>(field)?))
}

/// Encodes a [`SignedData<P>`] as the two-field list `[payload_list, signature]`.
pub(crate) fn signed_data_field<P: Payload>(data: &SignedData<P>) -> Field {
    Field::List(vec![data.payload().to_field(), signature_field(data.signature())])
}

/// Decodes a [`SignedData<P>`] from a two-field list.
pub(crate) fn signed_data_from_field<P: Payload>(
    field: Field,
) -> Result<SignedData<P>, WireError> {
    let items = field.into_list()?;
    let [payload, signature]: [Field; 2] = items
        .try_into()
        .map_err(|_| WireError::MalformedFrame("signed data needs 2 fields".into()))?;
    Ok(SignedData::new(
        P::from_field(payload)?,
        signature_from_field(signature)?,
    ))
}

/// `(round_identifier, block)`. The proposer's candidate block for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalPayload {
    /// Round this proposal advances to.
    pub round_identifier: ConsensusRoundIdentifier,
    /// The candidate block.
    pub block: Block,
}

impl Payload for ProposalPayload {
    const TAG: MessageType = MessageType::Proposal;

    fn to_field(&self) -> Field {
        Field::List(vec![
            round_identifier_field(self.round_identifier),
            block_field(&self.block),
        ])
    }

    fn from_field(field: Field) -> Result<Self, WireError> {
        let items = field.into_list()?;
        let [round_identifier, block]: [Field; 2] = items
            .try_into()
            .map_err(|_| WireError::MalformedFrame("proposal needs 2 fields".into()))?;
        Ok(ProposalPayload {
            round_identifier: round_identifier_from_field(round_identifier)?,
            block: block_from_field(block)?,
        })
    }
}

/// `(round_identifier, digest)`. A vote that a well-formed proposal was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparePayload {
    /// Round this prepare targets.
    pub round_identifier: ConsensusRoundIdentifier,
    /// Hash of the block the sender claims to have seen proposed.
    pub digest: Digest,
}

impl Payload for PreparePayload {
    const TAG: MessageType = MessageType::Prepare;

    fn to_field(&self) -> Field {
        Field::List(vec![
            round_identifier_field(self.round_identifier),
            digest_field(self.digest),
        ])
    }

    fn from_field(field: Field) -> Result<Self, WireError> {
        let items = field.into_list()?;
        let [round_identifier, digest]: [Field; 2] = items
            .try_into()
            .map_err(|_| WireError::MalformedFrame("prepare needs 2 fields".into()))?;
        Ok(PreparePayload {
            round_identifier: round_identifier_from_field(round_identifier)?,
            digest: digest_from_field(digest)?,
        })
    }
}

/// `(round_identifier, digest, commit_seal)`. A validator's final vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPayload {
    /// Round this commit targets.
    pub round_identifier: ConsensusRoundIdentifier,
    /// Hash of the committed block.
    pub digest: Digest,
    /// Signature over the block's committed-seal hash.
    pub commit_seal: Signature,
}

impl Payload for CommitPayload {
    const TAG: MessageType = MessageType::Commit;

    fn to_field(&self) -> Field {
        Field::List(vec![
            round_identifier_field(self.round_identifier),
            digest_field(self.digest),
            signature_field(&self.commit_seal),
        ])
    }

    fn from_field(field: Field) -> Result<Self, WireError> {
        let items = field.into_list()?;
        let [round_identifier, digest, commit_seal]: [Field; 3] = items
            .try_into()
            .map_err(|_| WireError::MalformedFrame("commit needs 3 fields".into()))?;
        Ok(CommitPayload {
            round_identifier: round_identifier_from_field(round_identifier)?,
            digest: digest_from_field(digest)?,
            commit_seal: signature_from_field(commit_seal)?,
        })
    }
}

/// Evidence that a block was prepared (quorum of prepares observed the
/// proposal) at some earlier round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCertificate {
    /// The proposal the quorum prepared.
    pub proposal: SignedData<ProposalPayload>,
    /// The quorum of prepares endorsing that proposal.
    pub prepares: Vec<SignedData<PreparePayload>>,
}

impl PreparedCertificate {
    fn to_field(&self) -> Field {
        Field::List(vec![
            signed_data_field(&self.proposal),
            Field::List(self.prepares.iter().map(signed_data_field).collect()),
        ])
    }

    fn from_field(field: Field) -> Result<Self, WireError> {
        let items = field.into_list()?;
        let [proposal, prepares]: [Field; 2] = items
            .try_into()
            .map_err(|_| WireError::MalformedFrame("prepared certificate needs 2 fields".into()))?;
        let proposal = signed_data_from_field(proposal)?;
        let prepares = prepares
            .into_list()?
            .into_iter()
            .map(signed_data_from_field)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PreparedCertificate { proposal, prepares })
    }
}

/// `(round_change_identifier, prepared_certificate?)`. A request to abandon
/// the current round, optionally carrying evidence of an earlier preparation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundChangePayload {
    /// Round the sender wants to move to.
    pub round_change_identifier: ConsensusRoundIdentifier,
    /// Evidence of an earlier preparation, if any.
    pub prepared_certificate: Option<PreparedCertificate>,
}

impl Payload for RoundChangePayload {
    const TAG: MessageType = MessageType::RoundChange;

    fn to_field(&self) -> Field {
        let certificate_field = match &self.prepared_certificate {
            Some(certificate) => Field::List(vec![certificate.to_field()]),
            None => Field::List(vec![]),
        };
        Field::List(vec![
            round_identifier_field(self.round_change_identifier),
            certificate_field,
        ])
    }

    fn from_field(field: Field) -> Result<Self, WireError> {
        let items = field.into_list()?;
        let [round_change_identifier, certificate_field]: [Field; 2] = items
            .try_into()
            .map_err(|_| WireError::MalformedFrame("round change needs 2 fields".into()))?;
        let mut certificate_items = certificate_field.into_list()?;
        let prepared_certificate = match certificate_items.len() {
            0 => None,
            1 => Some(PreparedCertificate::from_field(certificate_items.remove(0))?),
            _ => {
                return Err(WireError::MalformedFrame(
                    "optional prepared certificate must be 0 or 1 items".into(),
                ))
            }
        };
        Ok(RoundChangePayload {
            round_change_identifier: round_identifier_from_field(round_change_identifier)?,
            prepared_certificate,
        })
    }
}

/// A set of signed round-change votes collected to justify advancing to a
/// new round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundChangeCertificate {
    /// The collected round-change votes.
    pub payloads: Vec<SignedData<RoundChangePayload>>,
}

impl RoundChangeCertificate {
    fn to_field(&self) -> Field {
        Field::List(self.payloads.iter().map(signed_data_field).collect())
    }

    fn from_field(field: Field) -> Result<Self, WireError> {
        let payloads = field
            .into_list()?
            .into_iter()
            .map(signed_data_from_field)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RoundChangeCertificate { payloads })
    }
}

/// `(round_change_identifier, round_change_certificate, proposal)`. Sent by
/// the proposer of the new round to announce the round-change and its
/// candidate block in one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoundPayload {
    /// Round being moved to.
    pub round_change_identifier: ConsensusRoundIdentifier,
    /// Evidence justifying the move.
    pub round_change_certificate: RoundChangeCertificate,
    /// The new round's proposal.
    pub proposal: SignedData<ProposalPayload>,
}

impl Payload for NewRoundPayload {
    const TAG: MessageType = MessageType::NewRound;

    fn to_field(&self) -> Field {
        Field::List(vec![
            round_identifier_field(self.round_change_identifier),
            self.round_change_certificate.to_field(),
            signed_data_field(&self.proposal),
        ])
    }

    fn from_field(field: Field) -> Result<Self, WireError> {
        let items = field.into_list()?;
        let [round_change_identifier, certificate, proposal]: [Field; 3] = items
            .try_into()
            .map_err(|_| WireError::MalformedFrame("new round needs 3 fields".into()))?;
        Ok(NewRoundPayload {
            round_change_identifier: round_identifier_from_field(round_change_identifier)?,
            round_change_certificate: RoundChangeCertificate::from_field(certificate)?,
            proposal: signed_data_from_field(proposal)?,
        })
    }
}
