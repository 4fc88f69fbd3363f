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

//! Protocol messages: payload shapes, the signed envelope, and the top-level
//! tagged wire format that ties the two together.

pub mod payloads;
pub mod signed;

pub use payloads::{
    CommitPayload, MessageType, NewRoundPayload, Payload, PreparePayload, PreparedCertificate,
    ProposalPayload, RoundChangeCertificate, RoundChangePayload,
};
pub use signed::SignedData;

use crate::codec::Field;
use crate::error::WireError;
use payloads::{signed_data_field, signed_data_from_field};

/// One complete protocol message, tagged by its wire type and carrying its
/// signed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A proposer's candidate block for a round.
    Proposal(SignedData<ProposalPayload>),
    /// A vote that a well-formed proposal was seen.
    Prepare(SignedData<PreparePayload>),
    /// A validator's final vote.
    Commit(SignedData<CommitPayload>),
    /// A request to abandon the current round.
    RoundChange(SignedData<RoundChangePayload>),
    /// The new round's proposer announcing the round change and its proposal.
    NewRound(SignedData<NewRoundPayload>),
}

impl Message {
    /// The wire type tag for this message's payload shape.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Proposal(_) => MessageType::Proposal,
            Message::Prepare(_) => MessageType::Prepare,
            Message::Commit(_) => MessageType::Commit,
            Message::RoundChange(_) => MessageType::RoundChange,
            Message::NewRound(_) => MessageType::NewRound,
        }
    }

    /// Encodes this message as `tag ‖ [payload_list, signature]`.
    pub fn encode(&self) -> Vec<u8> {
        let field = match self {
            Message::Proposal(data) => signed_data_field(data),
            Message::Prepare(data) => signed_data_field(data),
            Message::Commit(data) => signed_data_field(data),
            Message::RoundChange(data) => signed_data_field(data),
            Message::NewRound(data) => signed_data_field(data),
        };
        let mut out = vec![self.message_type().tag()];
        field.write_to(&mut out);
        out
    }

    /// Decodes a message previously produced by [`Message::encode`].
    ///
    /// Callers that enforce a message size cap should call
    /// [`crate::codec::check_size_cap`] on `bytes` before this, so an
    /// oversized frame is rejected without being parsed.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        let (&tag, rest) = bytes
            .split_first()
            .ok_or_else(|| WireError::MalformedFrame("empty message frame".into()))?;
        let message_type = MessageType::from_tag(tag)?;
        let field = Field::decode(rest)?;
        Ok(match message_type {
            MessageType::Proposal => Message::Proposal(signed_data_from_field(field)?),
            MessageType::Prepare => Message::Prepare(signed_data_from_field(field)?),
            MessageType::Commit => Message::Commit(signed_data_from_field(field)?),
            MessageType::RoundChange => Message::RoundChange(signed_data_from_field(field)?),
            MessageType::NewRound => Message::NewRound(signed_data_from_field(field)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::crypto::testing::sign;
    use crate::crypto::Digest;
    use crate::ids::ConsensusRoundIdentifier;
    use secp256k1::SecretKey;

    #[test]
    fn proposal_message_round_trips_through_the_tagged_wire_format() {
        let secret_key = SecretKey::from_slice(&[13_u8; 32]).unwrap();
        let payload = ProposalPayload {
            round_identifier: ConsensusRoundIdentifier::new(4, 0),
            block: Block {
                number: 4,
                hash: Digest([2; 32]),
                seal_hash: Digest([3; 32]),
                body: vec![9, 9, 9],
            },
        };
        let signature = sign(&payload.encode(), &secret_key);
        let message = Message::Proposal(SignedData::new(payload, signature));

        let bytes = message.encode();
        assert_eq!(bytes[0], MessageType::Proposal.tag());
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let bytes = vec![0xFF_u8, 0x02, 0x00, 0x00, 0x00, 0x00];
        let err = Message::decode(&bytes).unwrap_err();
        assert!(matches!(err, WireError::UnknownMessageType(0xFF)));
    }

    #[test]
    fn empty_frame_is_rejected() {
        let err = Message::decode(&[]).unwrap_err();
        assert!(matches!(err, WireError::MalformedFrame(_)));
    }
}
