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

//! Error taxonomy for the wire codec and the message validators.

use thiserror::Error;

use crate::crypto::Address;
use crate::ids::ConsensusRoundIdentifier;

/// Failure to decode or encode a wire frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The codec could not parse the input as a well-formed frame.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// The one-byte type tag does not correspond to a known payload type.
    #[error("unknown message type tag: {0}")]
    UnknownMessageType(u8),
    /// The decoded message exceeds a configured size cap.
    #[error("message of size {actual} exceeds the cap of {limit} bytes")]
    OversizedMessage {
        /// Size of the offending message, in bytes.
        actual: usize,
        /// The configured cap that was exceeded.
        limit: usize,
    },
}

/// Reasons a protocol message was rejected by a validator.
///
/// Every check in §4 of the validation rules maps to exactly one variant
/// here; the first failing check for a given message determines which
/// variant is returned, and no message is ever accepted partially.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Signer recovery over the payload bytes failed.
    #[error("could not recover a signer from the message signature")]
    InvalidSignature,
    /// The recovered signer address is not a member of the validator set.
    #[error("signer {0} is not a member of the validator set")]
    UnknownSigner(Address),
    /// The sender is not the expected proposer for the round.
    #[error("sender {actual} is not the expected proposer {expected} for round {round:?}")]
    WrongProposer {
        /// Address that actually signed the message.
        actual: Address,
        /// Address the protocol expects to have signed it.
        expected: Address,
        /// Round the proposer was computed for.
        round: ConsensusRoundIdentifier,
    },
    /// The message's sequence number does not match the local chain height.
    #[error("message targets height {found:?}, local chain height is {expected:?}")]
    WrongHeight {
        /// Height carried by the message.
        found: u64,
        /// Height the validator was configured for.
        expected: u64,
    },
    /// A `NewRound` message targeted round zero.
    #[error("NewRound may not target round zero")]
    IllegalRoundZero,
    /// An embedded payload disagrees with the outer message it is nested in.
    #[error("embedded payload does not match the outer message: {0}")]
    EmbeddedMismatch(&'static str),
    /// A certificate carries fewer signed payloads than the quorum requires.
    #[error("certificate has {actual} payload(s), quorum requires {required}")]
    InsufficientQuorum {
        /// Number of payloads actually present.
        actual: usize,
        /// Number of payloads required for quorum.
        required: usize,
    },
    /// Round-change payloads inside a certificate disagree on the target round,
    /// or two payloads in the same certificate share a sender.
    #[error("round-change certificate is internally inconsistent: {0}")]
    InconsistentCertificate(&'static str),
    /// A prepared certificate failed its own internal validation.
    #[error("prepared certificate is invalid: {0}")]
    PreparedCertificateInvalid(&'static str),
    /// The proposed block does not match the latest prepared certificate's block.
    #[error("proposed block does not match the block from the latest prepared certificate")]
    BlockMismatchWithLatestPrepared,
}
