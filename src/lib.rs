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

//! Message-validation core of an IBFT 2.0 consensus engine.
//!
//! # Overview
//!
//! This crate validates the five IBFT 2.0 protocol messages — `Proposal`,
//! `Prepare`, `Commit`, `RoundChange` and `NewRound` — against a validator
//! set and the local chain height. It owns:
//!
//! - [`messages`]: the payload shapes, the signed envelope ([`messages::SignedData`])
//!   wrapping each one, and the tagged wire format ([`messages::Message`]).
//! - [`codec`]: the recursive length-prefixed binary encoding every payload
//!   serializes through.
//! - [`crypto`]: fixed-size primitives ([`crypto::Address`], [`crypto::Digest`],
//!   [`crypto::Signature`]) and the [`crypto::SignatureScheme`] boundary used
//!   to recover a message's sender.
//! - [`validation`]: the per-message-type validators and the
//!   [`validation::ValidationContext`] they run against.
//!
//! What this crate does *not* do: it never stores messages, drives round
//! timers, or decides when to send a message — it only answers "is this
//! message, as received, one this validator should accept." Networking,
//! persistence and the round-change timeout state machine are the
//! surrounding node's job.

#![warn(
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    bare_trait_objects
)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    // Next `cast_*` lints don't give alternatives.
    clippy::cast_possible_wrap, clippy::cast_possible_truncation, clippy::cast_sign_loss,
    // Next lints produce too much noise/false positives.
    clippy::module_name_repetitions, clippy::similar_names, clippy::must_use_candidate,
    // Too much work to fix.
    clippy::missing_errors_doc, clippy::missing_const_for_fn
)]

pub mod block;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod ids;
pub mod messages;
pub mod validation;

pub use crate::block::{Block, BlockRef};
pub use crate::crypto::{Address, Digest, Secp256k1RecoverableScheme, Signature, SignatureScheme};
pub use crate::error::{ValidationError, WireError};
pub use crate::ids::{ConsensusRoundIdentifier, RoundNumber, SequenceNumber};
pub use crate::messages::{Message, MessageType, Payload, SignedData};
pub use crate::validation::{
    byzantine_quorum_size, validate_commit, validate_new_round, validate_prepare,
    validate_proposal, validate_round_change, ChainContext, ValidationContext, ValidatorSet,
};
