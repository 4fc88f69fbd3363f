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

//! `Commit` message validation.

use crate::block::BlockRef;
use crate::crypto::{Address, SignatureScheme};
use crate::error::ValidationError;
use crate::ids::ConsensusRoundIdentifier;
use crate::messages::{CommitPayload, MessageType, SignedData};
use crate::validation::context::{ChainContext, ValidatorSet};
use crate::validation::event::ValidationEvent;
use crate::validation::{check_height, check_is_validator};

/// Validates a `Commit` against the round and block it is expected to
/// finalize, and returns the recovered sender on success.
///
/// Beyond the common height/signer checks, a commit must: target the
/// expected round, target the given block's hash, and carry a `commit_seal`
/// that the same sender produced over that block's `committed_seal_hash`
/// (not its plain hash, so a commit seal can never be replayed as a generic
/// message signature over the block).
pub fn validate_commit<C: ValidatorSet + ChainContext>(
    signed: &SignedData<CommitPayload>,
    expected_round_identifier: ConsensusRoundIdentifier,
    expected_block: &dyn BlockRef,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    let result = check_commit(signed, expected_round_identifier, expected_block, context, scheme);
    ValidationEvent::emit(MessageType::Commit, expected_round_identifier, &result);
    result
}

fn check_commit<C: ValidatorSet + ChainContext>(
    signed: &SignedData<CommitPayload>,
    expected_round_identifier: ConsensusRoundIdentifier,
    expected_block: &dyn BlockRef,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    check_height(expected_round_identifier, context)?;

    let payload = signed.payload();
    if payload.round_identifier != expected_round_identifier {
        return Err(ValidationError::EmbeddedMismatch(
            "commit targets a different round than expected",
        ));
    }

    let sender = signed.sender(scheme)?;
    let validators = context.validators_at(expected_round_identifier.sequence_number);
    check_is_validator(sender, validators)?;

    if payload.digest != expected_block.hash() {
        return Err(ValidationError::EmbeddedMismatch(
            "commit digest does not match the expected block's hash",
        ));
    }

    let seal_bytes = expected_block.committed_seal_hash().as_bytes().to_vec();
    let seal_signer = scheme.recover_signer(&seal_bytes, &payload.commit_seal)?;
    if seal_signer != sender {
        return Err(ValidationError::EmbeddedMismatch(
            "commit seal was not produced by the message sender",
        ));
    }

    Ok(sender)
}
