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

//! `Prepare` message validation.

use crate::crypto::{Address, Digest, SignatureScheme};
use crate::error::ValidationError;
use crate::ids::ConsensusRoundIdentifier;
use crate::messages::{MessageType, PreparePayload, SignedData};
use crate::validation::context::{ChainContext, ValidatorSet};
use crate::validation::event::ValidationEvent;
use crate::validation::{check_height, check_is_validator};

use super::proposer::proposer_for;

/// Validates a `Prepare` against the round and proposed block the caller
/// currently expects a prepare for, and returns the recovered sender on
/// success.
///
/// The proposer of `expected_round_identifier` implicitly prepares by
/// proposing; an explicit `Prepare` from that same address is rejected, since
/// accepting it would let the proposer's single signature count twice toward
/// quorum.
pub fn validate_prepare<C: ValidatorSet + ChainContext>(
    signed: &SignedData<PreparePayload>,
    expected_round_identifier: ConsensusRoundIdentifier,
    expected_digest: Digest,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    let result = check_prepare(signed, expected_round_identifier, expected_digest, context, scheme);
    ValidationEvent::emit(MessageType::Prepare, expected_round_identifier, &result);
    result
}

fn check_prepare<C: ValidatorSet + ChainContext>(
    signed: &SignedData<PreparePayload>,
    expected_round_identifier: ConsensusRoundIdentifier,
    expected_digest: Digest,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    check_height(expected_round_identifier, context)?;

    let payload = signed.payload();
    if payload.round_identifier != expected_round_identifier {
        return Err(ValidationError::EmbeddedMismatch(
            "prepare targets a different round than expected",
        ));
    }
    if payload.digest != expected_digest {
        return Err(ValidationError::EmbeddedMismatch(
            "prepare digest does not match the expected proposal's block",
        ));
    }

    let sender = signed.sender(scheme)?;
    let validators = context.validators_at(expected_round_identifier.sequence_number);
    check_is_validator(sender, validators)?;

    let proposer = proposer_for(expected_round_identifier, validators);
    if sender == proposer {
        return Err(ValidationError::EmbeddedMismatch(
            "round's proposer implicitly prepares by proposing and may not send an explicit prepare",
        ));
    }

    Ok(sender)
}
