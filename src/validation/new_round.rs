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

//! `NewRound` message validation: the composite check tying a round change
//! certificate to the proposal that is meant to carry the round forward.

use std::collections::HashSet;

use crate::block::BlockRef;
use crate::crypto::{Address, SignatureScheme};
use crate::error::ValidationError;
use crate::ids::RoundNumber;
use crate::messages::{MessageType, NewRoundPayload, PreparedCertificate, SignedData};
use crate::validation::context::{ChainContext, ValidatorSet};
use crate::validation::event::ValidationEvent;
use crate::validation::round_change::validate_prepared_certificate;
use crate::validation::{check_height, check_is_validator};

use super::proposer::proposer_for;

/// Validates a `NewRound` message end to end:
///
/// 1. The round targeted is not round zero.
/// 2. The message targets the local chain height.
/// 3. The sender is the expected proposer for the target round.
/// 4. The round-change certificate carries a quorum of round changes, all
///    targeting the same round, from distinct known validators.
/// 5. Every round change in the certificate validates, including any
///    prepared certificate it carries.
/// 6. If any round change carries a prepared certificate, the embedded
///    proposal's block must match the block from the *latest* (highest
///    proposal round, ties broken by ascending proposal-sender address)
///    prepared certificate in the set.
/// 7. The embedded proposal itself validates as a `Proposal` would, against
///    the target round.
pub fn validate_new_round<C: ValidatorSet + ChainContext>(
    signed: &SignedData<NewRoundPayload>,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    let round_identifier = signed.payload().round_change_identifier;
    let result = check_new_round(signed, context, scheme);
    ValidationEvent::emit(MessageType::NewRound, round_identifier, &result);
    result
}

fn check_new_round<C: ValidatorSet + ChainContext>(
    signed: &SignedData<NewRoundPayload>,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    let payload = signed.payload();
    let round_identifier = payload.round_change_identifier;

    if round_identifier.round_number == RoundNumber::zero() {
        return Err(ValidationError::IllegalRoundZero);
    }
    check_height(round_identifier, context)?;

    let sender = signed.sender(scheme)?;
    let validators = context.validators_at(round_identifier.sequence_number);
    check_is_validator(sender, validators)?;

    let expected_proposer = proposer_for(round_identifier, validators);
    if sender != expected_proposer {
        return Err(ValidationError::WrongProposer {
            actual: sender,
            expected: expected_proposer,
            round: round_identifier,
        });
    }

    let round_changes = &payload.round_change_certificate.payloads;
    let quorum_size = context.quorum_size_at(round_identifier.sequence_number);
    if round_changes.len() < quorum_size {
        return Err(ValidationError::InsufficientQuorum {
            actual: round_changes.len(),
            required: quorum_size,
        });
    }

    let mut seen_senders: HashSet<Address> = HashSet::new();
    let mut latest_certificate: Option<&PreparedCertificate> = None;

    for round_change in round_changes {
        if round_change.payload().round_change_identifier != round_identifier {
            return Err(ValidationError::InconsistentCertificate(
                "round change in certificate targets a different round",
            ));
        }

        let round_change_sender = round_change.sender(scheme)?;
        check_is_validator(round_change_sender, validators)?;
        if !seen_senders.insert(round_change_sender) {
            return Err(ValidationError::InconsistentCertificate(
                "round change certificate has a duplicate sender",
            ));
        }

        if let Some(certificate) = &round_change.payload().prepared_certificate {
            validate_prepared_certificate(certificate, round_identifier, context, scheme)?;
            latest_certificate = Some(pick_later(latest_certificate, certificate, scheme)?);
        }
    }

    if let Some(certificate) = latest_certificate {
        if payload.proposal.payload().block.hash() != certificate.proposal.payload().block.hash() {
            return Err(ValidationError::BlockMismatchWithLatestPrepared);
        }
    }

    if payload.proposal.payload().round_identifier != round_identifier {
        return Err(ValidationError::EmbeddedMismatch(
            "embedded proposal targets a different round than the NewRound message",
        ));
    }
    let proposal_sender = payload.proposal.sender(scheme)?;
    if proposal_sender != sender {
        return Err(ValidationError::EmbeddedMismatch(
            "embedded proposal was not signed by the NewRound message's sender",
        ));
    }
    if payload.proposal.payload().block.header_number() != u64::from(round_identifier.sequence_number)
    {
        return Err(ValidationError::EmbeddedMismatch(
            "embedded proposal's block number does not match the target sequence number",
        ));
    }

    Ok(sender)
}

/// Compares `candidate` against `current`, keeping whichever represents the
/// later preparation: the higher proposal round wins; a tie is broken by the
/// ascending address of the proposal's sender.
fn pick_later<'a>(
    current: Option<&'a PreparedCertificate>,
    candidate: &'a PreparedCertificate,
    scheme: &dyn SignatureScheme,
) -> Result<&'a PreparedCertificate, ValidationError> {
    let current = match current {
        None => return Ok(candidate),
        Some(current) => current,
    };

    let current_round = current.proposal.payload().round_identifier.round_number;
    let candidate_round = candidate.proposal.payload().round_identifier.round_number;

    if candidate_round > current_round {
        return Ok(candidate);
    }
    if candidate_round < current_round {
        return Ok(current);
    }

    let current_sender = current.proposal.sender(scheme)?;
    let candidate_sender = candidate.proposal.sender(scheme)?;
    if candidate_sender < current_sender {
        Ok(candidate)
    } else {
        Ok(current)
    }
}
