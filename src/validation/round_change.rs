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

//! `RoundChange` message validation, including the nested `PreparedCertificate`.

use std::collections::HashSet;

use crate::block::BlockRef;
use crate::crypto::{Address, SignatureScheme};
use crate::error::ValidationError;
use crate::ids::ConsensusRoundIdentifier;
use crate::messages::{MessageType, PreparedCertificate, RoundChangePayload, SignedData};
use crate::validation::context::{ChainContext, ValidatorSet};
use crate::validation::event::ValidationEvent;
use crate::validation::{check_height, check_is_validator};

use super::proposer::proposer_for;

/// Validates a `RoundChange` against the round the caller currently expects
/// one for, and returns the recovered sender on success.
///
/// If the payload carries a [`PreparedCertificate`], it is validated in full
/// against the round the certificate claims to have prepared.
pub fn validate_round_change<C: ValidatorSet + ChainContext>(
    signed: &SignedData<RoundChangePayload>,
    target_round: ConsensusRoundIdentifier,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    let result = check_round_change(signed, target_round, context, scheme);
    ValidationEvent::emit(MessageType::RoundChange, target_round, &result);
    result
}

fn check_round_change<C: ValidatorSet + ChainContext>(
    signed: &SignedData<RoundChangePayload>,
    target_round: ConsensusRoundIdentifier,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    let payload = signed.payload();
    if payload.round_change_identifier != target_round {
        return Err(ValidationError::EmbeddedMismatch(
            "round change targets a different round than expected",
        ));
    }
    check_height(payload.round_change_identifier, context)?;

    let sender = signed.sender(scheme)?;
    let validators = context.validators_at(payload.round_change_identifier.sequence_number);
    check_is_validator(sender, validators)?;

    if let Some(certificate) = &payload.prepared_certificate {
        validate_prepared_certificate(
            certificate,
            payload.round_change_identifier,
            context,
            scheme,
        )?;
    }

    Ok(sender)
}

/// Validates that `certificate` is internally consistent evidence that a
/// quorum prepared its proposal at some round strictly before
/// `target_round_identifier`, at the same sequence number.
pub fn validate_prepared_certificate<C: ValidatorSet + ChainContext>(
    certificate: &PreparedCertificate,
    target_round_identifier: ConsensusRoundIdentifier,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<(), ValidationError> {
    let proposal_round = certificate.proposal.payload().round_identifier;

    if proposal_round.sequence_number != target_round_identifier.sequence_number
        || proposal_round.round_number >= target_round_identifier.round_number
    {
        return Err(ValidationError::PreparedCertificateInvalid(
            "prepared certificate's proposal round must precede the target round at the same sequence number",
        ));
    }

    let validators = context.validators_at(proposal_round.sequence_number);
    let proposal_sender = certificate
        .proposal
        .sender(scheme)
        .map_err(|_| ValidationError::PreparedCertificateInvalid("proposal signature did not recover"))?;
    check_is_validator(proposal_sender, validators)
        .map_err(|_| ValidationError::PreparedCertificateInvalid("proposal signer is not a validator"))?;

    let expected_proposer = proposer_for(proposal_round, validators);
    if proposal_sender != expected_proposer {
        return Err(ValidationError::PreparedCertificateInvalid(
            "proposal was not signed by the round's expected proposer",
        ));
    }
    if certificate.proposal.payload().block.header_number()
        != u64::from(proposal_round.sequence_number)
    {
        return Err(ValidationError::PreparedCertificateInvalid(
            "proposal's block number does not match its round identifier's sequence number",
        ));
    }

    let quorum_size = context.quorum_size_at(proposal_round.sequence_number);
    let required_prepares = quorum_size.saturating_sub(1);
    if certificate.prepares.len() < required_prepares {
        return Err(ValidationError::PreparedCertificateInvalid(
            "prepared certificate does not carry enough prepares for quorum",
        ));
    }

    let mut seen_senders: HashSet<Address> = HashSet::new();
    seen_senders.insert(proposal_sender);
    let block_hash = certificate.proposal.payload().block.hash();

    for prepare in &certificate.prepares {
        let prepare_payload = prepare.payload();
        if prepare_payload.round_identifier != proposal_round {
            return Err(ValidationError::PreparedCertificateInvalid(
                "prepare targets a different round than the certificate's proposal",
            ));
        }
        if prepare_payload.digest != block_hash {
            return Err(ValidationError::PreparedCertificateInvalid(
                "prepare digest does not match the certificate's proposed block",
            ));
        }
        let prepare_sender = prepare
            .sender(scheme)
            .map_err(|_| ValidationError::PreparedCertificateInvalid("prepare signature did not recover"))?;
        check_is_validator(prepare_sender, validators)
            .map_err(|_| ValidationError::PreparedCertificateInvalid("prepare signer is not a validator"))?;
        if !seen_senders.insert(prepare_sender) {
            return Err(ValidationError::PreparedCertificateInvalid(
                "prepared certificate has a duplicate sender",
            ));
        }
    }

    Ok(())
}
