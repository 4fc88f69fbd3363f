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

//! `Proposal` message validation.

use crate::block::BlockRef;
use crate::crypto::{Address, SignatureScheme};
use crate::error::ValidationError;
use crate::ids::ConsensusRoundIdentifier;
use crate::messages::{MessageType, ProposalPayload, SignedData};
use crate::validation::context::{ChainContext, ValidatorSet};
use crate::validation::event::ValidationEvent;
use crate::validation::{check_height, check_is_validator};

use super::proposer::proposer_for;

/// Validates a `Proposal` against the round the caller currently expects one
/// for, and returns the recovered sender on success.
///
/// Checks, in order: the expected round targets the local chain height, the
/// payload's own round identifier matches the one the caller expects, the
/// signature recovers to a known validator, that validator is the round's
/// expected proposer, and the embedded block's number matches the round's
/// sequence number.
pub fn validate_proposal<C: ValidatorSet + ChainContext>(
    signed: &SignedData<ProposalPayload>,
    expected_round_identifier: ConsensusRoundIdentifier,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    let result = check_proposal(signed, expected_round_identifier, context, scheme);
    ValidationEvent::emit(MessageType::Proposal, expected_round_identifier, &result);
    result
}

fn check_proposal<C: ValidatorSet + ChainContext>(
    signed: &SignedData<ProposalPayload>,
    expected_round_identifier: ConsensusRoundIdentifier,
    context: &C,
    scheme: &dyn SignatureScheme,
) -> Result<Address, ValidationError> {
    check_height(expected_round_identifier, context)?;

    let payload = signed.payload();
    if payload.round_identifier != expected_round_identifier {
        return Err(ValidationError::EmbeddedMismatch(
            "proposal targets a different round than expected",
        ));
    }

    let sender = signed.sender(scheme)?;
    let validators = context.validators_at(expected_round_identifier.sequence_number);
    check_is_validator(sender, validators)?;

    let expected = proposer_for(expected_round_identifier, validators);
    if sender != expected {
        return Err(ValidationError::WrongProposer {
            actual: sender,
            expected,
            round: expected_round_identifier,
        });
    }

    if payload.block.header_number() != u64::from(expected_round_identifier.sequence_number) {
        return Err(ValidationError::EmbeddedMismatch(
            "block number does not match the round identifier's sequence number",
        ));
    }

    Ok(sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::crypto::testing::sign;
    use crate::crypto::{Digest, Secp256k1RecoverableScheme};
    use crate::ids::{ConsensusRoundIdentifier, SequenceNumber};
    use crate::validation::context::ValidationContext;
    use secp256k1::SecretKey;

    fn block(number: u64) -> Block {
        Block {
            number,
            hash: Digest([1; 32]),
            seal_hash: Digest([2; 32]),
            body: vec![],
        }
    }

    fn signed_proposal(
        secret_key: &SecretKey,
        round_identifier: ConsensusRoundIdentifier,
        number: u64,
    ) -> SignedData<ProposalPayload> {
        let payload = ProposalPayload {
            round_identifier,
            block: block(number),
        };
        let signature = sign(&payload.encode(), secret_key);
        SignedData::new(payload, signature)
    }

    #[test]
    fn accepts_a_well_formed_proposal_from_the_expected_proposer() {
        let keys: Vec<_> = (1..=3).map(|b| SecretKey::from_slice(&[b; 32]).unwrap()).collect();
        let validators: Vec<_> = keys
            .iter()
            .map(crate::crypto::testing::address_of)
            .collect();
        let scheme = Secp256k1RecoverableScheme;
        let context = ValidationContext::new(validators.clone(), SequenceNumber(5), &scheme);

        let round_identifier = ConsensusRoundIdentifier::new(5, 0);
        let proposer_index = 5 % validators.len();
        let signed = signed_proposal(&keys[proposer_index], round_identifier, 5);

        let sender = validate_proposal(&signed, round_identifier, &context, &scheme).unwrap();
        assert_eq!(sender, validators[proposer_index]);
    }

    #[test]
    fn rejects_a_proposal_from_a_non_proposer() {
        let keys: Vec<_> = (1..=3).map(|b| SecretKey::from_slice(&[b; 32]).unwrap()).collect();
        let validators: Vec<_> = keys
            .iter()
            .map(crate::crypto::testing::address_of)
            .collect();
        let scheme = Secp256k1RecoverableScheme;
        let context = ValidationContext::new(validators.clone(), SequenceNumber(5), &scheme);

        let round_identifier = ConsensusRoundIdentifier::new(5, 0);
        let wrong_index = (5 % validators.len() + 1) % validators.len();
        let signed = signed_proposal(&keys[wrong_index], round_identifier, 5);

        let err = validate_proposal(&signed, round_identifier, &context, &scheme).unwrap_err();
        assert!(matches!(err, ValidationError::WrongProposer { .. }));
    }

    #[test]
    fn rejects_a_proposal_targeting_the_wrong_height() {
        let keys: Vec<_> = (1..=3).map(|b| SecretKey::from_slice(&[b; 32]).unwrap()).collect();
        let validators: Vec<_> = keys
            .iter()
            .map(crate::crypto::testing::address_of)
            .collect();
        let scheme = Secp256k1RecoverableScheme;
        let context = ValidationContext::new(validators, SequenceNumber(5), &scheme);

        let round_identifier = ConsensusRoundIdentifier::new(6, 0);
        let signed = signed_proposal(&keys[0], round_identifier, 6);

        let err = validate_proposal(&signed, round_identifier, &context, &scheme).unwrap_err();
        assert!(matches!(err, ValidationError::WrongHeight { .. }));
    }

    #[test]
    fn rejects_a_proposal_whose_own_round_does_not_match_the_expected_one() {
        let keys: Vec<_> = (1..=3).map(|b| SecretKey::from_slice(&[b; 32]).unwrap()).collect();
        let validators: Vec<_> = keys
            .iter()
            .map(crate::crypto::testing::address_of)
            .collect();
        let scheme = Secp256k1RecoverableScheme;
        let context = ValidationContext::new(validators, SequenceNumber(5), &scheme);

        // Payload claims round 1, but the caller expects round 0.
        let signed = signed_proposal(&keys[0], ConsensusRoundIdentifier::new(5, 1), 5);
        let expected_round_identifier = ConsensusRoundIdentifier::new(5, 0);

        let err =
            validate_proposal(&signed, expected_round_identifier, &context, &scheme).unwrap_err();
        assert!(matches!(err, ValidationError::EmbeddedMismatch(_)));
    }
}
