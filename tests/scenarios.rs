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

//! End-to-end `NewRound` validation scenarios over a fixed four-validator
//! set, mirroring the worked examples for the round-change certificate and
//! latest-prepared-block rules: `V = [A, B, C, D]`, `quorum_size = 3`,
//! `local_chain_height = 10`, `proposer_for((h, r)) = V[(h + r) mod 4]`.

use ibft_validation_core::block::Block;
use ibft_validation_core::crypto::testing::{address_of, sign};
use ibft_validation_core::crypto::{Address, Digest, Secp256k1RecoverableScheme};
use ibft_validation_core::ids::{ConsensusRoundIdentifier, SequenceNumber};
use ibft_validation_core::messages::{
    NewRoundPayload, Payload, PreparePayload, PreparedCertificate, ProposalPayload,
    RoundChangeCertificate, RoundChangePayload, SignedData,
};
use ibft_validation_core::validation::ValidationContext;
use ibft_validation_core::{validate_new_round, ValidationError};

use pretty_assertions::assert_eq;
use secp256k1::SecretKey;

const HEIGHT: u64 = 10;

struct Fixture {
    keys: Vec<SecretKey>,
    validators: Vec<Address>,
}

impl Fixture {
    fn new() -> Self {
        let keys: Vec<_> = (1..=4_u8)
            .map(|b| SecretKey::from_slice(&[b; 32]).unwrap())
            .collect();
        let validators = keys.iter().map(address_of).collect();
        Fixture { keys, validators }
    }

    fn proposer_index(&self, round: u32) -> usize {
        (HEIGHT as usize + round as usize) % self.validators.len()
    }

    fn block(&self, hash_byte: u8) -> Block {
        Block {
            number: HEIGHT,
            hash: Digest([hash_byte; 32]),
            seal_hash: Digest([hash_byte.wrapping_add(0x40); 32]),
            body: vec![],
        }
    }

    fn signed_proposal(
        &self,
        signer: usize,
        round: u32,
        hash_byte: u8,
    ) -> SignedData<ProposalPayload> {
        let payload = ProposalPayload {
            round_identifier: ConsensusRoundIdentifier::new(HEIGHT, round),
            block: self.block(hash_byte),
        };
        let signature = sign(&payload.encode(), &self.keys[signer]);
        SignedData::new(payload, signature)
    }

    fn signed_round_change(
        &self,
        signer: usize,
        round: u32,
        prepared_certificate: Option<PreparedCertificate>,
    ) -> SignedData<RoundChangePayload> {
        let payload = RoundChangePayload {
            round_change_identifier: ConsensusRoundIdentifier::new(HEIGHT, round),
            prepared_certificate,
        };
        let signature = sign(&payload.encode(), &self.keys[signer]);
        SignedData::new(payload, signature)
    }

    fn signed_prepare(&self, signer: usize, round: u32, digest: Digest) -> SignedData<PreparePayload> {
        let payload = PreparePayload {
            round_identifier: ConsensusRoundIdentifier::new(HEIGHT, round),
            digest,
        };
        let signature = sign(&payload.encode(), &self.keys[signer]);
        SignedData::new(payload, signature)
    }

    fn new_round(
        &self,
        signer: usize,
        round: u32,
        round_changes: Vec<SignedData<RoundChangePayload>>,
        proposal: SignedData<ProposalPayload>,
    ) -> SignedData<NewRoundPayload> {
        let payload = NewRoundPayload {
            round_change_identifier: ConsensusRoundIdentifier::new(HEIGHT, round),
            round_change_certificate: RoundChangeCertificate { payloads: round_changes },
            proposal,
        };
        let signature = sign(&payload.encode(), &self.keys[signer]);
        SignedData::new(payload, signature)
    }

    fn context(&self, scheme: &Secp256k1RecoverableScheme) -> ValidationContext<'_> {
        ValidationContext::new(self.validators.clone(), SequenceNumber(HEIGHT), scheme)
    }
}

#[test]
fn scenario_1_happy_path_without_a_prepared_certificate() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    let round = 2;
    let proposer = fx.proposer_index(round);
    assert_eq!(proposer, 0, "expected A to be the round (10, 2) proposer");

    let round_changes = vec![
        fx.signed_round_change(0, round, None),
        fx.signed_round_change(1, round, None),
        fx.signed_round_change(2, round, None),
    ];
    let proposal = fx.signed_proposal(proposer, round, 0xA0);
    let message = fx.new_round(proposer, round, round_changes, proposal);

    let sender = validate_new_round(&message, &context, &scheme).unwrap();
    assert_eq!(sender, fx.validators[proposer]);
}

#[test]
fn scenario_2_happy_path_with_a_latest_prepared_certificate() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    let round = 2;
    let proposer = fx.proposer_index(round);

    let earlier_round = 1;
    let earlier_proposer = fx.proposer_index(earlier_round);
    let earlier_proposal = fx.signed_proposal(earlier_proposer, earlier_round, 0xA0);
    let block_hash = earlier_proposal.payload().block.hash;
    let preparers: Vec<usize> = (0..fx.validators.len())
        .filter(|&i| i != earlier_proposer)
        .take(2)
        .collect();
    let prepares = preparers
        .iter()
        .map(|&i| fx.signed_prepare(i, earlier_round, block_hash))
        .collect();
    let certificate = PreparedCertificate { proposal: earlier_proposal, prepares };

    let round_changes = vec![
        fx.signed_round_change(0, round, None),
        fx.signed_round_change(1, round, Some(certificate)),
        fx.signed_round_change(2, round, None),
    ];
    // The NewRound proposal carries forward the same block the certificate prepared.
    let proposal = fx.signed_proposal(proposer, round, 0xA0);
    let message = fx.new_round(proposer, round, round_changes, proposal);

    validate_new_round(&message, &context, &scheme).unwrap();
}

#[test]
fn scenario_3_block_mismatch_with_latest_prepared_is_rejected() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    let round = 2;
    let proposer = fx.proposer_index(round);

    let earlier_round = 1;
    let earlier_proposer = fx.proposer_index(earlier_round);
    let earlier_proposal = fx.signed_proposal(earlier_proposer, earlier_round, 0xA0);
    let block_hash = earlier_proposal.payload().block.hash;
    let preparers: Vec<usize> = (0..fx.validators.len())
        .filter(|&i| i != earlier_proposer)
        .take(2)
        .collect();
    let prepares = preparers
        .iter()
        .map(|&i| fx.signed_prepare(i, earlier_round, block_hash))
        .collect();
    let certificate = PreparedCertificate { proposal: earlier_proposal, prepares };

    let round_changes = vec![
        fx.signed_round_change(0, round, None),
        fx.signed_round_change(1, round, Some(certificate)),
        fx.signed_round_change(2, round, None),
    ];
    // A different block (0xB0) than the one the certificate prepared (0xA0).
    let proposal = fx.signed_proposal(proposer, round, 0xB0);
    let message = fx.new_round(proposer, round, round_changes, proposal);

    let err = validate_new_round(&message, &context, &scheme).unwrap_err();
    assert_eq!(err, ValidationError::BlockMismatchWithLatestPrepared);
}

#[test]
fn scenario_4_wrong_proposer_is_rejected() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    let round = 2;
    let expected_proposer = fx.proposer_index(round);
    let impostor = (expected_proposer + 1) % fx.validators.len();

    let round_changes = vec![
        fx.signed_round_change(0, round, None),
        fx.signed_round_change(1, round, None),
        fx.signed_round_change(2, round, None),
    ];
    // The embedded proposal must match the outer sender to reach the
    // proposer check with a consistent NewRound; signing both with the
    // impostor still trips `WrongProposer` because the impostor is not
    // `proposer_for((10, 2))`.
    let proposal = fx.signed_proposal(impostor, round, 0xA0);
    let message = fx.new_round(impostor, round, round_changes, proposal);

    let err = validate_new_round(&message, &context, &scheme).unwrap_err();
    assert!(matches!(err, ValidationError::WrongProposer { .. }));
}

#[test]
fn scenario_5_insufficient_quorum_is_rejected() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    let round = 2;
    let proposer = fx.proposer_index(round);

    // Only two round changes; quorum_size_at(4 validators) == 3.
    let round_changes = vec![
        fx.signed_round_change(0, round, None),
        fx.signed_round_change(1, round, None),
    ];
    let proposal = fx.signed_proposal(proposer, round, 0xA0);
    let message = fx.new_round(proposer, round, round_changes, proposal);

    let err = validate_new_round(&message, &context, &scheme).unwrap_err();
    assert_eq!(
        err,
        ValidationError::InsufficientQuorum { actual: 2, required: 3 }
    );
}

#[test]
fn duplicate_round_change_sender_is_rejected() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    let round = 2;
    let proposer = fx.proposer_index(round);

    let round_changes = vec![
        fx.signed_round_change(0, round, None),
        fx.signed_round_change(0, round, None),
        fx.signed_round_change(2, round, None),
    ];
    let proposal = fx.signed_proposal(proposer, round, 0xA0);
    let message = fx.new_round(proposer, round, round_changes, proposal);

    let err = validate_new_round(&message, &context, &scheme).unwrap_err();
    assert!(matches!(err, ValidationError::InconsistentCertificate(_)));
}

#[test]
fn round_zero_is_illegal_but_round_one_is_accepted() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    let zero_round_proposer = fx.proposer_index(0);
    let round_changes = vec![
        fx.signed_round_change(0, 0, None),
        fx.signed_round_change(1, 0, None),
        fx.signed_round_change(2, 0, None),
    ];
    let proposal = fx.signed_proposal(zero_round_proposer, 0, 0xA0);
    let message = fx.new_round(zero_round_proposer, 0, round_changes, proposal);
    let err = validate_new_round(&message, &context, &scheme).unwrap_err();
    assert_eq!(err, ValidationError::IllegalRoundZero);

    let one_round_proposer = fx.proposer_index(1);
    let round_changes = vec![
        fx.signed_round_change(0, 1, None),
        fx.signed_round_change(1, 1, None),
        fx.signed_round_change(2, 1, None),
    ];
    let proposal = fx.signed_proposal(one_round_proposer, 1, 0xA0);
    let message = fx.new_round(one_round_proposer, 1, round_changes, proposal);
    validate_new_round(&message, &context, &scheme).unwrap();
}

#[test]
fn scenario_6_a_prepared_certificate_on_an_impossible_future_round_is_rejected() {
    let fx = Fixture::new();
    let scheme = Secp256k1RecoverableScheme;
    let context = fx.context(&scheme);

    // NewRound targets round 2; one round-change carries a valid certificate
    // prepared at round 1, another carries a certificate that claims to have
    // been prepared at round 3 — a round that, relative to the (10, 2) this
    // NewRound targets, could not yet have happened.
    let round = 2;
    let proposer = fx.proposer_index(round);

    let valid_round = 1;
    let valid_proposer = fx.proposer_index(valid_round);
    let valid_proposal = fx.signed_proposal(valid_proposer, valid_round, 0xA0);
    let valid_block_hash = valid_proposal.payload().block.hash;
    let valid_preparers: Vec<usize> = (0..fx.validators.len())
        .filter(|&i| i != valid_proposer)
        .take(2)
        .collect();
    let valid_prepares = valid_preparers
        .iter()
        .map(|&i| fx.signed_prepare(i, valid_round, valid_block_hash))
        .collect();
    let valid_certificate = PreparedCertificate { proposal: valid_proposal, prepares: valid_prepares };

    let impossible_round = 3;
    let impossible_proposer = fx.proposer_index(impossible_round);
    let impossible_proposal = fx.signed_proposal(impossible_proposer, impossible_round, 0xB0);
    let impossible_block_hash = impossible_proposal.payload().block.hash;
    let impossible_preparers: Vec<usize> = (0..fx.validators.len())
        .filter(|&i| i != impossible_proposer)
        .take(2)
        .collect();
    let impossible_prepares = impossible_preparers
        .iter()
        .map(|&i| fx.signed_prepare(i, impossible_round, impossible_block_hash))
        .collect();
    let impossible_certificate =
        PreparedCertificate { proposal: impossible_proposal, prepares: impossible_prepares };

    let round_changes = vec![
        fx.signed_round_change(0, round, Some(valid_certificate)),
        fx.signed_round_change(1, round, Some(impossible_certificate)),
        fx.signed_round_change(2, round, None),
    ];
    let proposal = fx.signed_proposal(proposer, round, 0xA0);
    let message = fx.new_round(proposer, round, round_changes, proposal);

    let err = validate_new_round(&message, &context, &scheme).unwrap_err();
    assert!(matches!(err, ValidationError::PreparedCertificateInvalid(_)));
}
