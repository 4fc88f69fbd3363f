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

//! The external state the validators need: the validator set, the quorum it
//! implies, the local chain height, and the signature scheme to recover
//! senders with.
//!
//! None of this is owned by the validation core; it is handed in by the
//! surrounding node (block storage, validator-set management) through these
//! two small traits, kept separate from the actual validation functions the
//! same way `State::leader`/`State::majority_count` are plain queries over
//! `exonum`'s node state rather than something the consensus handler computes
//! inline.

use crate::crypto::{Address, SignatureScheme};
use crate::ids::SequenceNumber;

/// The set of validators eligible to participate at a given height, and the
/// quorum size that set implies.
pub trait ValidatorSet {
    /// Ordered validator addresses at `sequence_number`. Proposer selection
    /// indexes into this slice, so callers must return a stable order.
    fn validators_at(&self, sequence_number: SequenceNumber) -> &[Address];

    /// Number of signed payloads required for a Byzantine quorum at
    /// `sequence_number`, i.e. `floor(2n/3) + 1` for `n` validators.
    fn quorum_size_at(&self, sequence_number: SequenceNumber) -> usize {
        byzantine_quorum_size(self.validators_at(sequence_number).len())
    }
}

/// The chain height the local node is currently trying to agree on.
pub trait ChainContext {
    /// Current local chain height, i.e. the sequence number a validator
    /// expects an incoming message to target.
    fn local_chain_height(&self) -> SequenceNumber;
}

/// Computes the Byzantine quorum size for `validator_count` validators:
/// `floor(2n/3) + 1`, tolerating up to `floor((n-1)/3)` faulty validators.
pub fn byzantine_quorum_size(validator_count: usize) -> usize {
    validator_count * 2 / 3 + 1
}

/// A fixed validator set and chain height, bundled with the signature scheme
/// used to recover senders. The straightforward [`ValidatorSet`] and
/// [`ChainContext`] implementation used when the validator set does not
/// change across the heights a validation call cares about.
pub struct ValidationContext<'a> {
    validators: Vec<Address>,
    local_chain_height: SequenceNumber,
    scheme: &'a dyn SignatureScheme,
}

impl<'a> ValidationContext<'a> {
    /// Builds a context for a fixed validator set at the given chain height.
    pub fn new(
        validators: Vec<Address>,
        local_chain_height: SequenceNumber,
        scheme: &'a dyn SignatureScheme,
    ) -> Self {
        ValidationContext {
            validators,
            local_chain_height,
            scheme,
        }
    }

    /// The signature scheme used to recover message senders.
    pub fn scheme(&self) -> &dyn SignatureScheme {
        self.scheme
    }
}

impl<'a> ValidatorSet for ValidationContext<'a> {
    fn validators_at(&self, _sequence_number: SequenceNumber) -> &[Address] {
        &self.validators
    }
}

impl<'a> ChainContext for ValidationContext<'a> {
    fn local_chain_height(&self) -> SequenceNumber {
        self.local_chain_height
    }
}
