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

//! Deterministic proposer selection.

use crate::crypto::Address;
use crate::ids::ConsensusRoundIdentifier;

/// Selects the expected proposer for `round_identifier` out of
/// `validators_ordered`, by round-robin over `sequence_number + round_number`.
///
/// Mirrors the leader-election formula `(height + round) % validators.len()`
/// used for Exonum's own round-robin leader selection; panics are not
/// possible here for a non-empty validator set, and an empty set is a
/// configuration error the caller must rule out before validating anything.
pub fn proposer_for(
    round_identifier: ConsensusRoundIdentifier,
    validators_ordered: &[Address],
) -> Address {
    assert!(
        !validators_ordered.is_empty(),
        "proposer selection requires a non-empty validator set"
    );
    let sequence_number = u64::from(round_identifier.sequence_number);
    let round_number = u64::from(round_identifier.round_number);
    let index = (sequence_number + round_number) % validators_ordered.len() as u64;
    validators_ordered[index as usize]
}
