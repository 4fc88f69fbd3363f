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

//! Message validation: the per-message-type checks and the shared context
//! they run against.

pub mod commit;
pub mod context;
mod event;
pub mod new_round;
pub mod prepare;
pub mod proposal;
pub mod proposer;
pub mod round_change;

pub use commit::validate_commit;
pub use context::{byzantine_quorum_size, ChainContext, ValidationContext, ValidatorSet};
pub use new_round::validate_new_round;
pub use prepare::validate_prepare;
pub use proposal::validate_proposal;
pub use proposer::proposer_for;
pub use round_change::{validate_prepared_certificate, validate_round_change};

use crate::crypto::Address;
use crate::error::ValidationError;
use crate::ids::ConsensusRoundIdentifier;

/// Checks that `round_identifier` targets the context's local chain height.
/// Shared by every message-type validator, since all five message shapes
/// embed a height the same way.
fn check_height<C: ChainContext>(
    round_identifier: ConsensusRoundIdentifier,
    context: &C,
) -> Result<(), ValidationError> {
    let found = round_identifier.sequence_number;
    let expected = context.local_chain_height();
    if found != expected {
        return Err(ValidationError::WrongHeight {
            found: u64::from(found),
            expected: u64::from(expected),
        });
    }
    Ok(())
}

/// Checks that `sender` is a member of `validators`.
fn check_is_validator(sender: Address, validators: &[Address]) -> Result<(), ValidationError> {
    if validators.contains(&sender) {
        Ok(())
    } else {
        Err(ValidationError::UnknownSigner(sender))
    }
}
