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

//! Small identifier newtypes widely used across the crate.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Blockchain height (block/sequence number that a round belongs to).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// Returns the zero sequence number.
    pub fn zero() -> Self {
        SequenceNumber(0)
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SequenceNumber> for u64 {
    fn from(val: SequenceNumber) -> Self {
        val.0
    }
}

/// IBFT round number within a given height. Non-negative by construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundNumber(pub u32);

impl RoundNumber {
    /// Returns the zero round (reached only through genesis/normal progression).
    pub fn zero() -> Self {
        RoundNumber(0)
    }

    /// Returns the first non-trivial round, the lowest a `NewRound` may target.
    pub fn first() -> Self {
        RoundNumber(1)
    }

    /// Returns the next round.
    pub fn next(self) -> Self {
        RoundNumber(self.0 + 1)
    }
}

impl fmt::Display for RoundNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RoundNumber> for u32 {
    fn from(val: RoundNumber) -> Self {
        val.0
    }
}

impl From<RoundNumber> for u64 {
    fn from(val: RoundNumber) -> Self {
        u64::from(val.0)
    }
}

/// Pair `(sequence_number, round_number)` identifying a single attempt to agree
/// on a block at a given height.
///
/// Total order is lexicographic by `(sequence_number, round_number)`, which the
/// derived `Ord` implementation gives for free because `sequence_number` is
/// declared first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsensusRoundIdentifier {
    /// Target block height.
    pub sequence_number: SequenceNumber,
    /// IBFT round within that height.
    pub round_number: RoundNumber,
}

impl ConsensusRoundIdentifier {
    /// Creates a new round identifier from raw height/round values.
    pub fn new(sequence_number: u64, round_number: u32) -> Self {
        ConsensusRoundIdentifier {
            sequence_number: SequenceNumber(sequence_number),
            round_number: RoundNumber(round_number),
        }
    }
}

impl fmt::Display for ConsensusRoundIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.sequence_number, self.round_number)
    }
}
