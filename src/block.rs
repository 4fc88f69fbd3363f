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

//! The block abstraction the validators consume.
//!
//! The validation core never looks past a block's header and hash: state
//! transition, parent linkage, and transaction execution are the block
//! importer's job, external to this crate.

use crate::crypto::Digest;

/// The minimal surface of a candidate block the validators need.
///
/// Implementors typically wrap a full block type owned by the surrounding
/// node; this crate only ever calls `hash` and `header_number`, plus
/// `committed_seal_hash` when checking a `Commit` vote.
pub trait BlockRef {
    /// Deterministic hash of the full block.
    fn hash(&self) -> Digest;

    /// The block number recorded in the header.
    fn header_number(&self) -> u64;

    /// Deterministic digest committed validators sign over to produce their
    /// `commit_seal`. Distinct from `hash` so that a commit seal cannot be
    /// replayed as a generic block signature.
    fn committed_seal_hash(&self) -> Digest;
}

/// An opaque candidate block as carried on the wire.
///
/// The block body itself is treated as opaque bytes: RLP/state-transition
/// semantics for its contents live in the (external) block importer. `hash`
/// and `seal_hash` are carried alongside the body rather than recomputed,
/// since computing them is that external collaborator's responsibility, not
/// this crate's.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    /// Block number, i.e. the `ConsensusRoundIdentifier::sequence_number` at
    /// which this block is proposed.
    pub number: u64,
    /// Deterministic hash of the full block contents.
    pub hash: Digest,
    /// Digest validators sign as their commit seal.
    pub seal_hash: Digest,
    /// Opaque, externally-defined encoding of the block body.
    pub body: Vec<u8>,
}

impl BlockRef for Block {
    fn hash(&self) -> Digest {
        self.hash
    }

    fn header_number(&self) -> u64 {
        self.number
    }

    fn committed_seal_hash(&self) -> Digest {
        self.seal_hash
    }
}
