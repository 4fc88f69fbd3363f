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

//! Validation outcome telemetry.
//!
//! Every `validate_*` entry point builds one [`ValidationEvent`] right before
//! it returns and logs it; the event never influences the accept/reject
//! decision, it only gives a caller something to grep for the way
//! `NodeHandler::handle_consensus`'s `trace!`/`warn!` calls do for the node
//! this crate's validators were split out of.

use log::{info, warn};

use crate::crypto::Address;
use crate::error::ValidationError;
use crate::ids::ConsensusRoundIdentifier;
use crate::messages::MessageType;

/// One validation attempt's message kind, round, sender (if recovered) and
/// outcome, purely for logging.
pub(crate) struct ValidationEvent {
    kind: MessageType,
    round_identifier: ConsensusRoundIdentifier,
    sender: Option<Address>,
    outcome: Result<(), ValidationError>,
}

impl ValidationEvent {
    /// Builds the event for a just-finished validation call and logs it at
    /// `info!` on acceptance or `warn!` on rejection.
    pub(crate) fn emit(
        kind: MessageType,
        round_identifier: ConsensusRoundIdentifier,
        result: &Result<Address, ValidationError>,
    ) {
        let event = ValidationEvent {
            kind,
            round_identifier,
            sender: result.as_ref().ok().copied(),
            outcome: result.as_ref().map(|_| ()).map_err(Clone::clone),
        };
        match &event.outcome {
            Ok(()) => info!(
                "accepted {:?} from {:?} for round {}",
                event.kind, event.sender, event.round_identifier
            ),
            Err(err) => warn!(
                "rejected {:?} for round {}: {}",
                event.kind, event.round_identifier, err
            ),
        }
    }
}
