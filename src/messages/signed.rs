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

//! The signed-envelope wrapper every on-the-wire payload travels inside.

use crate::crypto::{Address, Signature, SignatureScheme};
use crate::error::ValidationError;
use crate::messages::payloads::Payload;

/// A payload together with the signature over its canonical encoding.
///
/// The sender is never carried alongside the payload: it is always derived by
/// recovering the signature, so a `SignedData` can never claim a sender that
/// didn't actually produce the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedData<P: Payload> {
    payload: P,
    signature: Signature,
}

impl<P: Payload> SignedData<P> {
    /// Wraps a payload with a (not yet verified) signature.
    pub fn new(payload: P, signature: Signature) -> Self {
        SignedData { payload, signature }
    }

    /// The wrapped payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// The signature over the payload's canonical encoding.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Recovers and returns the address that produced `signature`, per
    /// `scheme`. This is the only way to learn who sent a message; a
    /// `SignedData` carries no separate, unverified sender field.
    pub fn sender(&self, scheme: &dyn SignatureScheme) -> Result<Address, ValidationError> {
        let bytes = self.payload.encode();
        scheme.recover_signer(&bytes, &self.signature)
    }
}
