// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Governor Labs, Inc.

//! Opaque identifier newtypes.
//!
//! The data model in [`crate::types`] threads six distinct id spaces through
//! the engine (agent, intent, decision, correlation, HITL review, anomaly).
//! Wrapping each in its own newtype means a misplaced `ReviewId` where an
//! `IntentId` is expected is a compile error rather than a runtime surprise.
//!
//! All newtypes are transparent over `String` for serialization so the wire
//! format is unaffected — only the in-process type system gets stricter.

use alloc::string::{String, ToString};
use core::fmt;
use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a fresh random id (UUID v4).
            #[cfg(feature = "std")]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

opaque_id!(AgentId, "Stable identifier for an autonomous agent.");
opaque_id!(IntentId, "Identifier of a frozen, content-addressable [`crate::types::Intent`].");
opaque_id!(DecisionId, "Identifier of an [`crate::types::Decision`].");
opaque_id!(CorrelationId, "Groups causally related intents/decisions/events.");
opaque_id!(ReviewId, "Identifier of a [`crate::types::HitlReview`].");
opaque_id!(AnomalyId, "Identifier of a detected [`crate::types::Anomaly`].");
opaque_id!(ApiKeyId, "Identifier of an issued API key (not the secret itself).");
