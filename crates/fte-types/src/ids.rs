//! Entity identities.
//!
//! Districts, factions, pieces, and rumors are addressed by small integer
//! identities rather than by name, matching the arena-of-entities shape
//! described for the source system: the engine owns no graph of owning
//! pointers, only `mapping<id, mapping<id, value>>` edges.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(DistrictId, "Unique identifier for a district.");
id_type!(FactionId, "Unique identifier for a faction.");
id_type!(PieceId, "Unique identifier for an agent or squadron piece.");
id_type!(RumorId, "Unique identifier for a rumor entry in a district.");
