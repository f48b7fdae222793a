use std::fmt;

use serde::{Deserialize, Serialize};

/// Monotonic ID generator for one kind of simulation object.
///
/// Each engine owns its own generator, so ids are unique per kind, not globally.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_from(start: u64) -> Self {
        Self { next: start }
    }

    pub fn next_id<T: From<u64>>(&mut self) -> T {
        let id = self.next;
        self.next += 1;
        T::from(id)
    }

    /// The value the next call to `next_id` will hand out.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! typed_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub u64);

            impl From<u64> for $name {
                fn from(raw: u64) -> Self {
                    Self(raw)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

typed_id! {
    /// Identifies a citizen in the registry.
    CitizenId,
    /// Identifies a region. Regions are owned by the world outside the core.
    RegionId,
    /// Groups citizens of one household/lineage.
    FamilyId,
    DiseaseId,
    FamineId,
    MovementId,
    MessageId,
    /// Identifies a human player. Chosen by the embedding application.
    PlayerId,
}
