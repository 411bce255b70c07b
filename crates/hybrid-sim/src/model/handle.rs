//! Opaque, tagged-by-kind handles used to index the flat state/signal/event/
//! input/output vectors.
//!
//! The Python original this crate is modeled after keys its internal
//! bookkeeping (the signal evaluation set, the "valid" sets, ...) by object
//! identity. A typed implementation cannot do that cheaply, so every entity
//! is assigned one of these small `Copy` handles at registration time, and
//! all evaluation-time bookkeeping (memoization, loop detection) indexes a
//! dense `Vec` by the handle's wrapped index rather than hashing the entity
//! itself.

use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl $name {
            /// The raw index into the corresponding flat vector.
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Handle for a [`crate::model::State`], indexing the flat state vector.
    StateId,
    "s"
);
define_handle!(
    /// Handle for a [`crate::model::Signal`], indexing the flat signal vector.
    SignalId,
    "g"
);
define_handle!(
    /// Handle for a [`crate::model::ZeroCrossEvent`], indexing the flat event vector.
    EventId,
    "e"
);
define_handle!(
    /// Handle for an [`crate::model::InputSignal`], indexing the flat input vector.
    InputId,
    "i"
);
define_handle!(
    /// Handle for an [`crate::model::OutputPort`], indexing the flat output vector.
    OutputId,
    "o"
);
