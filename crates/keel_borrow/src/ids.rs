//! Typed identifiers handed out by the table, tracker and stack.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifies one allocated value in the [`ResourceTable`](crate::ResourceTable).
    ResourceId,
    "r#"
);
define_id!(
    /// Identifies one borrow in the [`BorrowTracker`](crate::BorrowTracker).
    BorrowId,
    "b#"
);
define_id!(
    /// Identifies one scope in the [`ScopeStack`](crate::ScopeStack).
    ScopeId,
    "s#"
);
define_id!(
    /// Identifies the shared storage behind reference-counted handles.
    AllocationId,
    "a#"
);
