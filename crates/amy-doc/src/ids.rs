//! Stable handles into the universe arenas.
//!
//! Handles are never reused within one universe; a handle to a destroyed
//! entity simply stops resolving.

use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(
    /// Handle to an element, attached or detached.
    ElementId,
    "e"
);
id_type!(
    /// Handle to a document tree.
    TreeId,
    "t"
);
id_type!(
    /// Handle to a world.
    WorldId,
    "w"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed() {
        assert_eq!(ElementId(7).to_string(), "e7");
        assert_eq!(TreeId(1).to_string(), "t1");
        assert_eq!(WorldId(0).to_string(), "w0");
    }
}
