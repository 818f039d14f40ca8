//! Opaque solver handles.
//!
//! The solver issues these; nothing outside the solver may interpret the bits.
//! A handle is only meaningful while the solver world that issued it is alive.

use bytemuck::{Pod, Zeroable};

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw solver-issued value.
            #[inline]
            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw solver-issued value.
            #[inline]
            #[must_use]
            pub const fn to_raw(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

opaque_handle!(
    /// Handle of a rigid body inside the solver world.
    BodyHandle
);

opaque_handle!(
    /// Handle of a collider attached to a rigid body.
    ColliderHandle
);

opaque_handle!(
    /// Handle of a joint between two rigid bodies.
    JointHandle
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_raw_roundtrip() {
        let h = BodyHandle::from_raw(0xDEAD_BEEF);
        assert_eq!(h.to_raw(), 0xDEAD_BEEF);
        assert_eq!(h.to_string(), "BodyHandle(3735928559)");
    }
}
