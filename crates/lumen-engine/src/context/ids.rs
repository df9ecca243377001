use std::fmt;
use std::num::NonZeroU32;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            pub(crate) fn new(raw: NonZeroU32) -> Self {
                Self(raw)
            }

            /// Raw numeric handle; never zero.
            pub fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

object_id!(
    /// Compiled shader stage object.
    StageId
);
object_id!(
    /// Linked program object.
    ProgramId
);
object_id!(
    /// Vertex array (vertex buffer plus its layout).
    VertexArrayId
);
object_id!(
    /// Texture object.
    TextureId
);

/// Index of an active uniform within a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation(pub(crate) u32);

impl UniformLocation {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UniformLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic handle allocator. Handles are never reused, so a stale handle
/// can never alias a newer object. Once `u32::MAX` has been handed out the
/// allocator is exhausted.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    pub(crate) fn next(&mut self) -> Option<NonZeroU32> {
        let next = NonZeroU32::new(self.last.checked_add(1)?)?;
        self.last = next.get();
        Some(next)
    }

    #[cfg(test)]
    pub(crate) fn exhausted() -> Self {
        Self { last: u32::MAX }
    }
}
