use std::fmt;

/// An opaque context object name. Zero means "no object".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Handle(u32);

impl Handle {
    /// The sentinel name: nothing bound, or a moved-from wrapper.
    pub const NONE: Handle = Handle(0);

    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("Handle(none)")
        } else {
            write!(f, "Handle({})", self.0)
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
