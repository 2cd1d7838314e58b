use core::fmt;

/// Opaque reference to one open archive. 0 is never handed out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveHandle(pub u64);

impl ArchiveHandle {
    pub const INVALID: ArchiveHandle = ArchiveHandle(0);
    pub(crate) const FIRST: ArchiveHandle = ArchiveHandle(1);

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Option<ArchiveHandle> {
        self.0.checked_add(1).map(ArchiveHandle)
    }
}

impl From<u64> for ArchiveHandle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchiveHandle({})", &self.0)
    }
}

impl fmt::Display for ArchiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0)
    }
}
