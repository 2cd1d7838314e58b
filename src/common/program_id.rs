use core::fmt;

/// Title id of an application, split into two 32-bit words wherever it ends up
/// in a host path.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProgramId(pub u64);

impl ProgramId {
    pub const fn from_parts(high: u32, low: u32) -> Self {
        Self(((high as u64) << 32) | low as u64)
    }

    pub const fn high(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub const fn low(self) -> u32 {
        self.0 as u32
    }
}

impl From<u64> for ProgramId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramId({:016x})", &self.0)
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", &self.0)
    }
}
