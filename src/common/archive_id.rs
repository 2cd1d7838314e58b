use crate::FsError;
use core::fmt;

/// Archive categories, addressed by guest software with these exact codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum ArchiveIdCode {
    SelfNcch = 0x0000_0003,
    SaveData = 0x0000_0004,
    ExtSaveData = 0x0000_0006,
    SharedExtSaveData = 0x0000_0007,
    SystemSaveData = 0x0000_0008,
    Sdmc = 0x0000_0009,
    SdmcWriteOnly = 0x0000_000A,
    Ncch = 0x2345_678A,
    OtherSaveDataGeneral = 0x5678_90B2,
    OtherSaveDataPermitted = 0x5678_90B4,
}

impl ArchiveIdCode {
    /// Every category, in the order a full registry registers them.
    pub const ALL: [ArchiveIdCode; 10] = [
        ArchiveIdCode::Sdmc,
        ArchiveIdCode::SdmcWriteOnly,
        ArchiveIdCode::SaveData,
        ArchiveIdCode::OtherSaveDataPermitted,
        ArchiveIdCode::OtherSaveDataGeneral,
        ArchiveIdCode::ExtSaveData,
        ArchiveIdCode::SharedExtSaveData,
        ArchiveIdCode::Ncch,
        ArchiveIdCode::SystemSaveData,
        ArchiveIdCode::SelfNcch,
    ];

    pub const fn raw(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        use ArchiveIdCode::*;
        match self {
            SelfNcch => "SelfNCCH",
            SaveData => "SaveData",
            ExtSaveData => "ExtSaveData",
            SharedExtSaveData => "SharedExtSaveData",
            SystemSaveData => "SystemSaveData",
            Sdmc => "SDMC",
            SdmcWriteOnly => "SDMCWriteOnly",
            Ncch => "NCCH",
            OtherSaveDataGeneral => "OtherSaveDataGeneral",
            OtherSaveDataPermitted => "OtherSaveDataPermitted",
        }
    }
}

impl TryFrom<u32> for ArchiveIdCode {
    type Error = FsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ArchiveIdCode::ALL
            .into_iter()
            .find(|code| code.raw() == value)
            .ok_or(FsError::UnknownArchiveIdCode(value))
    }
}

impl fmt::Display for ArchiveIdCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.raw())
    }
}

/// Physical medium an archive lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum MediaType {
    Nand = 0,
    Sdmc = 1,
    GameCard = 2,
}

impl TryFrom<u32> for MediaType {
    type Error = FsError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MediaType::Nand),
            1 => Ok(MediaType::Sdmc),
            2 => Ok(MediaType::GameCard),
            other => Err(FsError::UnknownMediaType(other)),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MediaType::Nand => "NAND",
                MediaType::Sdmc => "SDMC",
                MediaType::GameCard => "GameCard",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorSummary;

    #[test]
    fn id_codes_are_wire_stable() {
        let expected = [
            (ArchiveIdCode::SelfNcch, 0x3),
            (ArchiveIdCode::SaveData, 0x4),
            (ArchiveIdCode::ExtSaveData, 0x6),
            (ArchiveIdCode::SharedExtSaveData, 0x7),
            (ArchiveIdCode::SystemSaveData, 0x8),
            (ArchiveIdCode::Sdmc, 0x9),
            (ArchiveIdCode::SdmcWriteOnly, 0xA),
            (ArchiveIdCode::Ncch, 0x2345678A),
            (ArchiveIdCode::OtherSaveDataGeneral, 0x567890B2),
            (ArchiveIdCode::OtherSaveDataPermitted, 0x567890B4),
        ];

        for (code, raw) in expected {
            assert_eq!(code.raw(), raw);
            assert_eq!(ArchiveIdCode::try_from(raw).ok(), Some(code));
        }
    }

    #[test]
    fn unknown_codes_are_not_found() {
        let err = ArchiveIdCode::try_from(0x1234_5678).unwrap_err();
        assert_eq!(err.summary(), ErrorSummary::NotFound);

        assert!(MediaType::try_from(3).is_err());
        assert_eq!(MediaType::try_from(1).ok(), Some(MediaType::Sdmc));
    }
}
