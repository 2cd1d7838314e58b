//! Host side layout of the emulated storage partitions.

use crate::{
    common::{SDCARD_ID, SYSTEM_ID},
    FsResult,
};
use std::path::{Path, PathBuf};

/// Environment variable consulted by [`FsConfig::from_env`].
pub const USER_DIR_ENV: &str = "CTRFS_USER_DIR";
const DEFAULT_USER_DIR: &str = "~/.local/share/ctrfs";

/// Where the NAND and SD card partitions live on the host, plus the console
/// identifiers that make up part of their directory structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfig {
    pub nand_directory: PathBuf,
    pub sdmc_directory: PathBuf,
    /// ID0, a hash unique to the console.
    pub system_id: String,
    /// ID1, the scrambled CID of the inserted SD card.
    pub sdcard_id: String,
}

impl FsConfig {
    pub fn new(nand_directory: impl Into<PathBuf>, sdmc_directory: impl Into<PathBuf>) -> Self {
        Self {
            nand_directory: nand_directory.into(),
            sdmc_directory: sdmc_directory.into(),
            system_id: SYSTEM_ID.into(),
            sdcard_id: SDCARD_ID.into(),
        }
    }

    /// Lays out `nand/` and `sdmc/` below a user directory. `~` and
    /// environment variables in `user_dir` are expanded.
    ///
    /// ```
    /// use ctrfs::config::FsConfig;
    ///
    /// let config = FsConfig::from_user_directory("/srv/emu").unwrap();
    /// assert_eq!(config.sdmc_directory, std::path::Path::new("/srv/emu/sdmc"));
    /// ```
    pub fn from_user_directory(user_dir: &str) -> FsResult<Self> {
        let expanded = shellexpand::full(user_dir).map_err(anyhow::Error::from)?;
        let root = Path::new(expanded.as_ref());

        Ok(Self::new(root.join("nand"), root.join("sdmc")))
    }

    /// Same as [`FsConfig::from_user_directory`] with the directory taken from
    /// `CTRFS_USER_DIR`, falling back to `~/.local/share/ctrfs`.
    pub fn from_env() -> FsResult<Self> {
        let user_dir = std::env::var(USER_DIR_ENV).unwrap_or_else(|_| DEFAULT_USER_DIR.into());
        log::debug!("using {user_dir:?} as user directory");
        Self::from_user_directory(&user_dir)
    }

    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = system_id.into();
        self
    }

    pub fn with_sdcard_id(mut self, sdcard_id: impl Into<String>) -> Self {
        self.sdcard_id = sdcard_id.into();
        self
    }

    /// `<sdmc>/Nintendo 3DS/<ID0>/<ID1>/`
    pub(crate) fn sdmc_id_directory(&self) -> PathBuf {
        self.sdmc_directory
            .join("Nintendo 3DS")
            .join(&self.system_id)
            .join(&self.sdcard_id)
    }

    /// `<nand>/data/<ID0>/`
    pub(crate) fn nand_id_directory(&self) -> PathBuf {
        self.nand_directory.join("data").join(&self.system_id)
    }
}
