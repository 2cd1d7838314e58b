//! Archives that map straight onto a host directory.
//!
//! Save data and the SD card behave the same on the host but answer failures
//! with different result codes, so the mechanics live here and each flavour
//! brings its own [`HostErrors`] table.

use crate::{
    directory::DirectoryListing,
    error::*,
    file::Mode,
    path::{FsPath, HostStatus, PathParser},
    result::ResultCode,
    storage::{FileStorage, Storage},
    FsError, FsResult,
};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

/// Result codes a host directory flavour reports, by situation.
#[derive(Debug)]
pub(crate) struct HostErrors {
    /// Target file missing, or the mount point itself missing.
    pub file_not_found: ResultCode,
    /// A file was expected and a directory was found, or the other way round.
    pub unexpected_kind: ResultCode,
    pub file_exists: ResultCode,
    pub directory_exists: ResultCode,
    /// Target directory missing.
    pub directory_not_found: ResultCode,
    /// Directory to open sits below a file.
    pub directory_in_file: ResultCode,
    /// Removing the root, or a directory with children.
    pub directory_not_empty: ResultCode,
}

pub(crate) static SAVE_DATA_ERRORS: HostErrors = HostErrors {
    file_not_found: ERROR_FILE_NOT_FOUND,
    unexpected_kind: ERROR_UNEXPECTED_FILE_OR_DIRECTORY,
    file_exists: ERROR_FILE_ALREADY_EXISTS,
    directory_exists: ERROR_DIRECTORY_ALREADY_EXISTS,
    directory_not_found: ERROR_PATH_NOT_FOUND,
    directory_in_file: ERROR_UNEXPECTED_FILE_OR_DIRECTORY,
    directory_not_empty: ERROR_DIRECTORY_NOT_EMPTY,
};

pub(crate) static SDMC_ERRORS: HostErrors = HostErrors {
    file_not_found: ERROR_NOT_FOUND,
    unexpected_kind: ERROR_UNEXPECTED_FILE_OR_DIRECTORY_SDMC,
    file_exists: ERROR_ALREADY_EXISTS,
    directory_exists: ERROR_ALREADY_EXISTS,
    directory_not_found: ERROR_NOT_FOUND,
    directory_in_file: ERROR_PATH_NOT_FOUND,
    directory_not_empty: ERROR_DIRECTORY_NOT_EMPTY,
};

/// Free space reported for host backed archives, the host's real free space
/// isn't something guests should see.
pub(crate) const HOST_FREE_BYTES: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
pub(crate) struct HostDirectory {
    mount_point: PathBuf,
    errors: &'static HostErrors,
}

impl HostDirectory {
    pub fn new(mount_point: PathBuf, errors: &'static HostErrors) -> Self {
        Self {
            mount_point,
            errors,
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    fn parse(&self, path: &FsPath) -> FsResult<(PathParser, HostStatus)> {
        let parser = PathParser::parse(path).map_err(|e| {
            log::error!("invalid path {path}");
            e
        })?;
        let status = parser.host_status(&self.mount_point);
        Ok((parser, status))
    }

    pub fn open_file(&self, path: &FsPath, mode: Mode) -> FsResult<Storage> {
        log::debug!("opening {path} with {mode:?}");
        let (parser, status) = self.parse(path)?;
        let e = self.errors;

        match status {
            HostStatus::InvalidMountPoint => {
                log::error!("mount point {} not found", self.mount_point.display());
                return Err(e.file_not_found.into());
            }
            HostStatus::PathNotFound | HostStatus::FileInPath => {
                log::error!("path not found for {path}");
                return Err(ERROR_PATH_NOT_FOUND.into());
            }
            HostStatus::DirectoryFound => {
                log::error!("{path} is a directory, not a file");
                return Err(e.unexpected_kind.into());
            }
            HostStatus::NotFound if !mode.create() => {
                log::error!("non-existing file {path} can't be opened without the create flag");
                return Err(e.file_not_found.into());
            }
            HostStatus::NotFound | HostStatus::FileFound => {}
        }

        let full_path = parser.build_host_path(&self.mount_point);
        let fp = OpenOptions::new()
            .read(true)
            .write(mode.write())
            .create(mode.create())
            .open(full_path)?;
        Ok(FileStorage::new(fp, mode.write()))
    }

    pub fn delete_file(&self, path: &FsPath) -> FsResult<()> {
        let (parser, status) = self.parse(path)?;
        let e = self.errors;

        match status {
            HostStatus::FileFound => {}
            HostStatus::DirectoryFound => {
                log::error!("{path} is a directory, not a file");
                return Err(e.unexpected_kind.into());
            }
            _ => {
                log::error!("file {path} not found");
                return Err(e.file_not_found.into());
            }
        }

        fs::remove_file(parser.build_host_path(&self.mount_point))?;
        Ok(())
    }

    pub fn create_file(&self, path: &FsPath, size: u64) -> FsResult<()> {
        let (parser, status) = self.parse(path)?;
        let e = self.errors;

        match status {
            HostStatus::NotFound => {}
            HostStatus::InvalidMountPoint => return Err(e.file_not_found.into()),
            HostStatus::PathNotFound | HostStatus::FileInPath => {
                log::error!("path not found for {path}");
                return Err(ERROR_PATH_NOT_FOUND.into());
            }
            HostStatus::DirectoryFound => return Err(e.unexpected_kind.into()),
            HostStatus::FileFound => {
                log::error!("{path} already exists");
                return Err(e.file_exists.into());
            }
        }

        let full_path = parser.build_host_path(&self.mount_point);
        let fp = fs::File::create(&full_path)?;
        if size != 0 && fp.set_len(size).is_err() {
            log::error!("too large file size {size} for {path}");
            drop(fp);
            if let Err(e) = fs::remove_file(&full_path) {
                log::warn!("cleaning up {} failed: {e}", full_path.display());
            }
            return Err(ERROR_TOO_LARGE.into());
        }
        Ok(())
    }

    pub fn create_directory(&self, path: &FsPath) -> FsResult<()> {
        let (parser, status) = self.parse(path)?;
        let e = self.errors;

        match status {
            HostStatus::NotFound => {}
            HostStatus::InvalidMountPoint => return Err(e.file_not_found.into()),
            HostStatus::PathNotFound | HostStatus::FileInPath => {
                log::error!("path not found for {path}");
                return Err(ERROR_PATH_NOT_FOUND.into());
            }
            HostStatus::DirectoryFound | HostStatus::FileFound => {
                log::error!("{path} already exists");
                return Err(e.directory_exists.into());
            }
        }

        fs::create_dir(parser.build_host_path(&self.mount_point))?;
        Ok(())
    }

    pub fn delete_directory(&self, path: &FsPath, recursive: bool) -> FsResult<()> {
        let (parser, status) = self.parse(path)?;
        let e = self.errors;

        if parser.is_root() {
            log::error!("the archive root can't be removed");
            return Err(e.directory_not_empty.into());
        }

        match status {
            HostStatus::DirectoryFound => {}
            HostStatus::FileFound => {
                log::error!("{path} is a file, not a directory");
                return Err(e.unexpected_kind.into());
            }
            _ => {
                log::error!("directory {path} not found");
                return Err(e.directory_not_found.into());
            }
        }

        let full_path = parser.build_host_path(&self.mount_point);
        let removed = if recursive {
            fs::remove_dir_all(full_path)
        } else {
            fs::remove_dir(full_path)
        };
        removed.map_err(|err| {
            log::error!("removing {path} failed: {err}");
            FsError::from(e.directory_not_empty)
        })
    }

    /// Renames inside this directory. The source has to be a file when
    /// `directory` is false and a directory otherwise, the destination must
    /// not exist yet.
    pub fn rename(&self, src: &FsPath, dest: &FsPath, directory: bool) -> FsResult<()> {
        let (src_parser, src_status) = self.parse(src)?;
        let (dest_parser, dest_status) = self.parse(dest)?;
        let e = self.errors;

        let not_found = if directory {
            e.directory_not_found
        } else {
            e.file_not_found
        };
        match (src_status, directory) {
            (HostStatus::FileFound, false) | (HostStatus::DirectoryFound, true) => {}
            (HostStatus::FileFound, true) | (HostStatus::DirectoryFound, false) => {
                return Err(e.unexpected_kind.into())
            }
            _ => {
                log::error!("rename source {src} not found");
                return Err(not_found.into());
            }
        }

        match dest_status {
            HostStatus::NotFound => {}
            HostStatus::FileFound | HostStatus::DirectoryFound => {
                log::error!("rename destination {dest} already exists");
                return Err(if directory {
                    e.directory_exists
                } else {
                    e.file_exists
                }
                .into());
            }
            _ => return Err(ERROR_PATH_NOT_FOUND.into()),
        }

        fs::rename(
            src_parser.build_host_path(&self.mount_point),
            dest_parser.build_host_path(&self.mount_point),
        )?;
        Ok(())
    }

    pub fn open_directory(&self, path: &FsPath) -> FsResult<DirectoryListing> {
        let (parser, status) = self.parse(path)?;
        let e = self.errors;

        match status {
            HostStatus::DirectoryFound => {}
            HostStatus::FileInPath => return Err(e.directory_in_file.into()),
            _ => {
                log::error!("directory {path} not found");
                return Err(e.directory_not_found.into());
            }
        }

        DirectoryListing::scan_host(&parser.build_host_path(&self.mount_point))
    }
}
