//! Override-aware view over the archives of one game installation
//!
//! A game ships a base archive plus locale and keyboard overlays. Lookups walk
//! the archives in [`Role::PRIORITY`] order and the first archive that knows a
//! name wins; lower-priority entries with the same name are hidden, never merged.

use crate::archive::{join_path, ArchiveReader};
use crate::config::GameLayout;
use crate::error::{Result, ShslError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The part an archive plays in a game installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Base,
    Locale,
    BaseAlt,
    LocaleAlt,
}

impl Role {
    /// Resolution order, highest priority first
    pub const PRIORITY: [Role; 4] = [Role::Locale, Role::Base, Role::LocaleAlt, Role::BaseAlt];

    /// Position of the role in [`Role::PRIORITY`]
    pub fn priority_index(self) -> usize {
        match self {
            Role::Locale => 0,
            Role::Base => 1,
            Role::LocaleAlt => 2,
            Role::BaseAlt => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Base => "base",
            Role::Locale => "locale",
            Role::BaseAlt => "base-alt",
            Role::LocaleAlt => "locale-alt",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One child of a merged directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirListing {
    pub name: String,
    pub is_directory: bool,
    /// File size in bytes; `None` for directories
    pub size: Option<u64>,
    /// Archive the entry was taken from
    pub role: Role,
}

/// All archives of a game, opened together
#[derive(Debug)]
pub struct AssetSet {
    // One archive per role, indexed by `Role::priority_index`
    archives: Vec<(Role, ArchiveReader)>,
}

impl AssetSet {
    /// Open one archive per role
    ///
    /// Every role must be given. If any archive fails to open, the archives
    /// opened so far are closed and the failure is returned wrapped in
    /// [`ShslError::Aggregate`].
    pub fn open<I, P>(roles: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Role, P)>,
        P: AsRef<Path>,
    {
        let paths: BTreeMap<Role, PathBuf> = roles
            .into_iter()
            .map(|(role, path)| (role, path.as_ref().to_path_buf()))
            .collect();

        let mut archives = Vec::with_capacity(Role::PRIORITY.len());
        for role in Role::PRIORITY {
            let path = match paths.get(&role) {
                Some(path) => path,
                None => {
                    return Err(ShslError::aggregate(
                        "could not load game files",
                        ShslError::Config(format!("no archive given for role {}", role)),
                    ))
                }
            };

            match ArchiveReader::open(path) {
                Ok(reader) => archives.push((role, reader)),
                Err(err) => {
                    // Release what was already opened before reporting
                    drop(archives);
                    return Err(ShslError::aggregate(
                        format!(
                            "could not load game files ({} archive {})",
                            role,
                            path.display()
                        ),
                        err,
                    ));
                }
            }
        }

        info!("opened asset set with {} archives", archives.len());
        Ok(Self { archives })
    }

    /// Open the archives of a game directory laid out as `layout` describes
    pub fn open_game_dir<P: AsRef<Path>>(game_dir: P, layout: &GameLayout) -> Result<Self> {
        Self::open(layout.role_paths(game_dir.as_ref()))
    }

    pub fn get(&self, role: Role) -> &ArchiveReader {
        &self.archives[role.priority_index()].1
    }

    pub fn get_mut(&mut self, role: Role) -> &mut ArchiveReader {
        &mut self.archives[role.priority_index()].1
    }

    /// Archives in priority order
    pub fn archives(&self) -> impl Iterator<Item = (Role, &ArchiveReader)> {
        self.archives.iter().map(|(role, reader)| (*role, reader))
    }

    /// Role and file index of the archive that owns `path`
    pub fn resolve(&self, path: &str) -> Option<(Role, usize)> {
        self.archives
            .iter()
            .find_map(|(role, reader)| reader.file_index(path).map(|index| (*role, index)))
    }

    /// Whether any archive has a directory at `path`
    pub fn has_directory(&self, path: &str) -> bool {
        self.archives
            .iter()
            .any(|(_, reader)| reader.dir_index(path).is_some())
    }

    /// Size of the file that `read_file(path)` would return
    pub fn file_size(&self, path: &str) -> Option<u64> {
        let (role, index) = self.resolve(path)?;
        self.get(role).file_size(index)
    }

    /// Merged children of `path`, overlay entries first
    ///
    /// Within each archive the declaration order is kept; sorting is left to
    /// the caller.
    pub fn list_directory(&self, path: &str) -> Result<Vec<DirListing>> {
        let mut seen = HashSet::new();
        let mut listing = Vec::new();
        let mut found = false;

        for (role, reader) in &self.archives {
            let subfiles = match reader.dir_index(path).and_then(|i| reader.dir_subfiles(i)) {
                Some(subfiles) => subfiles,
                None => continue,
            };
            found = true;

            for subfile in subfiles {
                if !seen.insert(subfile.name.as_str()) {
                    continue;
                }

                let size = if subfile.is_directory {
                    None
                } else {
                    reader
                        .file_index(&join_path(path, &subfile.name))
                        .and_then(|index| reader.file_size(index))
                };

                listing.push(DirListing {
                    name: subfile.name.clone(),
                    is_directory: subfile.is_directory,
                    size,
                    role: *role,
                });
            }
        }

        if !found {
            return Err(ShslError::DirectoryNotFound(path.to_string()));
        }

        debug!(path, entries = listing.len(), "listed directory");
        Ok(listing)
    }

    /// Read a file from the highest-priority archive that contains it
    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        let (role, index) = self
            .resolve(path)
            .ok_or_else(|| ShslError::FileNotFound(path.to_string()))?;
        debug!(path, %role, "resolved file");
        self.get_mut(role).read_file(index)
    }
}
