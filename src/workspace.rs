//! Entry point for front ends: one loaded game at a time
//!
//! A [`Workspace`] owns at most one [`AssetSet`]. Loading a new game directory
//! closes the previous archives before any new one is opened, so old and new
//! handles are never live together.

use crate::assets::{AssetSet, DirListing, Role};
use crate::config::Config;
use crate::error::{Result, ShslError};
use crate::pak::Pak;
use crate::script::{script_entries, OpcodeLengthTable, Script, ScriptEntry};
use std::path::Path;
use tracing::{info, warn};

/// File extensions handed to an image codec
const IMAGE_EXTENSIONS: &[&str] = &["tga", "png", "gim", "bmp"];

/// What a front end should show for a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Decompiled script text
    Script(String),
    /// Raw bytes of an image, to be decoded elsewhere
    Image(Vec<u8>),
    /// Entries of a pak, in order
    Pak(Vec<Vec<u8>>),
    Binary(Vec<u8>),
}

fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[derive(Debug, Default)]
pub struct Workspace {
    assets: Option<AssetSet>,
    config: Config,
    table: OpcodeLengthTable,
}

impl Workspace {
    pub fn new(config: Config) -> Self {
        Self {
            assets: None,
            config,
            table: OpcodeLengthTable::STANDARD,
        }
    }

    /// Use a different opcode length table for script decoding
    pub fn with_table(mut self, table: OpcodeLengthTable) -> Self {
        self.table = table;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the archives of a game directory, replacing any loaded game
    ///
    /// On failure the workspace is left unloaded.
    pub fn open_game_dir<P: AsRef<Path>>(&mut self, game_dir: P) -> Result<()> {
        self.close();
        let assets = AssetSet::open_game_dir(game_dir.as_ref(), &self.config.layout)?;
        info!(game_dir = %game_dir.as_ref().display(), "loaded game");
        self.assets = Some(assets);
        Ok(())
    }

    /// Drop the loaded archives, if any
    pub fn close(&mut self) {
        if self.assets.take().is_some() {
            info!("closed game");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.assets.is_some()
    }

    pub fn assets(&self) -> Result<&AssetSet> {
        self.assets.as_ref().ok_or(ShslError::NotLoaded)
    }

    fn assets_mut(&mut self) -> Result<&mut AssetSet> {
        self.assets.as_mut().ok_or(ShslError::NotLoaded)
    }

    pub fn list_directory(&self, path: &str) -> Result<Vec<DirListing>> {
        self.assets()?.list_directory(path)
    }

    pub fn read_file(&mut self, path: &str) -> Result<Vec<u8>> {
        self.assets_mut()?.read_file(path)
    }

    /// Decode script bytes with this workspace's length table
    pub fn decode_script<'a>(&self, bytes: &'a [u8]) -> Result<Script<'a>> {
        Script::decode(bytes, &self.table)
    }

    /// Decode and render script bytes
    pub fn decompile(&self, bytes: &[u8]) -> Result<String> {
        Ok(self.decode_script(bytes)?.decompile(&self.config.decompile))
    }

    /// Event scripts in the configured script directory of the locale archive
    pub fn scripts(&self) -> Result<Vec<ScriptEntry>> {
        let assets = self.assets()?;
        let dir = &self.config.layout.script_dir;
        script_entries(assets.get(Role::Locale), dir)
    }

    /// Read `path` and classify it for display
    ///
    /// A script or pak that fails to decode is shown as binary.
    pub fn preview(&mut self, path: &str) -> Result<Preview> {
        let bytes = self.read_file(path)?;
        let ext = extension(path);

        match ext.as_deref() {
            Some("lin") => match self.decompile(&bytes) {
                Ok(text) => Ok(Preview::Script(text)),
                Err(err) => {
                    warn!(path, error = %err, "script did not decode");
                    Ok(Preview::Binary(bytes))
                }
            },
            Some("pak") => {
                let entries: Result<Vec<Vec<u8>>> =
                    Pak::decode(&bytes).map(|pak| pak.iter().map(<[u8]>::to_vec).collect());
                match entries {
                    Ok(entries) => Ok(Preview::Pak(entries)),
                    Err(err) => {
                        warn!(path, error = %err, "pak did not decode");
                        Ok(Preview::Binary(bytes))
                    }
                }
            }
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Ok(Preview::Image(bytes)),
            _ => Ok(Preview::Binary(bytes)),
        }
    }
}
