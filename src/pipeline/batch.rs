//! Batch (unit of work) and Item (one tracked file).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::RemoteId;
use crate::storage::{RemoteStore, StoreError};
use crate::utils::config::{PackagePaths, ScratchLayout};

#[derive(Error, Debug)]
pub enum ItemError {
    #[error("cannot download {0}: a local copy already exists")]
    AlreadyLocal(RemoteId),

    #[error("cannot upload {0}: it already has a remote copy")]
    AlreadyRemote(RemoteId),

    #[error("{0} has no local copy")]
    NotLocal(RemoteId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One file tracked by a batch: a remote identity plus where (and whether) it exists locally.
#[derive(Clone, Debug)]
pub struct Item {
    pub remote: RemoteId,
    pub local_name: String,
    pub local_dir: PathBuf,
    has_local_copy: bool,
    has_remote_copy: bool,
}

impl Item {
    /// Item that exists only remotely; its local name is the remote base name.
    pub fn remote_only(remote: RemoteId, local_dir: &Path) -> Self {
        let local_name = remote.name().to_string();
        Self {
            remote,
            local_name,
            local_dir: local_dir.to_path_buf(),
            has_local_copy: false,
            has_remote_copy: true,
        }
    }

    /// Item that exists only locally and is destined for `remote`.
    pub fn local_only(remote: RemoteId, local_name: impl Into<String>, local_dir: &Path) -> Self {
        Self {
            remote,
            local_name: local_name.into(),
            local_dir: local_dir.to_path_buf(),
            has_local_copy: true,
            has_remote_copy: false,
        }
    }

    pub fn local_path(&self) -> PathBuf {
        self.local_dir.join(&self.local_name)
    }

    pub fn has_local_copy(&self) -> bool {
        self.has_local_copy
    }

    pub fn has_remote_copy(&self) -> bool {
        self.has_remote_copy
    }

    /// Materialize the remote object locally. Never overwrites an existing local copy, its
    /// own or another item's file at the same local path.
    pub fn download(&mut self, store: &dyn RemoteStore, tries: usize) -> Result<(), ItemError> {
        if self.has_local_copy || self.local_path().exists() {
            return Err(ItemError::AlreadyLocal(self.remote.clone()));
        }
        store.fetch(&self.remote, &self.local_path(), tries)?;
        self.has_local_copy = true;
        Ok(())
    }

    /// Push the local copy to its remote identity. Never uploads twice.
    pub fn upload(&mut self, store: &dyn RemoteStore, tries: usize) -> Result<(), ItemError> {
        if self.has_remote_copy {
            return Err(ItemError::AlreadyRemote(self.remote.clone()));
        }
        if !self.has_local_copy {
            return Err(ItemError::NotLocal(self.remote.clone()));
        }
        store.store(&self.remote, &self.local_path(), tries)?;
        self.has_remote_copy = true;
        Ok(())
    }

    pub fn remove_local(&mut self) -> Result<(), ItemError> {
        if !self.has_local_copy {
            return Err(ItemError::NotLocal(self.remote.clone()));
        }
        fs::remove_file(self.local_path())?;
        self.has_local_copy = false;
        Ok(())
    }
}

/// Unit of work: a scratch root with `input/` and `output/`, and the items to fetch into it.
///
/// The scratch tree exists from construction until [`Batch::cleanup`], which consumes the
/// batch. Dropping a batch without `cleanup` leaves the tree on disk.
#[derive(Debug)]
pub struct Batch {
    id: usize,
    root: PathBuf,
    inputs: Vec<Item>,
}

impl Batch {
    /// Create a fresh scratch root under `scratch_location` (or the system temp dir).
    pub fn new(id: usize, scratch_location: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PackagePaths::get().scratch_prefix());
        let dir = match scratch_location {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        fs::create_dir(dir.path().join(ScratchLayout::INPUT_DIR))?;
        fs::create_dir(dir.path().join(ScratchLayout::OUTPUT_DIR))?;
        // From here on the batch, not the TempDir guard, owns removal.
        let root = dir.keep();
        Ok(Self {
            id,
            root,
            inputs: Vec::new(),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_path(&self) -> PathBuf {
        self.root.join(ScratchLayout::INPUT_DIR)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(ScratchLayout::OUTPUT_DIR)
    }

    pub fn inputs(&self) -> &[Item] {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut [Item] {
        &mut self.inputs
    }

    /// Track a remote object to be fetched into `input/`.
    pub fn add_input(&mut self, remote: RemoteId) {
        let dir = self.input_path();
        self.inputs.push(Item::remote_only(remote, &dir));
    }

    /// Track a file already present in `input/` (no remote counterpart).
    pub fn add_local_input(&mut self, local_name: &str) {
        let dir = self.input_path();
        self.inputs
            .push(Item::local_only(RemoteId::new(local_name), local_name, &dir));
    }

    pub fn input_identities(&self) -> Vec<RemoteId> {
        self.inputs.iter().map(|i| i.remote.clone()).collect()
    }

    /// One local-only item per file under `output/`, destined for `destination/<name>`.
    /// Read-only: the filesystem is not touched. Two files sharing a base name in different
    /// subdirectories would map to one remote identity, so that is an error.
    pub fn collect_outputs(&self, destination: &RemoteId) -> io::Result<Vec<Item>> {
        let mut items: Vec<Item> = Vec::new();
        for entry in WalkDir::new(self.output_path()).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let dir = entry
                .path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.output_path());
            if let Some(prev) = items.iter().find(|i| i.local_name == name) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!(
                        "{} and {} would both publish as {}",
                        prev.local_path().display(),
                        entry.path().display(),
                        destination.join(&name)
                    ),
                ));
            }
            items.push(Item::local_only(destination.join(&name), name, &dir));
        }
        Ok(items)
    }

    /// Remove the whole scratch tree. Consumes the batch so it can only happen once.
    pub fn cleanup(self) -> io::Result<()> {
        fs::remove_dir_all(&self.root)
    }
}
