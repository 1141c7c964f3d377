//! Named instance collections on disk.
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::Map;

pub mod pizzabot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
  UnknownInstance(String),
  IndexOutOfRange { index: usize, len: usize },
  DuplicateName(String),
}

impl fmt::Display for DatasetError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DatasetError::UnknownInstance(name) => write!(f, "no instance named `{}` in the dataset", name),
      DatasetError::IndexOutOfRange { index, len } => write!(f, "instance index {} out of range (dataset has {} instances)", index, len),
      DatasetError::DuplicateName(name) => write!(f, "instance `{}` is listed twice in INDEX.txt", name),
    }
  }
}

impl std::error::Error for DatasetError {}

/// How instances of one kind are stored: where the dataset lives below the data root, the file
/// extension, and how a file is turned into an instance.
pub trait InstanceFormat {
  type Instance;
  const DIR: &'static str;
  const EXTENSION: &'static str;

  fn load(path: &Path, id: Cow<str>) -> Result<Self::Instance>;
}

/// A directory of instance files `<name>.<ext>` plus an `INDEX.txt` listing the names in index
/// order, one per line.  Blank lines and `#` comments in the index are ignored.
pub struct Catalog<F> {
  names: Vec<String>,
  index: Map<String, usize>,
  dir: PathBuf,
  _format: PhantomData<F>,
}

impl<F: InstanceFormat> Catalog<F> {
  /// Data root from `DATA_ROOT`, falling back to the `data` directory of this repository.
  pub fn from_env() -> Result<Self> {
    match std::env::var_os("DATA_ROOT") {
      Some(root) => Self::open(root),
      None => Self::open(concat!(env!("CARGO_MANIFEST_DIR"), "/../../data")),
    }
  }

  pub fn open(root: impl AsRef<Path>) -> Result<Self> {
    let dir = root.as_ref().join(F::DIR);
    let dir = dir.canonicalize().with_context(|| format!("dataset directory {:?} not found", dir))?;
    let contents = std::fs::read_to_string(dir.join("INDEX.txt"))
      .with_context(|| format!("failed to read the index of {:?}", dir))?;

    let names: Vec<String> = contents.lines()
      .map(|l| l.split('#').next().unwrap_or("").trim())
      .filter(|l| !l.is_empty())
      .map(String::from)
      .collect();

    let mut index = Map::default();
    for (i, name) in names.iter().enumerate() {
      if index.insert(name.clone(), i).is_some() {
        return Err(DatasetError::DuplicateName(name.clone()).into());
      }
    }
    Ok(Catalog { names, index, dir, _format: PhantomData })
  }

  pub fn len(&self) -> usize { self.names.len() }

  pub fn is_empty(&self) -> bool { self.names.is_empty() }

  pub fn names(&self) -> impl Iterator<Item=&str> + '_ {
    self.names.iter().map(String::as_str)
  }

  pub fn name(&self, idx: usize) -> Result<&str> {
    self.names.get(idx)
      .map(String::as_str)
      .ok_or_else(|| DatasetError::IndexOutOfRange { index: idx, len: self.len() }.into())
  }

  pub fn index_of(&self, name: &str) -> Result<usize> {
    self.index.get(name).copied().ok_or_else(|| DatasetError::UnknownInstance(name.to_string()).into())
  }

  pub fn path(&self, name: &str) -> PathBuf {
    self.dir.join(format!("{}.{}", name, F::EXTENSION))
  }

  pub fn load(&self, idx: usize) -> Result<F::Instance> {
    let name = self.name(idx)?;
    F::load(&self.path(name), Cow::Borrowed(name))
  }

  pub fn load_by_name(&self, name: &str) -> Result<F::Instance> {
    self.load(self.index_of(name)?)
  }
}
