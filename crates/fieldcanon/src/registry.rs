//! Lookup of plugin-registered timetable and partition-mapper classes.

use crate::identifiers::ImportPath;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Namespace of built-in timetable classes.
pub const CORE_TIMETABLE_PREFIX: &str = "airflow.timetables.";

/// Namespace of built-in partition-mapper classes.
pub const CORE_PARTITION_MAPPER_PREFIX: &str = "airflow.partition_mapper.";

/// Kind of class a registry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    /// Timetable classes.
    Timetable,
    /// Partition-mapper classes.
    PartitionMapper,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Timetable => f.write_str("timetable"),
            PluginKind::PartitionMapper => f.write_str("partition mapper"),
        }
    }
}

/// Errors raised by registry lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No timetable is registered under the key.
    #[error(
        "Timetable class {0:?} is not registered. \
         Make sure the plugin providing it is installed and registers the class."
    )]
    TimetableNotRegistered(String),
    /// No partition mapper is registered under the key.
    #[error(
        "PartitionMapper class {0:?} could not be found. \
         Make sure the plugin providing it is installed and registers the class."
    )]
    PartitionMapperNotFound(String),
    /// The registry was queried before its plugins were loaded.
    #[error(
        "{kind} plugins have not been loaded; \
         check for code that interrupted plugin initialization"
    )]
    PluginsNotLoaded {
        /// Registry that was queried.
        kind: PluginKind,
    },
}

/// Classes registered by plugins, keyed by import path.
#[derive(Debug, Clone)]
pub struct PluginRegistry<T> {
    kind: PluginKind,
    entries: Option<BTreeMap<String, T>>,
}

impl<T> PluginRegistry<T> {
    /// Creates a registry whose plugins have not been loaded yet.
    pub fn new(kind: PluginKind) -> Self {
        Self {
            kind,
            entries: None,
        }
    }

    /// Replaces the registry contents and marks it loaded.
    pub fn load<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (ImportPath, T)>,
    {
        let entries: BTreeMap<String, T> = entries
            .into_iter()
            .map(|(path, entry)| (path.as_ref().to_string(), entry))
            .collect();
        debug!(kind = %self.kind, count = entries.len(), "loaded plugin registry");
        self.entries = Some(entries);
    }

    /// Registers one class, loading the registry if needed.
    pub fn register(&mut self, path: ImportPath, entry: T) {
        debug!(kind = %self.kind, path = %path, "registered plugin class");
        self.entries
            .get_or_insert_with(BTreeMap::new)
            .insert(path.as_ref().to_string(), entry);
    }

    /// Kind of class this registry holds.
    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Whether plugins have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.entries.is_some()
    }

    /// Registered import paths in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|entries| entries.keys().map(String::as_str))
    }

    /// Looks up the class registered under `importable_string`.
    pub fn get(&self, importable_string: &str) -> Result<&T, RegistryError> {
        let entries = self
            .entries
            .as_ref()
            .ok_or(RegistryError::PluginsNotLoaded { kind: self.kind })?;
        entries.get(importable_string).ok_or_else(|| {
            warn!(kind = %self.kind, key = importable_string, "plugin class not registered");
            match self.kind {
                PluginKind::Timetable => {
                    RegistryError::TimetableNotRegistered(importable_string.to_string())
                }
                PluginKind::PartitionMapper => {
                    RegistryError::PartitionMapperNotFound(importable_string.to_string())
                }
            }
        })
    }
}

/// Timetable and partition-mapper registries.
#[derive(Debug, Clone)]
pub struct PluginRegistries<Tt, Pm> {
    /// Plugin timetables.
    pub timetables: PluginRegistry<Tt>,
    /// Plugin partition mappers.
    pub partition_mappers: PluginRegistry<Pm>,
}

impl<Tt, Pm> Default for PluginRegistries<Tt, Pm> {
    fn default() -> Self {
        Self {
            timetables: PluginRegistry::new(PluginKind::Timetable),
            partition_mappers: PluginRegistry::new(PluginKind::PartitionMapper),
        }
    }
}

impl<Tt, Pm> PluginRegistries<Tt, Pm> {
    /// Creates empty, unloaded registries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a user-defined timetable class registered via a plugin.
    pub fn lookup_timetable(&self, importable_string: &str) -> Result<&Tt, RegistryError> {
        self.timetables.get(importable_string)
    }

    /// Finds a user-defined partition-mapper class registered via a plugin.
    pub fn lookup_partition_mapper(&self, importable_string: &str) -> Result<&Pm, RegistryError> {
        self.partition_mappers.get(importable_string)
    }
}

/// Whether an import path points to a built-in timetable class.
pub fn is_core_timetable_import_path(importable_string: &str) -> bool {
    importable_string.starts_with(CORE_TIMETABLE_PREFIX)
}

/// Whether an import path points to a built-in partition-mapper class.
pub fn is_core_partition_mapper_import_path(importable_string: &str) -> bool {
    importable_string.starts_with(CORE_PARTITION_MAPPER_PREFIX)
}
