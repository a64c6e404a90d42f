//! Persisted client-side settings.
//!
//! The hosting platform gives each user a small key-value store; this
//! module is its seam. Two records survive between sessions: the last-used
//! display-window options and the committed-override map (work item id →
//! pinned span). Rehydrating the timeline needs nothing else.
//!
//! Both implementations are `Send + Sync` so the fetch task can read them
//! from any runtime thread.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::model::{CommittedOverride, WorkItemId};
use crate::window::IterationWindowOptions;

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Key-value persistence seam for per-user timeline settings.
pub trait SettingsStore: Send + Sync {
    /// Last-used window options, if any were ever saved.
    fn load_display_options(&self) -> Result<Option<IterationWindowOptions>>;

    /// Persist (or clear, with `None`) the window options.
    fn save_display_options(&self, options: Option<&IterationWindowOptions>) -> Result<()>;

    /// The committed-override map. Missing storage reads as empty.
    fn load_overrides(&self) -> Result<HashMap<WorkItemId, CommittedOverride>>;

    /// Persist the whole committed-override map.
    fn save_overrides(&self, overrides: &HashMap<WorkItemId, CommittedOverride>) -> Result<()>;
}

/// On-disk document shape. Field names match the hosting platform's
/// original extension-data keys so an exported blob round-trips.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedSettings {
    iteration_display_options: Option<IterationWindowOptions>,
    overridden_work_item_iterations: HashMap<WorkItemId, CommittedOverride>,
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Settings persisted as a single JSON document on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<PersistedSettings> {
        if !self.path.exists() {
            return Ok(PersistedSettings::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read settings file {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parse settings file {}", self.path.display()))
    }

    fn write(&self, settings: &PersistedSettings) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create settings dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(settings).context("serialize settings")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("write settings file {}", self.path.display()))
    }
}

impl SettingsStore for JsonFileStore {
    fn load_display_options(&self) -> Result<Option<IterationWindowOptions>> {
        Ok(self.read()?.iteration_display_options)
    }

    fn save_display_options(&self, options: Option<&IterationWindowOptions>) -> Result<()> {
        let mut settings = self.read()?;
        settings.iteration_display_options = options.cloned();
        self.write(&settings)
    }

    fn load_overrides(&self) -> Result<HashMap<WorkItemId, CommittedOverride>> {
        Ok(self.read()?.overridden_work_item_iterations)
    }

    fn save_overrides(&self, overrides: &HashMap<WorkItemId, CommittedOverride>) -> Result<()> {
        let mut settings = self.read()?;
        settings.overridden_work_item_iterations = overrides.clone();
        self.write(&settings)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store for tests and the offline CLI.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<PersistedSettings>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store, for rehydration tests.
    #[must_use]
    pub fn with_contents(
        display_options: Option<IterationWindowOptions>,
        overrides: HashMap<WorkItemId, CommittedOverride>,
    ) -> Self {
        Self {
            inner: Mutex::new(PersistedSettings {
                iteration_display_options: display_options,
                overridden_work_item_iterations: overrides,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PersistedSettings> {
        // A poisoned lock only happens if a writer panicked; the data is
        // plain values, safe to keep serving.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SettingsStore for MemoryStore {
    fn load_display_options(&self) -> Result<Option<IterationWindowOptions>> {
        Ok(self.lock().iteration_display_options.clone())
    }

    fn save_display_options(&self, options: Option<&IterationWindowOptions>) -> Result<()> {
        self.lock().iteration_display_options = options.cloned();
        Ok(())
    }

    fn load_overrides(&self) -> Result<HashMap<WorkItemId, CommittedOverride>> {
        Ok(self.lock().overridden_work_item_iterations.clone())
    }

    fn save_overrides(&self, overrides: &HashMap<WorkItemId, CommittedOverride>) -> Result<()> {
        self.lock().overridden_work_item_iterations = overrides.clone();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
