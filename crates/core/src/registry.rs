//! Cache of loaded compiler handles keyed by version string

use crate::error::{LabError, LabResult};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// A loaded compiler bound to one version
pub trait CompilerHandle: Send + Sync + fmt::Debug {
    /// Version this handle was loaded for
    fn version(&self) -> &str;

    /// Runs the compiler on a serialized standard JSON input and returns the raw output
    fn compile_standard_json(&self, input: &str) -> LabResult<String>;
}

/// Loads compiler handles; the expensive operation the registry guards
pub trait CompilerLoader: Send + Sync {
    fn load(&self, version: &str) -> LabResult<Arc<dyn CompilerHandle>>;

    /// Cache key for `version`; spellings that load the same compiler must map to one key
    fn canonical_version(&self, version: &str) -> String {
        version.trim().to_string()
    }
}

type LoadHook = Box<dyn Fn(&str) + Send + Sync>;
type HandleSlot = Arc<OnceCell<Arc<dyn CompilerHandle>>>;

/// Owns the version -> handle mapping
///
/// Each version has its own initialization slot, so concurrent first
/// requests for the same version run the loader once while other versions
/// load independently. Loaded handles are never evicted. A failed load leaves
/// the slot empty and the error is returned to the caller as is.
pub struct CompilerRegistry {
    loader: Box<dyn CompilerLoader>,
    handles: DashMap<String, HandleSlot>,
    loads: AtomicUsize,
    on_load: Option<LoadHook>,
}

impl fmt::Debug for CompilerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerRegistry")
            .field("cached_versions", &self.cached_versions())
            .field("loads", &self.load_count())
            .finish()
    }
}

impl CompilerRegistry {
    pub fn new(loader: impl CompilerLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            handles: DashMap::new(),
            loads: AtomicUsize::new(0),
            on_load: None,
        }
    }

    /// Registers a callback invoked with the version each time a load starts
    pub fn with_load_hook(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_load = Some(Box::new(hook));
        self
    }

    /// Returns the handle for `version`, loading it on first use
    pub fn get_handle(&self, version: &str) -> LabResult<Arc<dyn CompilerHandle>> {
        let version = self.loader.canonical_version(version);
        if version.is_empty() {
            return Err(LabError::unavailable(version, "empty version string"));
        }

        // Clone the slot out so the map shard is not locked while loading
        let slot = self.handles.entry(version.clone()).or_default().clone();

        let handle = slot.get_or_try_init(|| {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(hook) = &self.on_load {
                hook(&version);
            }
            tracing::info!("Loading compiler {}", version);
            self.loader.load(&version)
        })?;

        Ok(Arc::clone(handle))
    }

    /// Number of load operations started so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Versions with a loaded handle, sorted
    pub fn cached_versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self
            .handles
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .map(|entry| entry.key().clone())
            .collect();
        versions.sort();
        versions
    }

    pub fn is_loaded(&self, version: &str) -> bool {
        self.handles
            .get(&self.loader.canonical_version(version))
            .map(|slot| slot.get().is_some())
            .unwrap_or(false)
    }
}
