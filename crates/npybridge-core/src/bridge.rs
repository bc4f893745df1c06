//! The lazily-initialized table importer.
//!
//! A [`Bridge`] owns a [`Host`] and an [`ImportConfig`] and publishes an
//! [`ApiTables`] at most once. Publication happens only after both tables
//! have been imported and validated, so readers either see both tables or
//! neither. Concurrent first calls are serialized by `init_lock`; the
//! fast path after publication is a single atomic load.
//!
//! Failures are not cached: a later call runs the slow path again and will
//! normally fail the same way. Callers are expected to abort their own
//! setup on the first error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::check::check_compatibility;
use crate::config::{ConfigError, HostLayout, ImportConfig};
use crate::error::{HostError, ImportError, InitError};
use crate::host::Host;
use crate::table::{ApiKind, ApiTables, ArrayApi, TablePtr, UfuncApi};

/// Process-wide importer for the array and ufunc tables.
pub struct Bridge<H: Host> {
    host: H,
    config: ImportConfig,
    tables: OnceLock<ApiTables>,
    init_lock: Mutex<()>,
    attempts: AtomicU64,
}

impl<H: Host> Bridge<H> {
    /// Create a bridge after validating `config`.
    pub fn new(host: H, config: ImportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new_unchecked(host, config))
    }

    /// Create a bridge with [`ImportConfig::default()`].
    pub fn with_default_config(host: H) -> Self {
        Self::new_unchecked(host, ImportConfig::default())
    }

    /// Create a bridge with the default config for a host whose integer
    /// widths are `layout`.
    pub fn with_layout(host: H, layout: HostLayout) -> Self {
        Self::new_unchecked(host, ImportConfig::with_layout(layout))
    }

    fn new_unchecked(host: H, config: ImportConfig) -> Self {
        Self {
            host,
            config,
            tables: OnceLock::new(),
            init_lock: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    /// The host this bridge imports through.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The active configuration.
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// The published tables, if initialization has succeeded.
    pub fn get(&self) -> Option<&ApiTables> {
        self.tables.get()
    }

    /// Whether both tables have been published.
    pub fn is_initialized(&self) -> bool {
        self.tables.get().is_some()
    }

    /// Number of times the slow initialization path has run.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Import the primary module, falling back to the legacy one when the
    /// primary is not found. Any other primary failure is returned as is.
    pub fn resolve_module(&self) -> Result<H::Module, ImportError> {
        self.resolve().map(|(module, _)| module)
    }

    fn resolve(&self) -> Result<(H::Module, &str), ImportError> {
        let primary = &self.config.primary_module;
        tracing::debug!(module = %primary, "importing NumPy core module");
        match self.host.import_module(primary) {
            Ok(module) => return Ok((module, primary.as_str())),
            Err(HostError::ModuleNotFound { .. }) => {}
            Err(e) => return Err(module_error(e)),
        }

        let legacy = &self.config.legacy_module;
        tracing::debug!(module = %legacy, "primary module not found, trying legacy path");
        match self.host.import_module(legacy) {
            Ok(module) => Ok((module, legacy.as_str())),
            Err(HostError::ModuleNotFound { reason, .. }) => Err(ImportError::ModuleUnavailable {
                primary: primary.clone(),
                legacy: legacy.clone(),
                reason,
            }),
            Err(e) => Err(module_error(e)),
        }
    }

    /// Import and validate the array table.
    ///
    /// Returns the published table without touching the host once the
    /// bridge is initialized.
    pub fn import_array_api(&self) -> Result<ArrayApi, ImportError> {
        if let Some(tables) = self.tables.get() {
            return Ok(*tables.array());
        }
        let (module, name) = self.resolve()?;
        let table = self.fetch_table(&module, name, &self.config.array_capsule)?;
        let runtime = self.host.runtime_versions(table);
        tracing::debug!(
            abi = %runtime.abi,
            feature = %runtime.feature,
            endianness = %runtime.endianness,
            "read NumPy runtime versions"
        );
        check_compatibility(&self.config, &runtime)?;
        Ok(ArrayApi::new(table, runtime))
    }

    /// Import the ufunc table. Only the capsule type and payload are checked.
    pub fn import_ufunc_api(&self) -> Result<UfuncApi, ImportError> {
        if let Some(tables) = self.tables.get() {
            return Ok(*tables.ufunc());
        }
        let (module, name) = self.resolve()?;
        let table = self.fetch_table(&module, name, &self.config.ufunc_capsule)?;
        Ok(UfuncApi::new(table))
    }

    /// Import both tables once and publish them.
    ///
    /// On failure the error is logged and returned; nothing is published.
    /// The log record is only written if a `tracing` subscriber is
    /// installed; callers that need the message on stderr regardless must
    /// print the returned error themselves.
    pub fn ensure_initialized(&self) -> Result<&ApiTables, InitError> {
        if let Some(tables) = self.tables.get() {
            return Ok(tables);
        }
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tables) = self.tables.get() {
            return Ok(tables);
        }
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let loaded = self.load().inspect_err(|e| {
            tracing::error!(table = %e.kind, error = %e.source, "{e}");
        })?;
        let tables = self.tables.get_or_init(|| loaded);
        tracing::info!(
            array_api = tables.array().table().addr(),
            ufunc_api = tables.ufunc().table().addr(),
            feature = %tables.runtime_feature_version(),
            "NumPy C-API initialized"
        );
        Ok(tables)
    }

    fn load(&self) -> Result<ApiTables, InitError> {
        let array = self
            .import_array_api()
            .map_err(|e| InitError::new(ApiKind::Array, e))?;
        let ufunc = self
            .import_ufunc_api()
            .map_err(|e| InitError::new(ApiKind::Ufunc, e))?;
        Ok(ApiTables::new(array, ufunc))
    }

    fn fetch_table(
        &self,
        module: &H::Module,
        module_name: &str,
        attr: &str,
    ) -> Result<TablePtr, ImportError> {
        let raw = self
            .host
            .capsule_pointer(module, attr)
            .map_err(|e| match e {
                HostError::AttributeMissing { attr } => ImportError::AttributeMissing {
                    module: module_name.to_owned(),
                    attr,
                },
                HostError::NotACapsule { attr, type_name } => {
                    ImportError::NotACapsule { attr, type_name }
                }
                other => ImportError::Host(other),
            })?;
        TablePtr::new(raw).ok_or_else(|| ImportError::NullPointer {
            attr: attr.to_owned(),
        })
    }
}

fn module_error(e: HostError) -> ImportError {
    match e {
        HostError::ModuleNotFound { module, reason } | HostError::ImportFailed { module, reason } => {
            ImportError::ModuleImport { module, reason }
        }
        other => ImportError::Host(other),
    }
}
