//! Runtime drivers and the process-wide driver registry.
//!
//! A driver turns a [`ResolvedClaw`] into its runtime's native
//! configuration on disk and a compose-service contribution. The core
//! never reads a runtime's config format itself.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::ContainerEngine;
use crate::domain::error::{DriverLookupError, MaterializationError, ValidationError};
use crate::domain::health::Health;
use crate::domain::resolved::{
    ContainerRef, MaterializeOpts, MaterializeResult, PostApplyOpts, ResolvedClaw,
};

pub mod microclaw;
pub mod nanoclaw;
pub mod nullclaw;
pub mod openclaw;
pub mod shared;

/// One agent runtime.
#[async_trait(?Send)]
pub trait Driver: Send + Sync {
    /// The `claw.type` this driver serves.
    fn name(&self) -> &'static str;

    /// Pre-flight checks. Runs before any container starts.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a missing contract, a handle without
    /// its token env var, an unsupported CONFIGURE command, or a missing
    /// driver-specific directive.
    fn validate(&self, rc: &ResolvedClaw) -> Result<(), ValidationError>;

    /// Write runtime artifacts under `opts.runtime_dir` and describe the
    /// service shape. Identical inputs produce identical files.
    ///
    /// # Errors
    ///
    /// Returns `MaterializationError` for write failures and config
    /// conflicts.
    fn materialize(
        &self,
        rc: &ResolvedClaw,
        opts: &MaterializeOpts,
    ) -> Result<MaterializeResult, MaterializationError>;

    /// Reconcile a started container. Must be idempotent.
    async fn post_apply(
        &self,
        rc: &ResolvedClaw,
        opts: &PostApplyOpts,
        engine: &dyn ContainerEngine,
    ) -> Result<()>;

    /// Passive health check of a running container.
    async fn health_probe(&self, target: &ContainerRef, engine: &dyn ContainerEngine)
    -> Result<Health>;
}

/// `claw.type` to driver mapping.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    /// A registry holding the built-in drivers.
    #[must_use]
    pub fn with_builtin() -> Self {
        let registry = Self::default();
        registry.register(Arc::new(openclaw::OpenClawDriver));
        registry.register(Arc::new(nullclaw::NullClawDriver));
        registry.register(Arc::new(nanoclaw::NanoClawDriver));
        registry.register(Arc::new(microclaw::MicroClawDriver));
        registry
    }

    /// Register `driver` under its name, replacing any previous entry.
    pub fn register(&self, driver: Arc<dyn Driver>) {
        let mut drivers = self.drivers.write().unwrap_or_else(PoisonError::into_inner);
        drivers.insert(driver.name().to_string(), driver);
    }

    /// # Errors
    ///
    /// Returns `DriverLookupError` when no driver serves `claw_type`.
    pub fn lookup(&self, claw_type: &str) -> Result<Arc<dyn Driver>, DriverLookupError> {
        let drivers = self.drivers.read().unwrap_or_else(PoisonError::into_inner);
        drivers
            .get(claw_type)
            .cloned()
            .ok_or_else(|| DriverLookupError(claw_type.to_string()))
    }

    /// Registered types, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let drivers = self.drivers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = drivers.keys().cloned().collect();
        names.sort();
        names
    }
}

static REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(DriverRegistry::with_builtin);

/// The process-wide registry.
#[must_use]
pub fn registry() -> &'static DriverRegistry {
    &REGISTRY
}
