use crate::modules::endpoint::EndpointSelector;
use crate::modules::keyed_lock::KeyedLock;
use crate::modules::protocol::{
    Command, DeletePackageParams, EndpointParams, Package, PackageConfig, PackageParams,
    UpdatePackageConfigParams,
};
use crate::modules::rpc::{invoke_unit, invoke_validated, Backend, RpcError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

/// Orders overlapping loads: a result is applied only if no newer load has
/// already landed and no `clear()` happened since it was issued.
#[derive(Default)]
struct Freshness {
    issued: u64,
    applied: u64,
}

impl Freshness {
    fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, ticket: u64) -> bool {
        if ticket > self.applied {
            self.applied = ticket;
            true
        } else {
            false
        }
    }

    fn invalidate(&mut self) {
        self.applied = self.issued;
    }
}

#[derive(Default)]
struct PackageState {
    catalog: HashMap<String, Package>,
    catalog_fresh: Freshness,
    installed: Vec<Package>,
    installed_fresh: Freshness,
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Catalog, installed set and per-package configuration, resynced from the backend
/// after every mutation.
pub struct PackageManager {
    backend: Arc<dyn Backend>,
    endpoint: Arc<EndpointSelector>,
    state: Mutex<PackageState>,
    loading: AtomicUsize,
    mutations: KeyedLock,
}

impl PackageManager {
    pub fn new(backend: Arc<dyn Backend>, endpoint: Arc<EndpointSelector>) -> Self {
        Self {
            backend,
            endpoint,
            state: Mutex::new(PackageState::default()),
            loading: AtomicUsize::new(0),
            mutations: KeyedLock::new(),
        }
    }

    pub fn catalog(&self) -> HashMap<String, Package> {
        self.state().catalog.clone()
    }

    pub fn catalog_entry(&self, name: &str) -> Option<Package> {
        self.state().catalog.get(name).cloned()
    }

    pub fn installed(&self) -> Vec<Package> {
        self.state().installed.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub fn is_installed(&self, name: Option<&str>) -> bool {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return false;
        };
        self.state().installed.iter().any(|p| p.name == name)
    }

    /// Replaces the catalog. Transient failures keep the previous catalog and are
    /// only logged; a malformed result is returned as an error.
    pub async fn load_catalog(&self) -> Result<(), RpcError> {
        let ticket = self.state().catalog_fresh.begin();
        let result = invoke_validated::<HashMap<String, Package>, _>(
            self.backend.as_ref(),
            Command::GetPackages,
            &(),
        )
        .await;
        match result {
            Ok(catalog) => {
                let mut state = self.state();
                if state.catalog_fresh.accept(ticket) {
                    info!(count = catalog.len(), "loaded package catalog");
                    state.catalog = catalog;
                }
                Ok(())
            }
            Err(e) => stale_or_fail("Failed to load packages", e),
        }
    }

    /// Replaces the installed list. The loading flag is held for the duration of
    /// the call on every exit path. Failures are handled as in [`Self::load_catalog`].
    pub async fn load_installed(&self) -> Result<(), RpcError> {
        let _loading = LoadingGuard::enter(&self.loading);
        let ticket = self.state().installed_fresh.begin();
        let params = EndpointParams {
            endpoint: self.endpoint.current(),
        };
        let result = invoke_validated::<Vec<Package>, _>(
            self.backend.as_ref(),
            Command::GetInstalledPackages,
            &params,
        )
        .await;
        match result {
            Ok(installed) => {
                let mut state = self.state();
                if state.installed_fresh.accept(ticket) {
                    info!(count = installed.len(), "loaded installed packages");
                    state.installed = installed;
                } else {
                    warn!("discarding stale installed packages result");
                }
                Ok(())
            }
            Err(e) => stale_or_fail("Failed to load installed packages", e),
        }
    }

    pub async fn install(&self, name: &str) -> Result<(), RpcError> {
        let _serial = self.mutations.lock(name).await;
        let params = PackageParams {
            name: name.to_string(),
            endpoint: self.endpoint.current(),
        };
        if let Err(e) = invoke_unit(self.backend.as_ref(), Command::InstallPackage, &params).await
        {
            error!(package = %name, "Failed to install {name}: {e}");
            return Err(e);
        }
        info!(package = %name, "installed package");
        self.load_installed().await
    }

    pub async fn delete(&self, name: &str, include_images: bool) -> Result<(), RpcError> {
        let _serial = self.mutations.lock(name).await;
        let params = DeletePackageParams {
            name: name.to_string(),
            include_images,
            endpoint: self.endpoint.current(),
        };
        if let Err(e) = invoke_unit(self.backend.as_ref(), Command::DeletePackage, &params).await {
            error!(package = %name, "Failed to delete {name}: {e}");
            return Err(e);
        }
        info!(package = %name, include_images, "deleted package");
        self.load_installed().await
    }

    pub async fn get_config(&self, name: &str) -> Result<PackageConfig, RpcError> {
        let params = PackageParams {
            name: name.to_string(),
            endpoint: self.endpoint.current(),
        };
        invoke_validated(self.backend.as_ref(), Command::GetPackageConfig, &params)
            .await
            .inspect_err(|e| error!(package = %name, "Failed to get config for {name}: {e}"))
    }

    /// Sends `config` as a full replacement of the package's configuration.
    pub async fn update_config(&self, name: &str, config: PackageConfig) -> Result<(), RpcError> {
        let _serial = self.mutations.lock(name).await;
        let params = UpdatePackageConfigParams {
            name: name.to_string(),
            config,
            endpoint: self.endpoint.current(),
        };
        invoke_unit(self.backend.as_ref(), Command::UpdatePackageConfig, &params)
            .await
            .inspect(|_| info!(package = %name, "updated package config"))
            .inspect_err(|e| error!(package = %name, "Failed to update config for {name}: {e}"))
    }

    /// Drops all cached state; results of loads already in flight are discarded.
    pub fn clear(&self) {
        let mut state = self.state();
        state.catalog.clear();
        state.catalog_fresh.invalidate();
        state.installed.clear();
        state.installed_fresh.invalidate();
    }

    fn state(&self) -> MutexGuard<'_, PackageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Transport and backend failures degrade to stale data; shape mismatches do not.
fn stale_or_fail(context: &str, e: RpcError) -> Result<(), RpcError> {
    error!("{context}: {e}");
    match e {
        RpcError::Shape { .. } | RpcError::Encode { .. } => Err(e),
        RpcError::Transport { .. } | RpcError::Backend { .. } => Ok(()),
    }
}
