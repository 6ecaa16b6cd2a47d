use crate::modules::protocol::Package;
use std::sync::{Mutex, PoisonError};

/// The package the UI currently has open.
#[derive(Default)]
pub struct SelectedPackage {
    package: Mutex<Option<Package>>,
}

impl SelectedPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Package> {
        self.package
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, package: Option<Package>) {
        *self.package.lock().unwrap_or_else(PoisonError::into_inner) = package;
    }

    pub fn clear(&self) {
        self.set(None);
    }
}
