use std::collections::HashMap;
use std::sync::Arc;

use fulfil_delivery::PlatformKind;

use crate::adapter::PlatformAdapter;
use crate::error::{IntegrationError, IntegrationResult};

/// Registry of platform adapters, keyed by the platform each one serves.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<PlatformKind, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the platform it reports. A later
    /// registration for the same platform replaces the earlier one.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        self.adapters.insert(adapter.platform(), adapter);
    }

    pub fn resolve(&self, platform: PlatformKind) -> IntegrationResult<Arc<dyn PlatformAdapter>> {
        self.adapters
            .get(&platform)
            .cloned()
            .ok_or_else(|| IntegrationError::UnsupportedPlatform(platform.to_string()))
    }

    /// Resolve from a platform name as it appears in external input. Unknown
    /// names resolve to the same error as unregistered platforms.
    pub fn resolve_named(&self, name: &str) -> IntegrationResult<Arc<dyn PlatformAdapter>> {
        let platform = name
            .parse::<PlatformKind>()
            .map_err(|_| IntegrationError::UnsupportedPlatform(name.to_string()))?;
        self.resolve(platform)
    }
}
