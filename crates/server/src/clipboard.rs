use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use shared_types::{ProviderRef, ValidatedPricing};

/// Last pricing each provider saved, used to pre-fill the next service.
///
/// Process-local and never persisted; a restart empties it.
#[derive(Clone, Default)]
pub struct PricingClipboard {
    inner: Arc<Mutex<HashMap<ProviderRef, ValidatedPricing>>>,
}

impl PricingClipboard {
    pub fn put(&self, provider: ProviderRef, pricing: ValidatedPricing) {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.insert(provider, pricing);
    }

    pub fn get(&self, provider: &ProviderRef) -> Option<ValidatedPricing> {
        let map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.get(provider).cloned()
    }
}
