use crate::descriptor::PluginDescriptor;
use fixkit_common::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Category tabs keep a curated order; anything else sorts after them.
const CATEGORY_ORDER: &[&str] = &["Apps", "Games", "Development Tools", "Tweaks", "Utilities"];

fn category_rank(category: &str) -> usize {
    CATEGORY_ORDER
        .iter()
        .position(|known| *known == category)
        .unwrap_or(CATEGORY_ORDER.len())
}

/// All loaded plugins, ordered by category and by plugin name within a
/// category. Inserting a plugin with an already-registered category/name
/// replaces the earlier one, so user plugin directories can shadow the
/// system ones.
#[derive(Default)]
pub struct PluginRegistry {
    categories: BTreeMap<(usize, String), BTreeMap<String, Arc<PluginDescriptor>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a descriptor. A descriptor without a name
    /// (one built in code rather than loaded from disk) is keyed by its
    /// label.
    pub fn insert(&mut self, mut descriptor: PluginDescriptor) -> Result<Arc<PluginDescriptor>> {
        descriptor.validate()?;
        if descriptor.name.is_empty() {
            descriptor.name = descriptor.label.clone();
        }

        let key = (category_rank(&descriptor.category), descriptor.category.clone());
        let descriptor = Arc::new(descriptor);
        self.categories
            .entry(key)
            .or_default()
            .insert(descriptor.name.clone(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    pub fn get(&self, category: &str, name: &str) -> Option<Arc<PluginDescriptor>> {
        let key = (category_rank(category), category.to_string());
        self.categories
            .get(&key)
            .and_then(|plugins| plugins.get(name))
            .cloned()
    }

    /// Category names in display order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(|(_, name)| name.as_str())
    }

    /// Plugins of one category in name order.
    pub fn plugins_in(&self, category: &str) -> Vec<Arc<PluginDescriptor>> {
        let key = (category_rank(category), category.to_string());
        self.categories
            .get(&key)
            .map(|plugins| plugins.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every plugin in global display order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PluginDescriptor>> {
        self.categories.values().flat_map(|plugins| plugins.values())
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(|plugins| plugins.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
