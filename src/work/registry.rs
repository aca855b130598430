//! Provider registry, work categories, and content loading
//!
//! Providers are grouped into work categories. Each category keeps its
//! providers in precedence order (tier ascending, then registration order),
//! and agents' work lists are assembled from those per-category lists.

use crate::core::error::{DispatchError, Result};
use crate::core::types::ProviderId;
use crate::entity::WorkSettings;
use crate::work::provider::{ProviderDef, TaskProvider};
use ahash::AHashMap;
use serde::Deserialize;
use std::path::Path;

/// A group of related providers an agent enables as a unit
#[derive(Debug, Clone)]
pub struct WorkCategory {
    pub name: String,
    /// Orders categories an agent rates equally; higher goes first
    pub natural_priority: i32,
    providers: Vec<ProviderId>,
}

impl WorkCategory {
    pub fn providers(&self) -> &[ProviderId] {
        &self.providers
    }
}

#[derive(Debug, Deserialize)]
struct CategoryDef {
    name: String,
    #[serde(default)]
    natural_priority: i32,
}

/// Shape of a content file
#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(default)]
    category: Vec<CategoryDef>,
    #[serde(default)]
    provider: Vec<ProviderDef>,
}

type Constructor = Box<dyn Fn(ProviderDef) -> Box<dyn TaskProvider>>;

/// Maps a def's `kind` to the implementation that serves it
#[derive(Default)]
pub struct ProviderFactory {
    constructors: AHashMap<String, Constructor>,
}

impl ProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F)
    where
        F: Fn(ProviderDef) -> Box<dyn TaskProvider> + 'static,
    {
        self.constructors.insert(kind.into(), Box::new(constructor));
    }

    pub fn build(&self, def: ProviderDef) -> Result<Box<dyn TaskProvider>> {
        let constructor = self
            .constructors
            .get(&def.kind)
            .ok_or_else(|| DispatchError::UnknownKind(def.kind.clone()))?;
        Ok(constructor(def))
    }
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Box<dyn TaskProvider>>,
    by_name: AHashMap<String, ProviderId>,
    categories: Vec<WorkCategory>,
    category_index: AHashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a category; redeclaring updates its natural priority
    pub fn add_category(&mut self, name: impl Into<String>, natural_priority: i32) {
        let name = name.into();
        if let Some(&idx) = self.category_index.get(&name) {
            self.categories[idx].natural_priority = natural_priority;
            return;
        }
        self.category_index.insert(name.clone(), self.categories.len());
        self.categories.push(WorkCategory {
            name,
            natural_priority,
            providers: Vec::new(),
        });
    }

    /// Register a provider under its def's category
    ///
    /// Provider names are unique; a second provider with a taken name is rejected.
    pub fn register(&mut self, provider: Box<dyn TaskProvider>) -> Result<ProviderId> {
        let def = provider.def();
        if self.by_name.contains_key(&def.name) {
            return Err(DispatchError::DuplicateProvider(def.name.clone()));
        }
        let &cat_idx = self
            .category_index
            .get(&def.category)
            .ok_or_else(|| DispatchError::UnknownCategory(def.category.clone()))?;

        let id = ProviderId(self.providers.len() as u32);
        let tier = def.tier;
        self.by_name.insert(def.name.clone(), id);

        // Insert after every provider with tier <= ours
        let pos = self.categories[cat_idx]
            .providers
            .iter()
            .position(|&other| self.providers[other.0 as usize].def().tier > tier)
            .unwrap_or(self.categories[cat_idx].providers.len());
        self.categories[cat_idx].providers.insert(pos, id);

        self.providers.push(provider);
        Ok(id)
    }

    pub fn get(&self, id: ProviderId) -> Option<&dyn TaskProvider> {
        self.providers.get(id.0 as usize).map(|p| p.as_ref())
    }

    pub fn id_by_name(&self, name: &str) -> Option<ProviderId> {
        self.by_name.get(name).copied()
    }

    pub fn category(&self, name: &str) -> Option<&WorkCategory> {
        self.category_index.get(name).map(|&idx| &self.categories[idx])
    }

    /// Providers of a category in precedence order
    pub fn category_providers(&self, name: &str) -> Result<&[ProviderId]> {
        self.category(name)
            .map(|c| c.providers())
            .ok_or_else(|| DispatchError::UnknownCategory(name.to_string()))
    }

    pub fn categories(&self) -> impl Iterator<Item = &WorkCategory> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Recompute an agent's normal and emergency work lists
    ///
    /// Enabled categories are ordered by the agent's priority (1 first), then
    /// by natural priority, highest first. Providers keep their per-category
    /// order. The emergency list is the subsequence of emergency providers.
    pub fn rebuild_work_settings(&self, settings: &mut WorkSettings) {
        let mut enabled: Vec<&WorkCategory> = self
            .categories
            .iter()
            .filter(|c| settings.priority_of(&c.name) > 0)
            .collect();
        enabled.sort_by(|a, b| {
            settings
                .priority_of(&a.name)
                .cmp(&settings.priority_of(&b.name))
                .then(b.natural_priority.cmp(&a.natural_priority))
        });

        let normal: Vec<ProviderId> = enabled
            .iter()
            .flat_map(|c| c.providers.iter().copied())
            .collect();
        let emergency: Vec<ProviderId> = normal
            .iter()
            .copied()
            .filter(|&id| self.get(id).is_some_and(|p| p.def().emergency))
            .collect();

        settings.normal = normal;
        settings.emergency = emergency;
    }

    /// Load categories and providers from TOML content
    ///
    /// Categories are declared before any provider in the same file is
    /// registered, so file order does not matter.
    pub fn load_toml(&mut self, content: &str, factory: &ProviderFactory) -> Result<Vec<ProviderId>> {
        let file: ContentFile = toml::from_str(content)?;

        for category in file.category {
            self.add_category(category.name, category.natural_priority);
        }

        let mut ids = Vec::with_capacity(file.provider.len());
        for def in file.provider {
            let provider = factory.build(def)?;
            ids.push(self.register(provider)?);
        }

        tracing::debug!(
            providers = ids.len(),
            categories = self.categories.len(),
            "Loaded work content"
        );
        Ok(ids)
    }

    pub fn load_file(&mut self, path: &Path, factory: &ProviderFactory) -> Result<Vec<ProviderId>> {
        let content = std::fs::read_to_string(path)?;
        self.load_toml(&content, factory)
    }
}
