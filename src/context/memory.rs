use super::metadata::ModelMetadata;
use super::set::{EntitySet, MemorySet};
use super::{DataContext, MigrationContext};
use crate::core::{Result, SeedError};
use crate::history::{HistoryStore, MemoryHistoryStore};
use crate::mapping::{Mappable, MapperRegistry};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Data context held entirely in memory.
///
/// Entity types must be registered before use; registration records the key
/// members the add-or-update helpers match on.
pub struct MemoryContext {
    mappers: Arc<MapperRegistry>,
    history: MemoryHistoryStore,
    model: ModelMetadata,
    sets: HashMap<TypeId, Box<dyn Any>>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::with_mappers(Arc::new(MapperRegistry::new()))
    }

    /// Creates a context sharing an existing mapper cache.
    pub fn with_mappers(mappers: Arc<MapperRegistry>) -> Self {
        Self {
            mappers,
            history: MemoryHistoryStore::new(),
            model: ModelMetadata::new(),
            sets: HashMap::new(),
        }
    }

    pub fn with_history(mut self, history: MemoryHistoryStore) -> Self {
        self.history = history;
        self
    }

    /// Maps `T` using the keys declared with `#[mapping(key)]`.
    pub fn register<T: Mappable>(&mut self) -> Result<()> {
        let keys = T::key_members().into_iter().map(str::to_string).collect();
        self.model.register::<T>(keys)
    }

    /// Maps `T` with explicit key members, overriding the declared ones.
    pub fn register_with_keys<T: Mappable>(&mut self, key_members: &[&str]) -> Result<()> {
        let keys = key_members.iter().map(|k| k.to_string()).collect();
        self.model.register::<T>(keys)
    }

    pub fn model(&self) -> &ModelMetadata {
        &self.model
    }

    pub fn history(&self) -> &MemoryHistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut MemoryHistoryStore {
        &mut self.history
    }

    /// Rows of `T`; empty if nothing was added yet.
    pub fn rows<T: Mappable>(&self) -> Result<Vec<&T>> {
        self.model.get::<T>()?;
        let Some(set) = self.sets.get(&TypeId::of::<T>()) else {
            return Ok(Vec::new());
        };
        let set = (**set)
            .downcast_ref::<MemorySet<T>>()
            .ok_or_else(|| set_type_error::<T>())?;
        Ok(set.iter().collect())
    }
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

fn set_type_error<T: Mappable>() -> SeedError {
    SeedError::Execution(format!(
        "entity set for {} has an unexpected type",
        T::type_name()
    ))
}

impl MigrationContext for MemoryContext {
    fn history_store(&mut self) -> &mut dyn HistoryStore {
        &mut self.history
    }
}

impl DataContext for MemoryContext {
    fn mappers(&self) -> Arc<MapperRegistry> {
        Arc::clone(&self.mappers)
    }

    fn entity_set<T: Mappable>(&mut self) -> Result<&mut dyn EntitySet<T>> {
        self.model.get::<T>()?;
        let set = self
            .sets
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(MemorySet::<T>::new()) as Box<dyn Any>);
        let set = (**set)
            .downcast_mut::<MemorySet<T>>()
            .ok_or_else(|| set_type_error::<T>())?;
        Ok(set)
    }

    fn key_members<T: Mappable>(&self) -> Result<Vec<String>> {
        Ok(self.model.get::<T>()?.key_members.clone())
    }
}
