//! Data context seams and the add-or-update helpers built on them.

pub mod memory;
pub mod metadata;
pub mod set;

pub use memory::MemoryContext;
pub use metadata::{EntityMetadata, ModelMetadata};
pub use set::{EntitySet, MemorySet, RowId};

use crate::core::{Result, SeedError, Value};
use crate::history::HistoryStore;
use crate::mapping::{Mappable, MapperRegistry, map_dictionary, map_keys};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// A context data migrations can run against.
pub trait MigrationContext {
    fn history_store(&mut self) -> &mut dyn HistoryStore;
}

/// A mapped data session: entity sets, key metadata and the mapper cache.
pub trait DataContext: MigrationContext {
    fn mappers(&self) -> Arc<MapperRegistry>;

    fn entity_set<T: Mappable>(&mut self) -> Result<&mut dyn EntitySet<T>>;

    /// Ordered key member names of `T`, read from the model on every call.
    fn key_members<T: Mappable>(&self) -> Result<Vec<String>>;
}

fn row_mut<T, S>(set: &mut S, id: RowId) -> Result<&mut T>
where
    S: EntitySet<T> + ?Sized,
{
    set.get_mut(id)
        .ok_or_else(|| SeedError::Execution(format!("row {} vanished from entity set", id)))
}

/// Add-or-update operations for every [`DataContext`].
pub trait SeedExt: DataContext {
    /// Updates the row matching `keys` from `value`, or inserts `value`.
    ///
    /// An existing row receives only the non-default copyable properties of
    /// `value`. A new row has its key members stamped from `keys` and is only
    /// added once every mapping step succeeded.
    fn add_or_update<T: Mappable>(&mut self, value: T, keys: &[Value]) -> Result<&mut T> {
        let key_members = self.key_members::<T>()?;
        let mappers = self.mappers();
        let set = self.entity_set::<T>()?;

        let id = match set.find(&key_members, keys)? {
            Some(id) => {
                mappers.map(row_mut(set, id)?, &value)?;
                id
            }
            None => {
                let mut row = value;
                map_keys(&mut row, &key_members, keys)?;
                set.add(row)
            }
        };
        row_mut(set, id)
    }

    /// Like [`add_or_update`](Self::add_or_update) with a source of another type.
    ///
    /// Properties are copied by case-insensitive name without default skip.
    ///
    /// # Panics
    ///
    /// Panics when `T` and `K` are the same type; use `add_or_update` instead.
    fn add_or_update_from<T, K>(&mut self, value: &K, keys: &[Value]) -> Result<&mut T>
    where
        T: Mappable + Default,
        K: Mappable,
    {
        assert!(
            TypeId::of::<T>() != TypeId::of::<K>(),
            "The type of the source passed should not match the destination"
        );

        let key_members = self.key_members::<T>()?;
        let mappers = self.mappers();
        let set = self.entity_set::<T>()?;

        let id = match set.find(&key_members, keys)? {
            Some(id) => {
                mappers.map_from(row_mut(set, id)?, value)?;
                id
            }
            None => {
                let mut row = T::default();
                mappers.map_from(&mut row, value)?;
                map_keys(&mut row, &key_members, keys)?;
                set.add(row)
            }
        };
        row_mut(set, id)
    }

    /// Like [`add_or_update`](Self::add_or_update) with named values.
    fn add_or_update_values<T>(
        &mut self,
        values: &HashMap<String, Value>,
        keys: &[Value],
    ) -> Result<&mut T>
    where
        T: Mappable + Default,
    {
        let key_members = self.key_members::<T>()?;
        let set = self.entity_set::<T>()?;

        let id = match set.find(&key_members, keys)? {
            Some(id) => {
                map_dictionary(row_mut(set, id)?, values)?;
                id
            }
            None => {
                let mut row = T::default();
                map_dictionary(&mut row, values)?;
                map_keys(&mut row, &key_members, keys)?;
                set.add(row)
            }
        };
        row_mut(set, id)
    }
}

impl<C: DataContext> SeedExt for C {}
