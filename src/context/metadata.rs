use crate::core::{Result, SeedError};
use crate::mapping::Mappable;
use std::any::TypeId;
use std::collections::HashMap;

/// Model information for one mapped entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    pub type_name: String,
    pub key_members: Vec<String>,
}

/// Registry of mapped entity types and their key members.
#[derive(Debug, Clone, Default)]
pub struct ModelMetadata {
    entities: HashMap<TypeId, EntityMetadata>,
}

impl ModelMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `T` with the given key members.
    pub fn register<T: Mappable>(&mut self, key_members: Vec<String>) -> Result<()> {
        let key = TypeId::of::<T>();
        if self.entities.contains_key(&key) {
            return Err(SeedError::EntityExists(T::type_name().to_string()));
        }

        self.entities.insert(
            key,
            EntityMetadata {
                type_name: T::type_name().to_string(),
                key_members,
            },
        );
        Ok(())
    }

    pub fn get<T: Mappable>(&self) -> Result<&EntityMetadata> {
        self.entities
            .get(&TypeId::of::<T>())
            .ok_or_else(|| SeedError::EntityNotMapped(T::type_name().to_string()))
    }
}
