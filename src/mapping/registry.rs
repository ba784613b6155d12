use super::property::{Mappable, Property};
use crate::core::{Result, SeedError, Value};
use log::debug;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type CachedMapper = Arc<dyn Any + Send + Sync>;

/// Same-type copy function for `T`, produced by the derive.
pub struct SelfMap<T> {
    copy: fn(&mut T, &T),
}

impl<T: Mappable> SelfMap<T> {
    fn compile() -> Self {
        Self {
            copy: T::copy_non_default,
        }
    }

    pub fn apply(&self, destination: &mut T, source: &T) {
        (self.copy)(destination, source)
    }
}

struct Assignment<D, S> {
    get: fn(&S) -> Result<Value>,
    set: fn(&mut D, Value) -> Result<()>,
}

/// Resolved property assignments from `S` into `D`.
pub struct CrossMap<D, S> {
    steps: Vec<Assignment<D, S>>,
}

impl<D: Mappable, S: Mappable> CrossMap<D, S> {
    fn compile() -> Result<Self> {
        let destination: HashMap<String, Property<D>> = D::properties()
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p))
            .collect();

        let mut steps = Vec::new();
        for source in S::properties() {
            let Some(target) = destination.get(&source.name.to_lowercase()) else {
                continue;
            };

            if !target.data_type.accepts(&source.data_type) {
                return Err(SeedError::TypeMismatch(format!(
                    "cannot map {}.{} ({}) into {}.{} ({})",
                    S::type_name(),
                    source.name,
                    source.data_type,
                    D::type_name(),
                    target.name,
                    target.data_type
                )));
            }

            steps.push(Assignment {
                get: source.get,
                set: target.set,
            });
        }

        Ok(Self { steps })
    }

    pub fn apply(&self, destination: &mut D, source: &S) -> Result<()> {
        for step in &self.steps {
            (step.set)(destination, (step.get)(source)?)?;
        }
        Ok(())
    }
}

/// Process-scoped cache of compiled mapping functions.
///
/// Create one at startup and share it (usually behind an `Arc`). Entries are
/// built on first use and kept for the lifetime of the registry; nothing is
/// ever evicted. Same-type mappers are keyed by `T`, cross-type mappers by the
/// `(destination, source)` pair.
#[derive(Default)]
pub struct MapperRegistry {
    self_mappers: RwLock<HashMap<TypeId, CachedMapper>>,
    cross_mappers: RwLock<HashMap<(TypeId, TypeId), CachedMapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies non-default copyable properties of `source` onto `destination`.
    pub fn map<T: Mappable>(&self, destination: &mut T, source: &T) -> Result<()> {
        self.self_mapper::<T>()?.apply(destination, source);
        Ok(())
    }

    /// Copies every property of `source` into the case-insensitively matching
    /// property of `destination`, including default values.
    pub fn map_from<D: Mappable, S: Mappable>(&self, destination: &mut D, source: &S) -> Result<()> {
        self.cross_mapper::<D, S>()?.apply(destination, source)
    }

    /// Builds a fresh `D` and maps `source` onto it.
    pub fn map_new<D: Mappable + Default, S: Mappable>(&self, source: &S) -> Result<D> {
        let mut destination = D::default();
        self.map_from(&mut destination, source)?;
        Ok(destination)
    }

    pub fn self_mapper<T: Mappable>(&self) -> Result<Arc<SelfMap<T>>> {
        let key = TypeId::of::<T>();
        if let Some(existing) = self.self_mappers.read()?.get(&key).cloned() {
            return downcast(existing);
        }

        debug!("compiling same-type mapper for {}", T::type_name());
        let compiled: CachedMapper = Arc::new(SelfMap::<T>::compile());
        // Racing builders produce equivalent mappers; the first one stored wins.
        let stored = self
            .self_mappers
            .write()?
            .entry(key)
            .or_insert(compiled)
            .clone();
        downcast(stored)
    }

    pub fn cross_mapper<D: Mappable, S: Mappable>(&self) -> Result<Arc<CrossMap<D, S>>> {
        let key = (TypeId::of::<D>(), TypeId::of::<S>());
        if let Some(existing) = self.cross_mappers.read()?.get(&key).cloned() {
            return downcast(existing);
        }

        debug!(
            "compiling mapper {} -> {}",
            S::type_name(),
            D::type_name()
        );
        let compiled: CachedMapper = Arc::new(CrossMap::<D, S>::compile()?);
        let stored = self
            .cross_mappers
            .write()?
            .entry(key)
            .or_insert(compiled)
            .clone();
        downcast(stored)
    }

    /// Number of compiled mappers currently cached.
    pub fn cached_count(&self) -> Result<usize> {
        Ok(self.self_mappers.read()?.len() + self.cross_mappers.read()?.len())
    }
}

fn downcast<M: Any + Send + Sync>(cached: CachedMapper) -> Result<Arc<M>> {
    cached
        .downcast::<M>()
        .map_err(|_| SeedError::Execution("cached mapper has an unexpected type".to_string()))
}
