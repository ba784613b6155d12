//! Property mapping between mappable types.
//!
//! Same-type and cross-type copies go through a [`MapperRegistry`], which
//! builds each copy function once and reuses it. Dictionary and key copies
//! resolve properties on every call.

pub mod property;
pub mod registry;

pub use property::{MapValue, Mappable, Property};
pub use registry::{CrossMap, MapperRegistry, SelfMap};

use crate::core::{Result, SeedError, Value};
use log::debug;

/// Assigns each value to the destination property with exactly that name.
///
/// Unknown names are ignored. Values are assigned as given: there is no
/// default-value skip. A value the property's data type does not accept, or a
/// null for a non-nullable property, is a `TypeMismatch` and nothing further
/// is assigned.
pub fn map_dictionary<'a, T, I>(destination: &mut T, values: I) -> Result<()>
where
    T: Mappable,
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    let properties = T::properties();
    for (name, value) in values {
        let Some(property) = properties.iter().find(|p| p.name == name.as_str()) else {
            continue;
        };
        if !property.data_type.is_compatible(value) || (value.is_null() && !property.nullable) {
            return Err(SeedError::TypeMismatch(format!(
                "{}.{}: cannot assign {} to {}",
                T::type_name(),
                property.name,
                value.type_name(),
                property.data_type
            )));
        }
        (property.set)(destination, value.clone()).map_err(|err| match err {
            SeedError::TypeMismatch(detail) => SeedError::TypeMismatch(format!(
                "{}.{}: {}",
                T::type_name(),
                property.name,
                detail
            )),
            other => other,
        })?;
    }
    Ok(())
}

/// Assigns `keys[i]` to the property named by `key_members[i]`.
///
/// Members without a matching property are skipped. Supplying more keys than
/// there are key members is a `KeyMismatch`; supplying fewer leaves the
/// remaining members untouched.
pub fn map_keys<T, K>(destination: &mut T, key_members: &[K], keys: &[Value]) -> Result<()>
where
    T: Mappable,
    K: AsRef<str>,
{
    if keys.len() > key_members.len() {
        return Err(SeedError::KeyMismatch(format!(
            "{} declares {} key member(s), {} key value(s) supplied",
            T::type_name(),
            key_members.len(),
            keys.len()
        )));
    }

    let properties = T::properties();
    for (member, key) in key_members.iter().zip(keys) {
        let member = member.as_ref();
        match properties.iter().find(|p| p.name == member) {
            Some(property) => (property.set)(destination, key.clone())?,
            None => debug!(
                "key member '{}' has no property on {}, skipped",
                member,
                T::type_name()
            ),
        }
    }
    Ok(())
}
