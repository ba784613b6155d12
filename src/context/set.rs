use crate::core::{Result, SeedError, Value};
use crate::mapping::{Mappable, Property};
use std::collections::BTreeMap;

pub type RowId = usize;

/// Rows of one entity type, addressable by key.
pub trait EntitySet<T> {
    /// Finds the row whose key members equal `keys`, positionally.
    ///
    /// `keys` must supply one value per key member.
    fn find(&self, key_members: &[String], keys: &[Value]) -> Result<Option<RowId>>;

    fn add(&mut self, value: T) -> RowId;

    fn get(&self, id: RowId) -> Option<&T>;

    fn get_mut(&mut self, id: RowId) -> Option<&mut T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory entity set keyed by insertion-assigned row ids.
#[derive(Debug, Clone)]
pub struct MemorySet<T> {
    rows: BTreeMap<RowId, T>,
    next_row_id: RowId,
}

impl<T> MemorySet<T> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_row_id: 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

impl<T> Default for MemorySet<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn key_accessors<T: Mappable>(key_members: &[String]) -> Result<Vec<Property<T>>> {
    let properties = T::properties();
    key_members
        .iter()
        .map(|member| {
            properties
                .iter()
                .find(|p| p.name == member.as_str())
                .cloned()
                .ok_or_else(|| {
                    SeedError::PropertyNotFound(member.clone(), T::type_name().to_string())
                })
        })
        .collect()
}

impl<T: Mappable> EntitySet<T> for MemorySet<T> {
    fn find(&self, key_members: &[String], keys: &[Value]) -> Result<Option<RowId>> {
        if key_members.is_empty() || keys.len() != key_members.len() {
            return Err(SeedError::KeyMismatch(format!(
                "{} has {} key member(s), {} key value(s) supplied",
                T::type_name(),
                key_members.len(),
                keys.len()
            )));
        }

        let accessors = key_accessors::<T>(key_members)?;
        for (id, row) in &self.rows {
            let mut matches = true;
            for (property, key) in accessors.iter().zip(keys) {
                if (property.get)(row)? != *key {
                    matches = false;
                    break;
                }
            }
            if matches {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }

    fn add(&mut self, value: T) -> RowId {
        let id = self.next_row_id;
        self.next_row_id += 1;
        self.rows.insert(id, value);
        id
    }

    fn get(&self, id: RowId) -> Option<&T> {
        self.rows.get(&id)
    }

    fn get_mut(&mut self, id: RowId) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mappable;

    #[derive(Mappable, Debug, Clone, Default, PartialEq)]
    struct Line {
        order_id: i64,
        line_no: i32,
        sku: String,
    }

    #[derive(Mappable, Debug, Clone, Default, PartialEq)]
    struct Reading {
        level: f64,
    }

    fn members() -> Vec<String> {
        vec!["order_id".to_string(), "line_no".to_string()]
    }

    #[test]
    fn test_find_by_composite_key() {
        let mut set = MemorySet::new();
        set.add(Line { order_id: 1, line_no: 1, sku: "a".into() });
        let second = set.add(Line { order_id: 1, line_no: 2, sku: "b".into() });

        let found = set
            .find(&members(), &[Value::Integer(1), Value::Integer(2)])
            .unwrap();
        assert_eq!(found, Some(second));
        assert_eq!(set.get(second).unwrap().sku, "b");

        let missing = set
            .find(&members(), &[Value::Integer(2), Value::Integer(1)])
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_find_requires_one_value_per_member() {
        let set = MemorySet::<Line>::new();
        assert!(matches!(
            set.find(&members(), &[Value::Integer(1)]),
            Err(SeedError::KeyMismatch(_))
        ));
        assert!(matches!(
            set.find(&["nope".to_string()], &[Value::Integer(1)]),
            Err(SeedError::PropertyNotFound(_, _))
        ));
    }

    #[test]
    fn test_row_ids_are_not_reused() {
        let mut set = MemorySet::new();
        let a = set.add(Line::default());
        let b = set.add(Line::default());
        assert_ne!(a, b);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_float_keys_match_exactly() {
        let mut set = MemorySet::new();
        let small = set.add(Reading { level: 1e-20 });
        let big = set.add(Reading {
            level: (1_i64 << 53) as f64,
        });
        let members = vec!["level".to_string()];

        assert_eq!(set.find(&members, &[Value::Float(1e-20)]).unwrap(), Some(small));
        assert_eq!(set.find(&members, &[Value::Float(2e-20)]).unwrap(), None);
        assert_eq!(
            set.find(&members, &[Value::Integer(1 << 53)]).unwrap(),
            Some(big)
        );
        assert_eq!(
            set.find(&members, &[Value::Integer((1 << 53) + 1)]).unwrap(),
            None
        );
    }
}
