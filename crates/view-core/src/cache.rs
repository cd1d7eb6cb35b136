//! Shape cache: memoized filtered shapes per (type, group set).
//!
//! Building a [`FilteredShape`] walks a type's descriptors and applies the
//! group predicate; the result depends only on the type and the normalized
//! group set, so it is computed once and shared for the process lifetime.
//!
//! Lookups take a read lock. On a miss the shape is built outside any lock
//! and inserted whole under a short write lock, so readers never observe a
//! partial entry. Two concurrent misses for the same key both build; the
//! last insert wins and both results are equally valid.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::groups::{included_by_group, GroupSet};
use crate::metadata::{field_descriptors, short_type_name, FieldDescriptor, SchemaRef, TypeSchema};

/// Cache key: type identity plus the normalized group set.
///
/// The set itself is the key, not its canonical string: a group name may
/// contain [`GROUP_SEPARATOR`](crate::groups::GROUP_SEPARATOR), so `{"a,b"}`
/// and `{"a","b"}` share a canonical form but must never share a shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub type_name: String,
    pub groups: GroupSet,
}

impl CacheKey {
    pub fn new(type_name: &str, groups: &GroupSet) -> Self {
        Self {
            type_name: type_name.to_string(),
            groups: groups.clone(),
        }
    }
}

/// The subset of a type's fields visible to one group set.
///
/// Field order is the descriptor order: own fields first, then promoted
/// members of anonymous fields.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredShape {
    type_name: String,
    groups: GroupSet,
    fields: Vec<FieldDescriptor>,
}

impl FilteredShape {
    pub fn build(schema: &TypeSchema, groups: &GroupSet) -> Self {
        let fields = field_descriptors(schema)
            .into_iter()
            .filter(|field| included_by_group(field, groups))
            .collect();
        Self {
            type_name: schema.name().to_string(),
            groups: groups.clone(),
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn short_name(&self) -> &str {
        short_type_name(&self.type_name)
    }

    pub fn groups(&self) -> &GroupSet {
        &self.groups
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Hit/miss counters and current size of a [`ShapeCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Process-wide memo of filtered shapes.
#[derive(Debug, Default)]
pub struct ShapeCache {
    shapes: RwLock<HashMap<CacheKey, Arc<FilteredShape>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ShapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shape of `schema` for `groups`, building it on first use.
    pub fn get_or_build(&self, schema: &SchemaRef, groups: &GroupSet) -> Arc<FilteredShape> {
        let key = CacheKey::new(schema.type_name(), groups);

        if let Some(shape) = self.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(shape);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(type_name = %key.type_name, groups = %key.groups, "building filtered shape");
        let shape = Arc::new(FilteredShape::build(&schema.resolve(), groups));
        self.write().insert(key, Arc::clone(&shape));
        shape
    }

    /// Look up a shape without building it.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<FilteredShape>> {
        self.read().get(key).cloned()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    // Entries are inserted whole, so a panic while the lock was held cannot
    // leave a half-written shape behind; recovering keeps other requests going.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Arc<FilteredShape>>> {
        self.shapes.read().unwrap_or_else(|poisoned| {
            warn!("shape cache lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CacheKey, Arc<FilteredShape>>> {
        self.shapes.write().unwrap_or_else(|poisoned| {
            warn!("shape cache lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }
}
