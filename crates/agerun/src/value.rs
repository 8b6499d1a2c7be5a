//! The tagged runtime value with explicit single-owner discipline (spec §3, §4.1).
//!
//! `Clone` is intentionally not derived: cloning a `Map`/`List` the naive way
//! would duplicate children without going through the ownership checks below.
//! Use [`Value::deep_copy`] when an independent copy is actually wanted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::cell::Cell;

use indexmap::IndexMap;
use strum::Display;

use crate::error::{AgeRunError, AgeRunResult};

static NEXT_OWNER_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of an owner: another value's container, or a caller-minted
/// token. Comparable, `Copy`, carries no further meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    /// Mint a fresh, globally unique owner token (e.g. for a frame or an
    /// evaluator that needs to hold a value transiently).
    pub fn fresh() -> Self {
        Self(NEXT_OWNER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The five runtime tags (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ValueTag {
    Integer,
    Double,
    String,
    List,
    Map,
}

#[derive(Debug)]
struct ListData {
    /// This list's own identity, handed to children it takes ownership of.
    id: OwnerId,
    items: Vec<Value>,
}

#[derive(Debug)]
struct MapData {
    id: OwnerId,
    entries: IndexMap<String, Value>,
}

#[derive(Debug)]
enum ValueKind {
    Integer(i32),
    Double(f64),
    String(String),
    List(ListData),
    Map(MapData),
}

/// A runtime value. See module docs and spec §3/§4.1.
#[derive(Debug)]
pub struct Value {
    owner: Cell<Option<OwnerId>>,
    kind: ValueKind,
}

impl Value {
    pub fn integer(value: i32) -> Self {
        crate::heap::record_alloc(ValueTag::Integer);
        Self {
            owner: Cell::new(None),
            kind: ValueKind::Integer(value),
        }
    }

    pub fn double(value: f64) -> Self {
        crate::heap::record_alloc(ValueTag::Double);
        Self {
            owner: Cell::new(None),
            kind: ValueKind::Double(value),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        crate::heap::record_alloc(ValueTag::String);
        Self {
            owner: Cell::new(None),
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn list() -> Self {
        crate::heap::record_alloc(ValueTag::List);
        Self {
            owner: Cell::new(None),
            kind: ValueKind::List(ListData {
                id: OwnerId::fresh(),
                items: Vec::new(),
            }),
        }
    }

    pub fn map() -> Self {
        crate::heap::record_alloc(ValueTag::Map);
        Self {
            owner: Cell::new(None),
            kind: ValueKind::Map(MapData {
                id: OwnerId::fresh(),
                entries: IndexMap::new(),
            }),
        }
    }

    pub fn tag(&self) -> ValueTag {
        match &self.kind {
            ValueKind::Integer(_) => ValueTag::Integer,
            ValueKind::Double(_) => ValueTag::Double,
            ValueKind::String(_) => ValueTag::String,
            ValueKind::List(_) => ValueTag::List,
            ValueKind::Map(_) => ValueTag::Map,
        }
    }

    pub fn as_int(&self) -> i32 {
        match &self.kind {
            ValueKind::Integer(i) => *i,
            _ => 0,
        }
    }

    pub fn as_double(&self) -> f64 {
        match &self.kind {
            ValueKind::Double(d) => *d,
            _ => 0.0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.kind {
            ValueKind::List(list) => Some(&list.items),
            _ => None,
        }
    }

    fn as_list_data_mut(&mut self) -> Option<&mut ListData> {
        match &mut self.kind {
            ValueKind::List(list) => Some(list),
            _ => None,
        }
    }

    fn as_map_data(&self) -> Option<&MapData> {
        match &self.kind {
            ValueKind::Map(map) => Some(map),
            _ => None,
        }
    }

    fn as_map_data_mut(&mut self) -> Option<&mut MapData> {
        match &mut self.kind {
            ValueKind::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Coerce for insertion into a `build` template (spec §4.1): integers
    /// decimal, doubles shortest round-trip, strings as-is; lists and maps
    /// are not coercible.
    pub fn coerce_to_template_text(&self) -> Option<String> {
        match &self.kind {
            ValueKind::Integer(i) => Some(i.to_string()),
            ValueKind::Double(d) => Some(format_double_shortest(*d)),
            ValueKind::String(s) => Some(s.clone()),
            ValueKind::List(_) | ValueKind::Map(_) => None,
        }
    }

    // --- ownership ---

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner.get()
    }

    pub fn is_unowned(&self) -> bool {
        self.owner.get().is_none()
    }

    /// Stamp this value as owned by `owner`. Idempotent if already held by
    /// the same owner; fails if held by a different one.
    pub fn hold(&self, owner: OwnerId) -> AgeRunResult<()> {
        match self.owner.get() {
            None => {
                self.owner.set(Some(owner));
                Ok(())
            }
            Some(current) if current == owner => Ok(()),
            Some(_) => Err(AgeRunError::ownership(
                "value is already owned by a different owner",
            )),
        }
    }

    /// Release ownership back to unowned. Only the current owner may do this.
    pub fn transfer(&self, owner: OwnerId) -> AgeRunResult<()> {
        match self.owner.get() {
            Some(current) if current == owner => {
                self.owner.set(None);
                Ok(())
            }
            _ => Err(AgeRunError::ownership(
                "only the current owner may transfer a value",
            )),
        }
    }

    /// Destroy this value. Fails if it is still owned by anyone; recursively
    /// transfers-and-destroys map/list children.
    pub fn destroy(mut self) -> AgeRunResult<()> {
        if !self.is_unowned() {
            return Err(AgeRunError::ownership("cannot destroy an owned value"));
        }
        if let Some(list) = self.as_list_data_mut() {
            let id = list.id;
            for child in std::mem::take(&mut list.items) {
                child.transfer(id)?;
                child.destroy()?;
            }
        } else if let Some(map) = self.as_map_data_mut() {
            let id = map.id;
            for (_, child) in std::mem::take(&mut map.entries) {
                child.transfer(id)?;
                child.destroy()?;
            }
        }
        Ok(())
    }

    /// Build an independent, freshly unowned copy. Scalars copy trivially;
    /// maps and lists recurse (spec §4.7 open question: list deep-copy is
    /// implemented for real here, see DESIGN.md).
    pub fn deep_copy(&self) -> Value {
        match &self.kind {
            ValueKind::Integer(i) => Value::integer(*i),
            ValueKind::Double(d) => Value::double(*d),
            ValueKind::String(s) => Value::string(s.clone()),
            ValueKind::List(list) => {
                let mut copy = Value::list();
                let data = copy.as_list_data_mut().expect("just constructed as list");
                for item in &list.items {
                    data.push(item.deep_copy())
                        .expect("fresh deep copy is always unowned");
                }
                copy
            }
            ValueKind::Map(map) => {
                let mut copy = Value::map();
                let data = copy.as_map_data_mut().expect("just constructed as map");
                for (key, value) in &map.entries {
                    data.set(key, value.deep_copy())
                        .expect("fresh deep copy is always unowned");
                }
                copy
            }
        }
    }

    // --- list operations ---

    pub fn list_push(&mut self, value: Value) -> AgeRunResult<()> {
        let data = self
            .as_list_data_mut()
            .ok_or_else(|| AgeRunError::path("value is not a list"))?;
        data.push(value)
    }

    // --- map operations, flat and dotted (spec §4.1) ---

    /// `get(map, "a.b.c")`: returns `None` if any interior segment is
    /// missing or not a map.
    pub fn get_map_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            let map = current.as_map_data()?;
            current = map.entries.get(segment)?;
        }
        Some(current)
    }

    /// `set(map, "a.b.c", v)`: requires every interior segment to already
    /// resolve to an existing map; never auto-creates. Fails without
    /// mutating `self` when that precondition is not met.
    pub fn set_map_path(&mut self, path: &str, value: Value) -> AgeRunResult<()> {
        match path.rsplit_once('.') {
            None => {
                let data = self
                    .as_map_data_mut()
                    .ok_or_else(|| AgeRunError::path("value is not a map"))?;
                data.set(path, value)
            }
            Some((parent_path, key)) => {
                let parent = self
                    .get_map_path_mut(parent_path)
                    .ok_or_else(|| AgeRunError::path("interior path segment is missing or not a map"))?;
                let data = parent
                    .as_map_data_mut()
                    .ok_or_else(|| AgeRunError::path("interior path segment is not a map"))?;
                data.set(key, value)
            }
        }
    }

    fn get_map_path_mut(&mut self, path: &str) -> Option<&mut Value> {
        let mut current = self;
        for segment in path.split('.') {
            let map = current.as_map_data_mut()?;
            current = map.entries.get_mut(segment)?;
        }
        Some(current)
    }

    /// A freshly owned list of string keys, in insertion order. Empty for an
    /// empty map.
    pub fn map_keys(&self) -> AgeRunResult<Value> {
        let data = self
            .as_map_data()
            .ok_or_else(|| AgeRunError::path("value is not a map"))?;
        let mut list = Value::list();
        for key in data.entries.keys() {
            list.list_push(Value::string(key.clone()))?;
        }
        Ok(list)
    }

    pub fn is_map(&self) -> bool {
        matches!(self.kind, ValueKind::Map(_))
    }
}

impl ListData {
    fn push(&mut self, value: Value) -> AgeRunResult<()> {
        value.hold(self.id)?;
        self.items.push(value);
        Ok(())
    }
}

impl MapData {
    fn set(&mut self, key: &str, value: Value) -> AgeRunResult<()> {
        value.hold(self.id)?;
        let previous = self.entries.insert(key.to_string(), value);
        if let Some(previous) = previous {
            previous.transfer(self.id)?;
            previous.destroy()?;
        }
        Ok(())
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        crate::heap::record_drop(self.tag());
    }
}

impl PartialEq for Value {
    /// Scalars compare structurally; lists and maps compare by reference
    /// identity (spec §4.4: "no structural equality").
    fn eq(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Integer(a), ValueKind::Integer(b)) => a == b,
            (ValueKind::Double(a), ValueKind::Double(b)) => a == b,
            (ValueKind::String(a), ValueKind::String(b)) => a == b,
            (ValueKind::List(a), ValueKind::List(b)) => a.id == b.id,
            (ValueKind::Map(a), ValueKind::Map(b)) => a.id == b.id,
            _ => false,
        }
    }
}

fn format_double_shortest(value: f64) -> String {
    let mut buffer = ryu::Buffer::new();
    buffer.format(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_is_idempotent_for_same_owner() {
        let v = Value::integer(1);
        let owner = OwnerId::fresh();
        assert!(v.hold(owner).is_ok());
        assert!(v.hold(owner).is_ok());
        assert_eq!(v.owner(), Some(owner));
    }

    #[test]
    fn hold_fails_for_a_different_owner() {
        let v = Value::integer(1);
        let a = OwnerId::fresh();
        let b = OwnerId::fresh();
        v.hold(a).unwrap();
        assert!(v.hold(b).is_err());
    }

    #[test]
    fn transfer_requires_the_current_owner() {
        let v = Value::integer(1);
        let a = OwnerId::fresh();
        let b = OwnerId::fresh();
        v.hold(a).unwrap();
        assert!(v.transfer(b).is_err());
        assert!(v.transfer(a).is_ok());
        assert!(v.is_unowned());
    }

    #[test]
    fn destroying_an_owned_value_is_an_error() {
        let v = Value::integer(1);
        let owner = OwnerId::fresh();
        v.hold(owner).unwrap();
        assert!(v.destroy().is_err());
    }

    #[test]
    fn map_set_get_round_trip_for_scalar() {
        let mut m = Value::map();
        m.set_map_path("a", Value::integer(42)).unwrap();
        assert_eq!(m.get_map_path("a").unwrap().as_int(), 42);
    }

    #[test]
    fn dotted_set_requires_existing_parent_map() {
        let mut m = Value::map();
        assert!(m.set_map_path("a.b", Value::integer(1)).is_err());
        assert!(m.get_map_path("a").is_none());

        let mut inner = Value::map();
        inner.set_map_path("b", Value::integer(7)).unwrap();
        m.set_map_path("a", inner).unwrap();
        assert!(m.set_map_path("a.b", Value::integer(9)).is_ok());
        assert_eq!(m.get_map_path("a.b").unwrap().as_int(), 9);
    }

    #[test]
    fn map_keys_preserves_insertion_order() {
        let mut m = Value::map();
        m.set_map_path("z", Value::integer(1)).unwrap();
        m.set_map_path("a", Value::integer(2)).unwrap();
        let keys = m.map_keys().unwrap();
        let keys = keys.as_list().unwrap();
        assert_eq!(keys[0].as_str(), Some("z"));
        assert_eq!(keys[1].as_str(), Some("a"));
    }

    #[test]
    fn empty_map_has_empty_key_list() {
        let m = Value::map();
        let keys = m.map_keys().unwrap();
        assert_eq!(keys.as_list().unwrap().len(), 0);
    }

    #[test]
    fn deep_copy_is_independent_and_unowned() {
        let mut inner = Value::map();
        inner.set_map_path("n", Value::integer(5)).unwrap();
        let mut outer = Value::map();
        outer.set_map_path("inner", inner).unwrap();

        let copy = outer.deep_copy();
        assert!(copy.is_unowned());
        assert_eq!(
            copy.get_map_path("inner.n").unwrap().as_int(),
            outer.get_map_path("inner.n").unwrap().as_int()
        );
    }

    #[test]
    fn list_and_map_equality_is_reference_identity() {
        let a = Value::list();
        let b = Value::list();
        assert_ne!(a, b);
        assert_eq!(Value::integer(3), Value::integer(3));
    }

    #[test]
    fn double_coerces_with_shortest_round_trip_formatting() {
        assert_eq!(Value::double(3.14).coerce_to_template_text().unwrap(), "3.14");
    }
}
