//! Observable properties and the typed values they carry
//!
//! A [`Property`] is a shared cell with synchronous change notification.
//! Cloning a property clones the handle, not the value: every clone sees
//! the same value and the same subscribers. Entities expose their fields
//! as properties so forms and tables observe the same state.

use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput, Type};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::error::{CrudError, Result};
use crate::core::identity::RecordId;

/// Storage format for date-time columns
pub const STORAGE_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

type Listener<T> = Rc<dyn Fn(&T, &T)>;

/// Token returned by [`Property::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

struct Slot<T> {
    value: T,
    listeners: Vec<(u64, Listener<T>)>,
    next_token: u64,
}

/// A value cell that notifies subscribers when it changes
pub struct Property<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                value,
                listeners: Vec::new(),
                next_token: 0,
            })),
        }
    }

    /// Borrow the current value for the duration of `f`
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.borrow().value)
    }

    /// Register a listener called with `(old, new)` after every change
    pub fn subscribe(&self, listener: impl Fn(&T, &T) + 'static) -> Subscription {
        let mut slot = self.slot.borrow_mut();
        let token = slot.next_token;
        slot.next_token += 1;
        slot.listeners.push((token, Rc::new(listener)));
        Subscription(token)
    }

    /// Returns false if the token was not subscribed
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut slot = self.slot.borrow_mut();
        let before = slot.listeners.len();
        slot.listeners.retain(|(token, _)| *token != subscription.0);
        slot.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.slot.borrow().listeners.len()
    }
}

impl<T: Clone> Property<T> {
    pub fn get(&self) -> T {
        self.slot.borrow().value.clone()
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Write a new value. Subscribers run before this returns; writing an
    /// equal value is not a change and notifies nobody.
    pub fn set(&self, value: T) -> bool {
        let (old, listeners) = {
            let mut slot = self.slot.borrow_mut();
            if slot.value == value {
                return false;
            }
            let old = std::mem::replace(&mut slot.value, value);
            let listeners: Vec<Listener<T>> =
                slot.listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
            (old, listeners)
        };

        // Borrow released: listeners may read this property.
        let new = self.get();
        for listener in listeners {
            listener(&old, &new);
        }
        true
    }
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("Property")
            .field("value", &slot.value)
            .field("subscribers", &slot.listeners.len())
            .finish()
    }
}

/// Declared kind of a persisted property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    Text,
    DateTime,
    ForeignKey,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Text => write!(f, "text"),
            PropertyKind::DateTime => write!(f, "date-time"),
            PropertyKind::ForeignKey => write!(f, "foreign key"),
        }
    }
}

/// A property value detached from its cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    DateTime(Option<NaiveDateTime>),
    ForeignKey(Option<RecordId>),
}

impl Value {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Value::Text(_) => PropertyKind::Text,
            Value::DateTime(_) => PropertyKind::DateTime,
            Value::ForeignKey(_) => PropertyKind::ForeignKey,
        }
    }

    /// Read column `idx` of a row as a value of `kind`
    pub fn read(kind: PropertyKind, row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Self> {
        match kind {
            PropertyKind::Text => {
                let text: Option<String> = row.get(idx)?;
                Ok(Value::Text(text.unwrap_or_default()))
            }
            PropertyKind::DateTime => {
                let raw: Option<String> = row.get(idx)?;
                let parsed = raw
                    .map(|s| NaiveDateTime::parse_from_str(&s, STORAGE_DATE_TIME_FORMAT))
                    .transpose()
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
                    })?;
                Ok(Value::DateTime(parsed))
            }
            PropertyKind::ForeignKey => Ok(Value::ForeignKey(row.get(idx)?)),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Text(s) => s.to_sql(),
            Value::DateTime(Some(dt)) => Ok(ToSqlOutput::from(
                dt.format(STORAGE_DATE_TIME_FORMAT).to_string(),
            )),
            Value::DateTime(None) => Ok(ToSqlOutput::from(rusqlite::types::Null)),
            Value::ForeignKey(id) => id.to_sql(),
        }
    }
}

/// Kind-tagged handle onto one property of an entity
#[derive(Debug, Clone)]
pub enum PropertyRef {
    Text(Property<String>),
    DateTime(Property<Option<NaiveDateTime>>),
    ForeignKey(Property<Option<RecordId>>),
}

impl PropertyRef {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyRef::Text(_) => PropertyKind::Text,
            PropertyRef::DateTime(_) => PropertyKind::DateTime,
            PropertyRef::ForeignKey(_) => PropertyKind::ForeignKey,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            PropertyRef::Text(p) => Value::Text(p.get()),
            PropertyRef::DateTime(p) => Value::DateTime(p.get()),
            PropertyRef::ForeignKey(p) => Value::ForeignKey(p.get()),
        }
    }

    /// Write a value; the value's kind must match the property's kind
    pub fn set_value(&self, value: Value) -> Result<()> {
        match (self, value) {
            (PropertyRef::Text(p), Value::Text(v)) => {
                p.set(v);
            }
            (PropertyRef::DateTime(p), Value::DateTime(v)) => {
                p.set(v);
            }
            (PropertyRef::ForeignKey(p), Value::ForeignKey(v)) => {
                p.set(v);
            }
            (this, value) => {
                return Err(CrudError::invalid_state(format!(
                    "cannot write a {} value into a {} property",
                    value.kind(),
                    this.kind()
                )))
            }
        }
        Ok(())
    }

    pub fn copy_from(&self, other: &PropertyRef) -> Result<()> {
        self.set_value(other.value())
    }

    /// Subscribe to changes regardless of the value type
    pub fn on_change(&self, listener: impl Fn() + 'static) -> Subscription {
        match self {
            PropertyRef::Text(p) => p.subscribe(move |_, _| listener()),
            PropertyRef::DateTime(p) => p.subscribe(move |_, _| listener()),
            PropertyRef::ForeignKey(p) => p.subscribe(move |_, _| listener()),
        }
    }

    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        match self {
            PropertyRef::Text(p) => p.unsubscribe(subscription),
            PropertyRef::DateTime(p) => p.unsubscribe(subscription),
            PropertyRef::ForeignKey(p) => p.unsubscribe(subscription),
        }
    }
}

impl From<&Property<String>> for PropertyRef {
    fn from(p: &Property<String>) -> Self {
        PropertyRef::Text(p.clone())
    }
}

impl From<&Property<Option<NaiveDateTime>>> for PropertyRef {
    fn from(p: &Property<Option<NaiveDateTime>>) -> Self {
        PropertyRef::DateTime(p.clone())
    }
}

impl From<&Property<Option<RecordId>>> for PropertyRef {
    fn from(p: &Property<Option<RecordId>>) -> Self {
        PropertyRef::ForeignKey(p.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;

    #[test]
    fn test_set_notifies_with_old_and_new() {
        let prop = Property::new(String::from("a"));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        prop.subscribe(move |old: &String, new: &String| {
            sink.borrow_mut().push((old.clone(), new.clone()));
        });

        assert!(prop.set("b".to_string()));
        assert!(prop.set("c".to_string()));

        assert_eq!(
            *seen.borrow(),
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string())
            ]
        );
    }

    #[test]
    fn test_equal_write_does_not_notify() {
        let prop = Property::new(5_i32);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        prop.subscribe(move |_, _| counter.set(counter.get() + 1));

        assert!(!prop.set(5));
        assert_eq!(calls.get(), 0);
        assert!(prop.set(6));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let prop = Property::new(0_i32);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let sub = prop.subscribe(move |_, _| counter.set(counter.get() + 1));

        prop.set(1);
        assert!(prop.unsubscribe(sub));
        assert!(!prop.unsubscribe(sub));
        prop.set(2);

        assert_eq!(calls.get(), 1);
        assert_eq!(prop.subscriber_count(), 0);
    }

    #[test]
    fn test_listener_can_read_property() {
        let prop = Property::new(1_i32);
        let observed = Rc::new(Cell::new(0));
        let handle = prop.clone();
        let sink = Rc::clone(&observed);
        prop.subscribe(move |_, _| sink.set(handle.get()));

        prop.set(10);
        assert_eq!(observed.get(), 10);
    }

    #[test]
    fn test_clones_share_state() {
        let a = Property::new(String::from("x"));
        let b = a.clone();
        b.set("y".to_string());
        assert_eq!(a.get(), "y");
    }

    #[test]
    fn test_property_ref_rejects_wrong_kind() {
        let prop: Property<String> = Property::default();
        let handle = PropertyRef::from(&prop);
        let err = handle.set_value(Value::ForeignKey(None)).unwrap_err();
        assert!(matches!(err, CrudError::InvalidState(_)));
        assert_eq!(prop.get(), "");
    }

    #[test]
    fn test_copy_from() {
        let when = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let source: Property<Option<NaiveDateTime>> = Property::new(Some(when));
        let target: Property<Option<NaiveDateTime>> = Property::default();

        PropertyRef::from(&target)
            .copy_from(&PropertyRef::from(&source))
            .unwrap();
        assert_eq!(target.get(), Some(when));
    }
}
