//! Field tables for record types
//!
//! A record declares its fields once. Each field knows its declared type, can
//! read its current value out of an instance and, if the field is assignable,
//! write a new one. Fields without a write capability are read-only: an
//! instance with a different value for them is obtained by reconstructing the
//! whole record through its constructor.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use super::Described;
use crate::error::{VerifierError, VerifierResult};
use crate::types::{RawType, TypeDescriptor};
use crate::value::Value;

type ReadFn = Rc<dyn Fn(&Value) -> VerifierResult<Value>>;
type WriteFn = Rc<dyn Fn(&mut Value, Value) -> VerifierResult<()>>;
type ConstructFn = Rc<dyn Fn(FieldValues) -> VerifierResult<Value>>;

/// A field of one particular record type
///
/// Field-scoped prefab values are keyed by label, so a value given for
/// `Outer.x` never reaches a field `x` of some nested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldLabel {
    pub owner: RawType,
    pub field: &'static str,
}

impl FieldLabel {
    pub fn new(owner: RawType, field: &'static str) -> Self {
        Self { owner, field }
    }
}

impl fmt::Display for FieldLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.field)
    }
}

/// One entry of a record's field table
#[derive(Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    owner: RawType,
    declared: TypeDescriptor,
    read: ReadFn,
    write: Option<WriteFn>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn declared(&self) -> &TypeDescriptor {
        &self.declared
    }

    pub fn label(&self) -> FieldLabel {
        FieldLabel::new(self.owner, self.name)
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    pub fn read(&self, object: &Value) -> VerifierResult<Value> {
        (self.read)(object)
    }

    /// Assigns `value` in place; read-only fields refuse
    pub fn write(&self, object: &mut Value, value: Value) -> VerifierResult<()> {
        match &self.write {
            Some(write) => write(object, value),
            None => Err(VerifierError::access(format!(
                "field {} is read-only and can only be changed by reconstruction",
                self.name
            ))),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Field values handed to a record constructor, keyed by field name
#[derive(Debug, Clone, Default)]
pub struct FieldValues {
    entries: Vec<(&'static str, Value)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of a field, replacing any earlier one
    pub fn insert(&mut self, name: &'static str, value: Value) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes the value of a field and converts it to the field's type
    pub fn take<F: Described>(&mut self, name: &str) -> VerifierResult<F> {
        let position = self
            .entries
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or_else(|| VerifierError::access(format!("no value given for field {}", name)))?;
        let (_, value) = self.entries.remove(position);
        value.into_inner::<F>()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Field table and constructor of a record type
#[derive(Clone)]
pub struct RecordInfo {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    construct: ConstructFn,
}

impl RecordInfo {
    pub fn builder<T: Described>() -> RecordBuilder<T> {
        RecordBuilder {
            type_name: std::any::type_name::<T>(),
            owner: T::descriptor().raw(),
            fields: Vec::new(),
            _marker: PhantomData,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Builds an instance directly from field values, without running any
    /// validating constructor logic of the type
    pub fn construct(&self, values: FieldValues) -> VerifierResult<Value> {
        (self.construct)(values)
    }
}

impl fmt::Debug for RecordInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordInfo")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Typed builder for a `RecordInfo`
pub struct RecordBuilder<T> {
    type_name: &'static str,
    owner: RawType,
    fields: Vec<FieldDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Described> RecordBuilder<T> {
    /// Declares an assignable field
    pub fn field<F: Described>(mut self, name: &'static str, get: fn(&T) -> F, set: fn(&mut T, F)) -> Self {
        let write: WriteFn = Rc::new(move |object: &mut Value, value: Value| {
            let found = object.type_name();
            let target = object
                .downcast_mut::<T>()
                .ok_or_else(|| target_mismatch::<T>(found))?;
            set(target, value.into_inner::<F>()?);
            Ok(())
        });
        self.fields.push(FieldDescriptor {
            name,
            owner: self.owner,
            declared: F::descriptor(),
            read: reader(get),
            write: Some(write),
        });
        self
    }

    /// Declares a field that cannot be assigned from outside the type
    pub fn read_only_field<F: Described>(mut self, name: &'static str, get: fn(&T) -> F) -> Self {
        self.fields.push(FieldDescriptor {
            name,
            owner: self.owner,
            declared: F::descriptor(),
            read: reader(get),
            write: None,
        });
        self
    }

    /// Finishes the table with the record's constructor
    pub fn build(self, construct: fn(&mut FieldValues) -> VerifierResult<T>) -> RecordInfo {
        RecordInfo {
            type_name: self.type_name,
            fields: self.fields,
            construct: Rc::new(move |mut values: FieldValues| construct(&mut values).map(Value::new)),
        }
    }
}

fn reader<T: Described, F: Described>(get: fn(&T) -> F) -> ReadFn {
    Rc::new(move |object: &Value| {
        let target = object
            .downcast_ref::<T>()
            .ok_or_else(|| target_mismatch::<T>(object.type_name()))?;
        Ok(Value::new(get(target)))
    })
}

fn target_mismatch<T>(found: &str) -> VerifierError {
    VerifierError::access(format!(
        "field table of {} used on a value of type {}",
        std::any::type_name::<T>(),
        found
    ))
}

/// Implements `Described` for a plain struct whose fields are all assignable
///
/// ```ignore
/// describe_record!(Point { x: i32, y: i32 });
/// ```
#[macro_export]
macro_rules! describe_record {
    ($ty:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Described for $ty {
            fn descriptor() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::new($crate::RawType::of::<$ty>(), Vec::new(), || {
                    $crate::Shape::record(
                        $crate::RecordInfo::builder::<$ty>()
                            $(.field::<$fty>(
                                stringify!($field),
                                |o: &$ty| o.$field.clone(),
                                |o: &mut $ty, v: $fty| o.$field = v,
                            ))*
                            .build(|values| {
                                let _ = &values;
                                Ok($ty { $($field: values.take::<$fty>(stringify!($field))?),* })
                            }),
                    )
                })
            }
        }
    };
}
