//! Reading, copying and mutating the fields of a record instance
//!
//! Assignable fields are written in place on a clone of the instance.
//! Read-only fields are changed by reconstruction: every field's current value
//! is read, the one being changed is replaced, and the record is rebuilt
//! through its constructor.

use crate::error::{VerifierError, VerifierResult};
use crate::providers::ChainedValueProvider;
use crate::shape::{FieldDescriptor, FieldValues, RecordInfo};
use crate::types::TypeStack;
use crate::value::Value;

/// A record instance together with its field table
#[derive(Debug, Clone)]
pub struct ObjectAccessor<'a> {
    record: &'a RecordInfo,
    object: Value,
}

impl<'a> ObjectAccessor<'a> {
    pub fn new(record: &'a RecordInfo, object: Value) -> Self {
        Self { record, object }
    }

    pub fn get(&self) -> &Value {
        &self.object
    }

    pub fn into_inner(self) -> Value {
        self.object
    }

    pub fn record(&self) -> &'a RecordInfo {
        self.record
    }

    fn field(&self, name: &str) -> VerifierResult<&'a FieldDescriptor> {
        self.record
            .field(name)
            .ok_or_else(|| VerifierError::access(format!("{} has no field {}", self.record.type_name(), name)))
    }

    /// Current value of a field
    pub fn read(&self, name: &str) -> VerifierResult<Value> {
        self.field(name)?.read(&self.object)
    }

    fn current_values(&self) -> VerifierResult<FieldValues> {
        let mut values = FieldValues::new();
        for field in self.record.fields() {
            values.insert(field.name(), field.read(&self.object)?);
        }
        Ok(values)
    }

    /// A separately constructed instance holding the same field values
    pub fn copy(&self) -> VerifierResult<ObjectAccessor<'a>> {
        let object = self.record.construct(self.current_values()?)?;
        Ok(ObjectAccessor::new(self.record, object))
    }

    /// An instance equal to this one except that `name` holds `value`
    pub fn with_field_value(&self, name: &str, value: Value) -> VerifierResult<ObjectAccessor<'a>> {
        let field = self.field(name)?;
        if field.is_writable() {
            let mut object = self.object.clone();
            field.write(&mut object, value)?;
            return Ok(ObjectAccessor::new(self.record, object));
        }
        let mut values = self.current_values()?;
        values.insert(field.name(), value);
        let object = self.record.construct(values)?;
        Ok(ObjectAccessor::new(self.record, object))
    }

    /// An instance where `name` holds the other value of its type's pair
    pub fn with_changed_field(
        &self,
        name: &str,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<ObjectAccessor<'a>> {
        let field = self.field(name)?;
        let current = field.read(&self.object)?;
        let other = chain.give_other(field.declared(), Some(field.label()), &current, stack)?;
        self.with_field_value(name, other)
    }

    /// An instance where every field except `name` holds the other value of
    /// its pair
    pub fn with_all_fields_changed_except(
        &self,
        name: &str,
        chain: &ChainedValueProvider,
        stack: &TypeStack,
    ) -> VerifierResult<ObjectAccessor<'a>> {
        let mut values = FieldValues::new();
        for field in self.record.fields() {
            let current = field.read(&self.object)?;
            let value = if field.name() == name {
                current
            } else {
                chain.give_other(field.declared(), Some(field.label()), &current, stack)?
            };
            values.insert(field.name(), value);
        }
        let object = self.record.construct(values)?;
        Ok(ObjectAccessor::new(self.record, object))
    }

    /// Changes every assignable field in place to the other value of its pair
    ///
    /// Returns the names of the read-only fields, which cannot be changed in
    /// place and were left as they were.
    pub fn scramble(&mut self, chain: &ChainedValueProvider, stack: &TypeStack) -> VerifierResult<Vec<&'static str>> {
        let mut skipped = Vec::new();
        for field in self.record.fields() {
            if !field.is_writable() {
                skipped.push(field.name());
                continue;
            }
            let current = field.read(&self.object)?;
            let other = chain.give_other(field.declared(), Some(field.label()), &current, stack)?;
            field.write(&mut self.object, other)?;
        }
        if !skipped.is_empty() {
            log::debug!(
                "Read-only fields of {} left unscrambled: {:?}",
                self.record.type_name(),
                skipped
            );
        }
        Ok(skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factories::FactoryCache;
    use crate::shape::{Described, Shape};
    use crate::types::{RawType, TypeDescriptor};
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Account {
        id: u32,
        owner: String,
        tags: Vec<String>,
    }

    crate::describe_record!(Account { id: u32, owner: String, tags: Vec<String> });

    #[derive(Debug, Clone, PartialEq)]
    struct Ledger {
        id: u32,
        shared: Rc<String>,
    }

    impl Described for Ledger {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new(RawType::of::<Ledger>(), Vec::new(), || {
                Shape::record(
                    RecordInfo::builder::<Ledger>()
                        .read_only_field::<u32>("id", |s| s.id)
                        .field::<Rc<String>>("shared", |s| s.shared.clone(), |s, v| s.shared = v)
                        .build(|values| {
                            Ok(Ledger {
                                id: values.take("id")?,
                                shared: values.take("shared")?,
                            })
                        }),
                )
            })
        }
    }

    fn record_of<T: Described>() -> Rc<RecordInfo> {
        T::descriptor().shape().as_record().cloned().unwrap()
    }

    fn account() -> Account {
        Account {
            id: 1,
            owner: "one".to_string(),
            tags: vec!["one".to_string()],
        }
    }

    #[test]
    fn test_changing_one_field_leaves_others() {
        let chain = ChainedValueProvider::standard(FactoryCache::new(), 0);
        let record = record_of::<Account>();
        let accessor = ObjectAccessor::new(&record, Value::new(account()));

        let changed = accessor
            .with_changed_field("owner", &chain, &TypeStack::new())
            .unwrap()
            .into_inner()
            .extract::<Account>()
            .unwrap();

        assert_eq!(changed.owner, "two");
        assert_eq!(changed.id, 1);
        assert_eq!(changed.tags, vec!["one".to_string()]);
        assert_eq!(accessor.get().extract::<Account>().unwrap(), account());
    }

    #[test]
    fn test_all_fields_changed_except_one() {
        let chain = ChainedValueProvider::standard(FactoryCache::new(), 0);
        let record = record_of::<Account>();
        let accessor = ObjectAccessor::new(&record, Value::new(account()));

        let changed = accessor
            .with_all_fields_changed_except("id", &chain, &TypeStack::new())
            .unwrap()
            .into_inner()
            .extract::<Account>()
            .unwrap();

        assert_eq!(changed.id, 1);
        assert_eq!(changed.owner, "two");
        assert_eq!(changed.tags, vec!["two".to_string()]);
    }

    #[test]
    fn test_read_only_field_changes_by_reconstruction() {
        let chain = ChainedValueProvider::standard(FactoryCache::new(), 0);
        let record = record_of::<Ledger>();
        let shared = Rc::new("x".to_string());
        let accessor = ObjectAccessor::new(&record, Value::new(Ledger { id: 1, shared: shared.clone() }));

        let changed = accessor
            .with_changed_field("id", &chain, &TypeStack::new())
            .unwrap()
            .into_inner()
            .extract::<Ledger>()
            .unwrap();

        assert_eq!(changed.id, 2);
        assert!(Rc::ptr_eq(&changed.shared, &shared));
    }

    #[test]
    fn test_scramble_reports_read_only_fields() {
        let chain = ChainedValueProvider::standard(FactoryCache::new(), 0);
        let record = record_of::<Ledger>();
        let mut accessor = ObjectAccessor::new(&record, Value::new(Ledger { id: 1, shared: Rc::new("x".to_string()) }));

        let skipped = accessor.scramble(&chain, &TypeStack::new()).unwrap();
        let scrambled = accessor.get().extract::<Ledger>().unwrap();

        assert_eq!(skipped, vec!["id"]);
        assert_eq!(scrambled.id, 1);
        assert_eq!(*scrambled.shared, "one");
    }

    #[test]
    fn test_copy_is_shallow() {
        let record = record_of::<Ledger>();
        let shared = Rc::new("x".to_string());
        let accessor = ObjectAccessor::new(&record, Value::new(Ledger { id: 3, shared: shared.clone() }));
        let copy = accessor.copy().unwrap().into_inner().extract::<Ledger>().unwrap();

        assert_eq!(copy.id, 3);
        assert!(Rc::ptr_eq(&copy.shared, &shared));
    }

    #[test]
    fn test_unknown_field_is_an_access_error() {
        let record = record_of::<Account>();
        let accessor = ObjectAccessor::new(&record, Value::new(account()));
        assert!(matches!(accessor.read("balance"), Err(VerifierError::Access { .. })));
    }
}
