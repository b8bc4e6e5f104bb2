//! `Described` implementations for the standard library types the engine
//! knows out of the box

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use half::f16;

use super::{next_part, Described, Shape, Zero};
use crate::types::{RawType, TypeDescriptor};
use crate::value::{Opaque, Value};

macro_rules! scalar {
    ($($t:ty),* $(,)?) => {$(
        impl Described for $t {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::new(RawType::of::<$t>(), Vec::new(), || Shape::Scalar {
                    zero: || Value::new(<$t>::default()),
                })
            }
        }
    )*};
}

scalar!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    f16,
    String,
    &'static str,
    Duration,
    PathBuf,
    Opaque,
);

impl Described for Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::TOP, Vec::new(), || Shape::Top)
    }
}

impl<T: Described> Described for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<Option<T>>(), vec![T::descriptor()], || {
            Shape::container(1, Zero::Empty(|| Value::new(None::<T>)), |parts| {
                let mut parts = parts.into_iter();
                Ok(Value::new(Some(next_part::<T>(&mut parts)?)))
            })
        })
        .with_wildcard(Option::<Value>::descriptor)
    }
}

impl<T: Described> Described for Vec<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<Vec<T>>(), vec![T::descriptor()], || {
            Shape::container(1, Zero::Empty(|| Value::new(Vec::<T>::new())), |parts| {
                let mut parts = parts.into_iter();
                Ok(Value::new(vec![next_part::<T>(&mut parts)?]))
            })
        })
        .with_wildcard(Vec::<Value>::descriptor)
    }
}

impl<T: Described> Described for VecDeque<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<VecDeque<T>>(), vec![T::descriptor()], || {
            Shape::container(1, Zero::Empty(|| Value::new(VecDeque::<T>::new())), |parts| {
                let mut parts = parts.into_iter();
                let mut deque = VecDeque::new();
                deque.push_back(next_part::<T>(&mut parts)?);
                Ok(Value::new(deque))
            })
        })
        .with_wildcard(VecDeque::<Value>::descriptor)
    }
}

impl<T: Described + Eq + Hash> Described for HashSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<HashSet<T>>(), vec![T::descriptor()], || {
            Shape::container(1, Zero::Empty(|| Value::new(HashSet::<T>::new())), |parts| {
                let mut parts = parts.into_iter();
                let mut set = HashSet::new();
                set.insert(next_part::<T>(&mut parts)?);
                Ok(Value::new(set))
            })
        })
        .with_wildcard(HashSet::<Opaque>::descriptor)
    }
}

impl<T: Described + Ord> Described for BTreeSet<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<BTreeSet<T>>(), vec![T::descriptor()], || {
            Shape::container(1, Zero::Empty(|| Value::new(BTreeSet::<T>::new())), |parts| {
                let mut parts = parts.into_iter();
                let mut set = BTreeSet::new();
                set.insert(next_part::<T>(&mut parts)?);
                Ok(Value::new(set))
            })
        })
        .with_wildcard(BTreeSet::<Opaque>::descriptor)
    }
}

impl<K: Described + Eq + Hash, V: Described> Described for HashMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            RawType::of::<HashMap<K, V>>(),
            vec![K::descriptor(), V::descriptor()],
            || {
                Shape::container(2, Zero::Empty(|| Value::new(HashMap::<K, V>::new())), |parts| {
                    let mut parts = parts.into_iter();
                    let key = next_part::<K>(&mut parts)?;
                    let value = next_part::<V>(&mut parts)?;
                    let mut map = HashMap::new();
                    map.insert(key, value);
                    Ok(Value::new(map))
                })
            },
        )
        .with_wildcard(HashMap::<Opaque, Value>::descriptor)
    }
}

impl<K: Described + Ord, V: Described> Described for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            RawType::of::<BTreeMap<K, V>>(),
            vec![K::descriptor(), V::descriptor()],
            || {
                Shape::container(2, Zero::Empty(|| Value::new(BTreeMap::<K, V>::new())), |parts| {
                    let mut parts = parts.into_iter();
                    let key = next_part::<K>(&mut parts)?;
                    let value = next_part::<V>(&mut parts)?;
                    let mut map = BTreeMap::new();
                    map.insert(key, value);
                    Ok(Value::new(map))
                })
            },
        )
        .with_wildcard(BTreeMap::<Opaque, Value>::descriptor)
    }
}

macro_rules! wrapper {
    ($($w:ident),* $(,)?) => {$(
        impl<T: Described> Described for $w<T> {
            fn descriptor() -> TypeDescriptor {
                TypeDescriptor::new(RawType::of::<$w<T>>(), vec![T::descriptor()], || {
                    Shape::container(1, Zero::FromArguments, |parts| {
                        let mut parts = parts.into_iter();
                        Ok(Value::new($w::new(next_part::<T>(&mut parts)?)))
                    })
                })
                .with_wildcard($w::<Value>::descriptor)
            }
        }
    )*};
}

wrapper!(Box, Rc, Arc, RefCell);

impl<T: Described + Copy> Described for Cell<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<Cell<T>>(), vec![T::descriptor()], || {
            Shape::container(1, Zero::FromArguments, |parts| {
                let mut parts = parts.into_iter();
                Ok(Value::new(Cell::new(next_part::<T>(&mut parts)?)))
            })
        })
        .with_wildcard(Cell::<Opaque>::descriptor)
    }
}

impl<A: Described, B: Described> Described for (A, B) {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            RawType::named("tuple2"),
            vec![A::descriptor(), B::descriptor()],
            || {
                Shape::container(2, Zero::FromArguments, |parts| {
                    let mut parts = parts.into_iter();
                    let a = next_part::<A>(&mut parts)?;
                    let b = next_part::<B>(&mut parts)?;
                    Ok(Value::new((a, b)))
                })
            },
        )
        .with_wildcard(<(Value, Value)>::descriptor)
    }
}

impl<A: Described, B: Described, C: Described> Described for (A, B, C) {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(
            RawType::named("tuple3"),
            vec![A::descriptor(), B::descriptor(), C::descriptor()],
            || {
                Shape::container(3, Zero::FromArguments, |parts| {
                    let mut parts = parts.into_iter();
                    let a = next_part::<A>(&mut parts)?;
                    let b = next_part::<B>(&mut parts)?;
                    let c = next_part::<C>(&mut parts)?;
                    Ok(Value::new((a, b, c)))
                })
            },
        )
        .with_wildcard(<(Value, Value, Value)>::descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_zero_is_default() {
        match TypeDescriptor::of::<i64>().shape() {
            Shape::Scalar { zero } => assert_eq!(zero(), Value::new(0i64)),
            other => panic!("expected a scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_container_assembles_from_parts() {
        let descriptor = TypeDescriptor::of::<HashMap<String, i32>>();
        let map = descriptor
            .assemble(vec![Value::new("k".to_string()), Value::new(3i32)])
            .unwrap();
        let map = map.extract::<HashMap<String, i32>>().unwrap();
        assert_eq!(map.get("k"), Some(&3));
    }

    #[test]
    fn test_assemble_reports_wrong_part_type() {
        let descriptor = TypeDescriptor::of::<Option<String>>();
        assert!(descriptor.assemble(vec![Value::new(1u8)]).is_err());
        assert!(descriptor.assemble(Vec::new()).is_err());
    }

    #[test]
    fn test_wildcard_container_accepts_any_value() {
        let descriptor = TypeDescriptor::of::<Vec<Value>>();
        let list = descriptor.assemble(vec![Value::new(Opaque(4))]).unwrap();
        let list = list.extract::<Vec<Value>>().unwrap();
        assert_eq!(list, vec![Value::new(Opaque(4))]);
    }

    #[test]
    fn test_erased_keys_are_tokens() {
        let erased = TypeDescriptor::of::<HashMap<String, i32>>().erased();
        let map = erased
            .assemble(vec![Value::new(Opaque(1)), Value::new(Opaque(2))])
            .unwrap();
        let map = map.extract::<HashMap<Opaque, Value>>().unwrap();
        assert_eq!(map.get(&Opaque(1)), Some(&Value::new(Opaque(2))));

        let erased = TypeDescriptor::of::<BTreeSet<u8>>().erased();
        assert!(erased.assemble(vec![Value::new(Opaque(1))]).is_ok());
    }

    #[test]
    fn test_tuple_names() {
        assert_eq!(TypeDescriptor::of::<(i32, String)>().to_string(), "tuple2<i32, String>");
        assert_eq!(TypeDescriptor::of::<(u8, u8, u8)>().raw(), RawType::named("tuple3"));
    }

    #[test]
    fn test_value_is_top() {
        assert!(TypeDescriptor::of::<Value>().is_top());
        assert!(matches!(TypeDescriptor::of::<Value>().shape(), Shape::Top));
    }
}
