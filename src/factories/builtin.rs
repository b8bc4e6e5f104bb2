//! The built-in factory registry
//!
//! Built once per process and never mutated afterwards; every chain reads it
//! through a shared `&'static` reference.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use half::f16;

use super::{FactoryCache, ScalarFactory, SimpleGenericFactory, TokenFactory};
use crate::shape::Described;
use crate::types::{RawType, TypeDescriptor};
use crate::value::{ExamplePair, Opaque, Value};

macro_rules! scalar_pairs {
    ($cache:ident; $($t:ty => ($low:expr, $high:expr)),* $(,)?) => {$(
        $cache.insert(
            RawType::of::<$t>(),
            Arc::new(ScalarFactory::new(|| {
                let low: $t = $low;
                let high: $t = $high;
                ExamplePair::new(Value::new(low), Value::new(high))
            })),
        );
    )*};
}

fn register_scalars(cache: &mut FactoryCache) {
    scalar_pairs!(cache;
        () => ((), ()),
        bool => (true, false),
        char => ('a', 'b'),
        u8 => (1, 2),
        u16 => (1, 2),
        u32 => (1, 2),
        u64 => (1, 2),
        u128 => (1, 2),
        usize => (1, 2),
        i8 => (1, 2),
        i16 => (1, 2),
        i32 => (1, 2),
        i64 => (1, 2),
        i128 => (1, 2),
        isize => (1, 2),
        f32 => (0.5, 1.0),
        f64 => (0.5, 1.0),
        f16 => (f16::from_f32(0.5), f16::from_f32(1.0)),
        String => ("one".to_string(), "two".to_string()),
        &'static str => ("one", "two"),
        Duration => (Duration::from_secs(1), Duration::from_secs(2)),
        PathBuf => (PathBuf::from("/one"), PathBuf::from("/two")),
    );
    cache.insert(RawType::TOP, Arc::new(TokenFactory));
    cache.insert(RawType::of::<Opaque>(), Arc::new(TokenFactory));
}

fn register_containers(cache: &mut FactoryCache) {
    let key = TypeDescriptor::of::<Opaque>();

    for raw in [
        RawType::of::<Option<()>>(),
        RawType::of::<Vec<()>>(),
        RawType::of::<VecDeque<()>>(),
        RawType::of::<Box<()>>(),
        RawType::of::<Rc<()>>(),
        RawType::of::<Arc<()>>(),
        RawType::of::<RefCell<()>>(),
        RawType::of::<Cell<()>>(),
    ] {
        cache.insert(raw, Arc::new(SimpleGenericFactory::new(1)));
    }

    for raw in [RawType::of::<HashSet<()>>(), RawType::of::<BTreeSet<()>>()] {
        cache.insert(raw, Arc::new(SimpleGenericFactory::new(1).with_fallback(0, key.clone())));
    }
    for raw in [RawType::of::<HashMap<(), ()>>(), RawType::of::<BTreeMap<(), ()>>()] {
        cache.insert(raw, Arc::new(SimpleGenericFactory::new(2).with_fallback(0, key.clone())));
    }

    cache.insert(<((), ())>::descriptor().raw(), Arc::new(SimpleGenericFactory::new(2)));
    cache.insert(<((), (), ())>::descriptor().raw(), Arc::new(SimpleGenericFactory::new(3)));
}

lazy_static::lazy_static! {
    static ref BUILTIN_FACTORIES: FactoryCache = {
        let mut cache = FactoryCache::new();
        register_scalars(&mut cache);
        register_containers(&mut cache);
        log::debug!("Built-in factory registry holds {} factories", cache.len());
        cache
    };
}

/// The process-wide registry of built-in factories
pub fn builtin_factories() -> &'static FactoryCache {
    &BUILTIN_FACTORIES
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChainedValueProvider;
    use crate::types::TypeStack;

    #[test]
    fn test_registry_covers_scalars_and_containers() {
        let registry = builtin_factories();
        for raw in [
            RawType::of::<i32>(),
            RawType::of::<String>(),
            RawType::of::<f16>(),
            RawType::TOP,
            RawType::of::<Vec<u8>>(),
            RawType::of::<HashMap<u8, u8>>(),
            RawType::named("tuple3"),
        ] {
            assert!(registry.contains_key(&raw), "missing factory for {}", raw);
        }
    }

    #[test]
    fn test_registry_is_shared() {
        assert!(std::ptr::eq(builtin_factories(), builtin_factories()));
    }

    #[test]
    fn test_scalar_pairs_are_distinct() {
        let chain = ChainedValueProvider::standard(FactoryCache::new(), 0);
        let descriptor = TypeDescriptor::of::<i32>();
        let pair = builtin_factories()[&descriptor.raw()]
            .create_values(&descriptor, &chain, &TypeStack::new())
            .unwrap();
        assert_eq!(pair.extract::<i32>().unwrap(), ExamplePair::with_copy(1, 2, 1));
    }

    #[test]
    fn test_hash_map_pair() {
        let chain = ChainedValueProvider::standard(FactoryCache::new(), 0);
        let pair = chain
            .realize(&TypeDescriptor::of::<HashMap<String, i32>>(), None, &TypeStack::new())
            .unwrap()
            .extract::<HashMap<String, i32>>()
            .unwrap();
        assert_eq!(pair.low.get("one"), Some(&1));
        assert_eq!(pair.high.get("two"), Some(&2));
    }

    #[test]
    fn test_erased_containers_wrap_the_top_pair() {
        let chain = ChainedValueProvider::standard(FactoryCache::new(), 0);
        let stack = TypeStack::new();
        let top = chain.realize(&TypeDescriptor::top(), None, &stack).unwrap();

        let erased = TypeDescriptor::of::<Option<String>>().erased();
        let pair = chain.realize(&erased, None, &stack).unwrap();
        assert_eq!(pair.low, Value::new(Some(top.low.clone())));
        assert_eq!(pair.high, Value::new(Some(top.high.clone())));

        let erased = TypeDescriptor::of::<HashMap<String, i32>>().erased();
        let pair = chain
            .realize(&erased, None, &stack)
            .unwrap()
            .extract::<HashMap<Opaque, Value>>()
            .unwrap();
        assert_eq!(pair.low.len(), 1);
        assert_ne!(pair.low, pair.high);
        assert_eq!(pair.low, pair.low_copy);
        assert!(pair.low.values().all(|value| value.is::<Opaque>()));
    }
}
