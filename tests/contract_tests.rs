//! # Contract Test Suite
//!
//! End-to-end checks of the verifier against types with correct and broken
//! `PartialEq`/`Hash` implementations. Each broken type must be reported
//! under the axiom it breaks, and each correct type must pass.

use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use equals_verifier::{
    describe_record, Axiom, CachedHash, Described, EqualsVerifier, FieldValues, Mode, RawType, RecordInfo, Shape,
    TypeDescriptor, VerifierError,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Q {
    x: i32,
    y: i32,
}

describe_record!(Q { x: i32, y: i32 });

/// Equality on x only, hash on x and y
#[derive(Debug, Clone)]
struct P {
    x: i32,
    y: i32,
}

impl PartialEq for P {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x
    }
}

impl Hash for P {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
    }
}

describe_record!(P { x: i32, y: i32 });

/// Equality by pointer identity of a shared field
#[derive(Debug, Clone)]
struct R {
    point: Rc<Q>,
}

impl PartialEq for R {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.point, &other.point)
    }
}

impl Hash for R {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.point) as usize).hash(state);
    }
}

describe_record!(R { point: Rc<Q> });

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Empty;

describe_record!(Empty {});

/// Two fields combined with `||`
#[derive(Debug, Clone)]
struct Either {
    f: String,
    g: String,
}

impl PartialEq for Either {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f || self.g == other.g
    }
}

impl Hash for Either {
    fn hash<H: Hasher>(&self, state: &mut H) {
        42.hash(state);
    }
}

describe_record!(Either { f: String, g: String });

/// Orders instead of comparing
#[derive(Debug, Clone)]
struct Lenient {
    x: i32,
}

impl PartialEq for Lenient {
    fn eq(&self, other: &Self) -> bool {
        self.x <= other.x
    }
}

impl Hash for Lenient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        0.hash(state);
    }
}

describe_record!(Lenient { x: i32 });

/// Answers every other comparison with false
#[derive(Debug, Clone)]
struct Flaky {
    x: i32,
    calls: Cell<u32>,
}

impl PartialEq for Flaky {
    fn eq(&self, other: &Self) -> bool {
        let calls = self.calls.get();
        self.calls.set(calls + 1);
        self.x == other.x && calls % 2 == 0
    }
}

impl Hash for Flaky {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
    }
}

impl Described for Flaky {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<Flaky>(), Vec::new(), || {
            Shape::record(
                RecordInfo::builder::<Flaky>()
                    .field::<i32>("x", |f| f.x, |f, v| f.x = v)
                    .build(|values: &mut FieldValues| {
                        Ok(Flaky {
                            x: values.take("x")?,
                            calls: Cell::new(0),
                        })
                    }),
            )
        })
    }
}

/// Panics when its name is absent
#[derive(Debug, Clone)]
struct Named {
    name: Option<String>,
}

impl PartialEq for Named {
    fn eq(&self, other: &Self) -> bool {
        self.name.as_ref().unwrap() == other.name.as_ref().unwrap()
    }
}

impl Hash for Named {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.as_ref().unwrap().hash(state);
    }
}

describe_record!(Named { name: Option<String> });

/// Keeps a counter that takes no part in equality
#[derive(Debug, Clone)]
struct Counted {
    id: u64,
    reads: u32,
}

impl PartialEq for Counted {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Hash for Counted {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

describe_record!(Counted { id: u64, reads: u32 });

/// Caches the digest of its name
#[derive(Debug, Clone)]
struct Tagged {
    name: String,
    hash: u64,
}

impl Tagged {
    fn new(name: &str) -> Self {
        let mut tagged = Tagged {
            name: name.to_string(),
            hash: 0,
        };
        tagged.recompute();
        tagged
    }

    fn recompute(&mut self) {
        let mut hasher = DefaultHasher::new();
        self.name.hash(&mut hasher);
        self.hash = hasher.finish();
    }
}

impl PartialEq for Tagged {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Hash for Tagged {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

describe_record!(Tagged { name: String, hash: u64 });

/// Equal when the ratios agree
#[derive(Debug, Clone)]
struct Fraction {
    num: i32,
    den: i32,
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 {
        a.abs()
    } else {
        gcd(b, a % b)
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.num * other.den == other.num * self.den
    }
}

impl Hash for Fraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let g = gcd(self.num, self.den);
        if g == 0 {
            (0, 0).hash(state);
        } else {
            (self.num / g, self.den / g).hash(state);
        }
    }
}

describe_record!(Fraction { num: i32, den: i32 });

/// A record with a field that can only be set through the constructor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Frozen {
    id: u32,
    label: String,
}

impl Described for Frozen {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::new(RawType::of::<Frozen>(), Vec::new(), || {
            Shape::record(
                RecordInfo::builder::<Frozen>()
                    .read_only_field::<u32>("id", |f| f.id)
                    .field::<String>("label", |f| f.label.clone(), |f, v| f.label = v)
                    .build(|values: &mut FieldValues| {
                        Ok(Frozen {
                            id: values.take("id")?,
                            label: values.take("label")?,
                        })
                    }),
            )
        })
    }
}

#[test]
fn test_correct_type_passes() {
    let report = EqualsVerifier::for_type::<Q>().report().unwrap();
    assert!(report.is_successful(), "{}", report.message());
    EqualsVerifier::for_type::<Q>().verify().unwrap();
}

#[test]
fn test_zero_field_type_passes() {
    EqualsVerifier::for_type::<Empty>().verify().unwrap();
}

#[test]
fn test_hash_on_more_fields_than_eq_breaks_hash_agreement() {
    let report = EqualsVerifier::for_type::<P>().report().unwrap();
    assert!(!report.is_successful());
    assert!(report.violates(Axiom::HashAgreement));
    assert_eq!(report.violations().count(), 1);

    match EqualsVerifier::for_type::<P>().verify() {
        Err(VerifierError::ContractViolation { message }) => {
            assert!(message.contains("Hash agreement"));
            assert!(message.contains("P"));
        }
        other => panic!("expected a contract violation, got {:?}", other),
    }
}

#[test]
fn test_exhaustive_mode_reports_every_axiom() {
    let report = EqualsVerifier::for_type::<P>().mode(Mode::Exhaustive).report().unwrap();
    assert!(report.violates(Axiom::HashAgreement));
    assert!(report.violates(Axiom::SignificantFields));
    assert_eq!(report.results.len(), Axiom::ALL.len());
}

#[test]
fn test_identity_equality_breaks_reflexivity() {
    let report = EqualsVerifier::for_type::<R>().report().unwrap();
    assert!(report.violates(Axiom::Reflexivity));
    let violation = report.violations().next().unwrap();
    assert!(violation.message.contains("identical copy"));
    assert!(violation.hint.is_some());
}

#[test]
fn test_or_combined_fields_break_transitivity() {
    let report = EqualsVerifier::for_type::<Either>()
        .suppress(&[Axiom::SignificantFields])
        .report()
        .unwrap();
    assert!(report.violates(Axiom::Transitivity));
    let message = report.message();
    assert!(message.contains("two of these three instances are equal to each other, so the third one should be, too"));
}

#[test]
fn test_ordering_eq_breaks_symmetry() {
    let report = EqualsVerifier::for_type::<Lenient>().report().unwrap();
    assert!(report.violates(Axiom::Symmetry));
    assert!(report.message().contains("a == b is true but b == a is false"));
}

#[test]
fn test_changing_verdict_breaks_consistency() {
    let report = EqualsVerifier::for_type::<Flaky>().mode(Mode::Exhaustive).report().unwrap();
    assert!(report.violates(Axiom::Consistency));
    assert!(report.message().contains("eq changes its verdict between calls on unchanged instances"));
}

#[test]
fn test_panicking_eq_breaks_non_nullity() {
    let report = EqualsVerifier::for_type::<Named>().report().unwrap();
    assert!(report.violates(Axiom::NonNullity));
    assert_eq!(report.violations().next().unwrap().fields, vec!["name".to_string()]);

    EqualsVerifier::for_type::<Named>()
        .with_nonnull_fields(&["name"])
        .verify()
        .unwrap();
}

#[test]
fn test_unused_field_must_be_ignored() {
    let report = EqualsVerifier::for_type::<Counted>().report().unwrap();
    assert!(report.violates(Axiom::SignificantFields));
    assert!(report.message().contains("eq does not use reads, or it is stateless"));

    EqualsVerifier::for_type::<Counted>()
        .with_ignored_fields(&["reads"])
        .verify()
        .unwrap();
    EqualsVerifier::for_type::<Counted>()
        .with_only_these_fields(&["id"])
        .verify()
        .unwrap();
}

#[test]
fn test_ignoring_a_used_field_is_reported() {
    let report = EqualsVerifier::for_type::<Q>().with_ignored_fields(&["y"]).report().unwrap();
    assert!(report.violates(Axiom::SignificantFields));
    assert!(report.message().contains("eq should not use y, but it does"));
}

#[test]
fn test_suppressed_axioms_are_skipped() {
    let report = EqualsVerifier::for_type::<P>()
        .suppress(&[Axiom::HashAgreement, Axiom::SignificantFields])
        .report()
        .unwrap();
    assert!(report.is_successful(), "{}", report.message());
}

#[test]
fn test_cached_hash() {
    let uncached = EqualsVerifier::for_type::<Tagged>().report().unwrap();
    assert!(uncached.violates(Axiom::HashAgreement));

    EqualsVerifier::for_type::<Tagged>()
        .with_cached_hash(CachedHash::new("hash", Tagged::recompute, Tagged::new("example")))
        .verify()
        .unwrap();

    let stale = Tagged {
        name: "example".to_string(),
        hash: 0,
    };
    let report = EqualsVerifier::for_type::<Tagged>()
        .with_cached_hash(CachedHash::new("hash", Tagged::recompute, stale))
        .report()
        .unwrap();
    assert!(report.violates(Axiom::CachedHash));
}

#[test]
fn test_relaxed_equal_examples() {
    EqualsVerifier::for_relaxed_equal_examples(
        Fraction { num: 1, den: 2 },
        Fraction { num: 2, den: 4 },
        vec![Fraction { num: 3, den: 6 }],
    )
    .and_unequal_example(Fraction { num: 1, den: 3 })
    .verify()
    .unwrap();
}

#[test]
fn test_relaxed_examples_must_be_equal() {
    let result = EqualsVerifier::for_relaxed_equal_examples(
        Fraction { num: 1, den: 2 },
        Fraction { num: 1, den: 3 },
        Vec::new(),
    )
    .and_unequal_example(Fraction { num: 5, den: 1 })
    .report();
    assert!(matches!(result, Err(VerifierError::Precondition { .. })));
}

#[test]
fn test_unequal_examples() {
    EqualsVerifier::for_examples(Q { x: 1, y: 2 }, Q { x: 3, y: 4 }, vec![Q { x: 5, y: 6 }])
        .verify()
        .unwrap();

    let duplicate = EqualsVerifier::for_examples(Q { x: 1, y: 2 }, Q { x: 1, y: 2 }, Vec::new()).report();
    assert!(matches!(duplicate, Err(VerifierError::Precondition { .. })));
}

#[test]
fn test_read_only_fields_are_changed_by_reconstruction() {
    EqualsVerifier::for_type::<Frozen>().verify().unwrap();
}

#[test]
fn test_configuration_preconditions() {
    let both = EqualsVerifier::for_type::<Q>()
        .with_ignored_fields(&["x"])
        .with_only_these_fields(&["y"])
        .report();
    assert!(matches!(both, Err(VerifierError::Precondition { .. })));

    let unknown = EqualsVerifier::for_type::<Q>().with_ignored_fields(&["z"]).report();
    assert!(matches!(unknown, Err(VerifierError::Precondition { .. })));

    let equal_prefab = EqualsVerifier::for_type::<Q>().with_prefab_values(1i32, 1i32).report();
    assert!(matches!(equal_prefab, Err(VerifierError::Precondition { .. })));
}

#[test]
fn test_report_serializes() {
    let report = EqualsVerifier::for_type::<P>().report().unwrap();
    let json = report.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["type_name"], "P");
}
