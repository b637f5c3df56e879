//! Integration tests for the device tree built by `AddressSpaceBuilder`.
//!
//! Each test builds the full address space against a fixed clock and a
//! fixed memory probe, then drives it through the same read/write
//! dispatch a client request would use.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use opcsim_core::accessor::VariableKind;
use opcsim_core::binder::VariableBinder;
use opcsim_core::builder::{AddressSpaceBuilder, DeviceNodes, SIMULATOR_PREFIX, temperature_at};
use opcsim_core::config::AddressSpaceConfig;
use opcsim_core::namespace::{AddressSpace, Namespace, NodeClass};
use opcsim_core::probe::{Clock, MemoryProbe, ProbeError};
use opcsim_core::store::VariantStore;
use opcsim_types::{
    AccessLevel, Array, Category, DataType, NodeId, Scalar, StatusCode, ValueShape, Variant,
    VariableDescriptor,
};

/// Clock whose millisecond is set by the test.
#[derive(Default)]
struct FixedClock {
    millisecond: AtomicU32,
}

impl FixedClock {
    fn set(&self, ms: u32) {
        self.millisecond.store(ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn millisecond(&self) -> u32 {
        self.millisecond.load(Ordering::SeqCst)
    }
}

/// Memory probe reporting fixed figures.
struct FixedMemory {
    free: u64,
    total: u64,
}

impl MemoryProbe for FixedMemory {
    fn free_memory(&self) -> Result<u64, ProbeError> {
        Ok(self.free)
    }

    fn total_memory(&self) -> Result<u64, ProbeError> {
        Ok(self.total)
    }
}

struct Fixture {
    space: AddressSpace,
    store: VariantStore,
    clock: Arc<FixedClock>,
    nodes: DeviceNodes,
}

fn build_with_memory(free: u64, total: u64) -> Fixture {
    let store = VariantStore::new();
    let clock = Arc::new(FixedClock::default());
    let memory = Arc::new(FixedMemory { free, total });
    let builder = AddressSpaceBuilder::new(
        store.clone(),
        Arc::clone(&clock) as Arc<dyn Clock>,
        memory,
        AddressSpaceConfig::default(),
    );

    let mut space = AddressSpace::new();
    let nodes = builder.build(&mut space).unwrap();
    Fixture {
        space,
        store,
        clock,
        nodes,
    }
}

fn build() -> Fixture {
    build_with_memory(4 * 1024, 16 * 1024)
}

fn sim(suffix: &str) -> NodeId {
    NodeId::string(format!("{SIMULATOR_PREFIX}.{suffix}"))
}

fn read_value(space: &AddressSpace, id: &NodeId) -> Variant {
    let data_value = space.read(id);
    assert_eq!(data_value.status, StatusCode::Good, "read {id}");
    data_value.value.unwrap()
}

// =========================================================================
// Tree layout
// =========================================================================

#[test]
fn objects_holds_device_then_simulator() {
    let f = build();
    let refs = f.space.browse(&NodeId::OBJECTS_FOLDER).unwrap();
    let names: Vec<&str> = refs.iter().map(|r| r.browse_name.as_str()).collect();
    assert_eq!(names, vec!["MyDevice", "Simulator"]);
    assert!(refs.iter().all(|r| r.node_class == NodeClass::Folder));
}

#[test]
fn device_folder_holds_four_variables() {
    let f = build();
    let refs = f.space.browse(&f.nodes.device).unwrap();
    let names: Vec<&str> = refs.iter().map(|r| r.browse_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Temperature", "MyVariable2", "MyVariable3", "Percentage Memory Used"]
    );
    assert_eq!(f.nodes.temperature, NodeId::string("Temperature"));
    assert_eq!(f.nodes.memory_used.to_string(), "b=1020ffab");
}

#[test]
fn simulator_folder_holds_eleven_store_backed_variables() {
    let f = build();
    let refs = f.space.browse(&f.nodes.simulator).unwrap();
    assert_eq!(refs.len(), 11);
    assert_eq!(f.nodes.simulated.len(), 11);
    // Only simulator variables live in the store.
    assert_eq!(f.store.len(), 11);
    for id in &f.nodes.simulated {
        assert!(f.store.contains(id), "{id} missing from store");
        let meta = f.space.variable(id).unwrap();
        assert_eq!(meta.access_level, AccessLevel::READ_WRITE);
        assert_eq!(meta.minimum_sampling_interval_ms, 500);
    }
    assert_eq!(f.space.variable_count(), 15);
}

#[test]
fn simulator_categories_follow_classifier() {
    let f = build();
    let expect = [
        ("FLOAT1", Category::Double, -1),
        ("INT2", Category::Integer, -1),
        ("BOOLEAN1", Category::Boolean, -1),
        ("STRING2", Category::String, -1),
        ("FLOAT_ARRAY1", Category::Double, 1),
        ("INT_ARRAY1", Category::Integer, 1),
        ("BOOLEAN_ARRAY1", Category::Boolean, 1),
    ];
    for (suffix, category, rank) in expect {
        let meta = f.space.variable(&sim(suffix)).unwrap();
        assert_eq!(meta.data_type, category, "{suffix}");
        assert_eq!(meta.value_rank, rank, "{suffix}");
    }
}

// =========================================================================
// Store-backed variables
// =========================================================================

#[test]
fn initial_scalars_are_readable() {
    let f = build();
    assert_eq!(read_value(&f.space, &sim("FLOAT2")), Variant::Scalar(Scalar::Double(2.0)));
    assert_eq!(read_value(&f.space, &sim("INT1")), Variant::Scalar(Scalar::Int32(1)));
    assert_eq!(
        read_value(&f.space, &sim("BOOLEAN2")),
        Variant::Scalar(Scalar::Boolean(false))
    );
    assert_eq!(
        read_value(&f.space, &sim("STRING1")),
        Variant::Scalar(Scalar::from("StringA"))
    );
}

#[test]
fn initial_arrays_are_readable() {
    let f = build();
    let value = read_value(&f.space, &sim("FLOAT_ARRAY1"));
    assert_eq!(value.shape(), ValueShape::Array);
    assert_eq!(value, Variant::Array(Array::Double(vec![1.0, 2.0, 3.0])));
    assert_eq!(
        read_value(&f.space, &sim("BOOLEAN_ARRAY1")),
        Variant::Array(Array::Boolean(vec![true, false, true]))
    );
}

#[test]
fn int1_write_then_read() {
    let f = build();
    let id = sim("INT1");
    assert_eq!(f.space.write(&id, Scalar::Int32(42).into()), StatusCode::Good);
    assert_eq!(read_value(&f.space, &id), Variant::Scalar(Scalar::Int32(42)));
    assert_eq!(f.store.get(&id).unwrap(), Variant::Scalar(Scalar::Int32(42)));
}

#[test]
fn last_write_wins() {
    let f = build();
    let id = sim("FLOAT1");
    for v in [3.0, -1.5, 1e6, 0.25] {
        assert_eq!(f.space.write(&id, Scalar::Double(v).into()), StatusCode::Good);
    }
    assert_eq!(read_value(&f.space, &id), Variant::Scalar(Scalar::Double(0.25)));
}

#[test]
fn writes_do_not_cross_contaminate() {
    let f = build();
    let before: Vec<(NodeId, Variant)> = f
        .nodes
        .simulated
        .iter()
        .map(|id| (id.clone(), f.store.get(id).unwrap()))
        .collect();

    let target = sim("STRING2");
    assert_eq!(
        f.space.write(&target, Scalar::from("changed").into()),
        StatusCode::Good
    );

    for (id, value) in before {
        if id == target {
            continue;
        }
        assert_eq!(f.store.get(&id).unwrap(), value, "{id} changed");
    }
}

#[test]
fn mismatched_write_is_refused_and_value_kept() {
    let f = build();
    let id = sim("INT_ARRAY1");
    assert_eq!(
        f.space.write(&id, Scalar::Int32(1).into()),
        StatusCode::BadTypeMismatch
    );
    assert_eq!(
        f.space.write(&id, Array::Double(vec![1.0]).into()),
        StatusCode::BadTypeMismatch
    );
    assert_eq!(
        read_value(&f.space, &id),
        Variant::Array(Array::Int32(vec![1, 2, 3]))
    );
}

#[test]
fn array_write_may_change_length() {
    let f = build();
    let id = sim("FLOAT_ARRAY1");
    let longer = Variant::Array(Array::Double(vec![9.0, 8.0, 7.0, 6.0]));
    assert_eq!(f.space.write(&id, longer.clone()), StatusCode::Good);
    assert_eq!(read_value(&f.space, &id), longer);
}

// =========================================================================
// Computed variables
// =========================================================================

#[test]
fn temperature_is_recomputed_from_clock() {
    let f = build();
    let id = &f.nodes.temperature;

    f.clock.set(0);
    let at_zero = read_value(&f.space, id).as_f64().unwrap();
    f.clock.set(1);
    let at_one = read_value(&f.space, id).as_f64().unwrap();

    assert!((at_zero - 10.0).abs() < 1e-12);
    assert!((at_one - temperature_at(10.0, 1)).abs() < 1e-12);
    assert!((at_zero - at_one).abs() > 1.0);
}

#[test]
fn temperature_is_deterministic_within_a_millisecond() {
    let f = build();
    f.clock.set(123);
    let first = read_value(&f.space, &f.nodes.temperature);
    let second = read_value(&f.space, &f.nodes.temperature);
    assert_eq!(first, second);
}

#[test]
fn temperature_stays_in_range_across_clock() {
    let f = build();
    for ms in (0..1000).step_by(7) {
        f.clock.set(ms);
        let t = read_value(&f.space, &f.nodes.temperature).as_f64().unwrap();
        assert!((0.0..=20.0).contains(&t), "ms={ms} t={t}");
    }
}

#[test]
fn temperature_is_read_only() {
    let f = build();
    assert_eq!(
        f.space.write(&f.nodes.temperature, Scalar::Double(1.0).into()),
        StatusCode::BadNotWritable
    );
}

#[test]
fn memory_used_is_percent_of_total() {
    let f = build_with_memory(1024, 4096);
    let percent = read_value(&f.space, &f.nodes.memory_used).as_f64().unwrap();
    assert!((percent - 75.0).abs() < 1e-9);
    let meta = f.space.variable(&f.nodes.memory_used).unwrap();
    assert_eq!(meta.minimum_sampling_interval_ms, 1000);
}

#[test]
fn zero_total_memory_fails_only_that_read() {
    let f = build_with_memory(0, 0);
    let data_value = f.space.read(&f.nodes.memory_used);
    assert_eq!(data_value.status, StatusCode::BadInternalError);
    assert!(data_value.value.is_none());
    // Other variables keep serving.
    assert_eq!(read_value(&f.space, &sim("INT2")), Variant::Scalar(Scalar::Int32(2)));
}

// =========================================================================
// Static variables
// =========================================================================

#[test]
fn banner_is_fixed_string() {
    let f = build();
    let value = read_value(&f.space, &f.nodes.banner);
    assert_eq!(value.data_type(), DataType::String);
    assert!(value.to_string().starts_with("Learn Node-OPCUA"));
    assert_eq!(
        f.space.write(&f.nodes.banner, Scalar::from("other").into()),
        StatusCode::BadNotWritable
    );
    assert!(matches!(f.nodes.banner, NodeId::Numeric(_)));
}

#[test]
fn vector_is_writable_without_touching_store() {
    let f = build();
    let next = Variant::Array(Array::Double(vec![4.0, 5.0, 6.0]));
    assert_eq!(f.space.write(&f.nodes.vector, next.clone()), StatusCode::Good);
    assert_eq!(read_value(&f.space, &f.nodes.vector), next);
    assert!(!f.store.contains(&f.nodes.vector));
    assert_eq!(f.store.len(), 11);

    let meta = f.space.variable(&f.nodes.vector).unwrap();
    assert_eq!(meta.array_dimensions, Some(vec![3]));
    assert_eq!(meta.value_rank, 1);
}

#[test]
fn vector_rejects_length_change() {
    let f = build();
    let short = Variant::Array(Array::Double(vec![1.0]));
    assert_eq!(
        f.space.write(&f.nodes.vector, short),
        StatusCode::BadTypeMismatch
    );
    assert_eq!(
        read_value(&f.space, &f.nodes.vector),
        Variant::Array(Array::Double(vec![1.0, 2.0, 3.0]))
    );
}

// =========================================================================
// Binder against an existing tree
// =========================================================================

#[test]
fn scalar_bind_round_trips_for_each_category() {
    let mut space = AddressSpace::new();
    let parent = space.add_folder(&NodeId::OBJECTS_FOLDER, "Extra").unwrap();
    let binder = VariableBinder::new(VariantStore::new());

    let cases = [
        ("B", Scalar::Boolean(true)),
        ("I", Scalar::Int32(-7)),
        ("D", Scalar::Double(2.5)),
        ("S", Scalar::from("text")),
    ];
    for (name, value) in cases {
        let id = binder
            .bind_scalar(&mut space, &parent, name, value.clone())
            .unwrap();
        assert_eq!(binder.store().get(&id).unwrap(), Variant::Scalar(value));
    }
}

#[test]
fn static_kind_through_uniform_bind() {
    let mut space = AddressSpace::new();
    let binder = VariableBinder::new(VariantStore::new());
    let value = Variant::Scalar(Scalar::Int64(1 << 40));
    let descriptor = VariableDescriptor::new(NodeId::Numeric(5000), "Wide", value.kind());
    let id = binder
        .bind(
            &mut space,
            &NodeId::OBJECTS_FOLDER,
            descriptor,
            VariableKind::Static(value.clone()),
        )
        .unwrap();
    assert_eq!(read_value(&space, &id), value);
    assert!(binder.store().is_empty());
}
