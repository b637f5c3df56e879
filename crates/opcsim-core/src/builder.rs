//! Construction of the simulated device tree.
//!
//! [`AddressSpaceBuilder::build`] populates a namespace with two folders
//! under `Objects`:
//!
//! ```text
//! Objects
//! ├── MyDevice
//! │   ├── Temperature              computed, base + 10 * sin(ms)
//! │   ├── MyVariable2              static string, read-only
//! │   ├── MyVariable3              static Double[3], read/write
//! │   └── Percentage Memory Used   computed from the memory probe
//! └── Simulator
//!     └── Simulator.Default.Device1.*   eleven store-backed variables
//! ```
//!
//! Every variable, whatever its kind, is registered through
//! [`VariableBinder::bind`].

use std::sync::Arc;

use opcsim_types::{
    AccessLevel, Array, DataType, NodeId, Scalar, ValueShape, Variant, VariableDescriptor,
    VariantKind,
};
use tracing::info;

use crate::accessor::{AccessError, VariableKind};
use crate::binder::{BindError, VariableBinder};
use crate::config::AddressSpaceConfig;
use crate::namespace::{Namespace, NamespaceError};
use crate::probe::{Clock, MemoryProbe};
use crate::store::VariantStore;

/// Node id of the memory usage variable (`b=1020ffab`).
pub const MEMORY_USED_NODE: [u8; 4] = [0x10, 0x20, 0xff, 0xab];

/// Prefix shared by every identifier in the `Simulator` folder.
pub const SIMULATOR_PREFIX: &str = "Simulator.Default.Device1";

/// Amplitude of the temperature oscillation around its base.
const TEMPERATURE_AMPLITUDE: f64 = 10.0;

const DOUBLE_SCALAR: VariantKind = VariantKind {
    data_type: DataType::Double,
    shape: ValueShape::Scalar,
};

/// Errors raised while building the device tree.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A folder could not be created.
    #[error("failed to create folder {name}: {source}")]
    Folder {
        /// Browse name of the folder.
        name: &'static str,
        /// The underlying namespace error.
        source: NamespaceError,
    },

    /// A variable could not be bound.
    #[error("failed to bind {name}: {source}")]
    Bind {
        /// Browse name of the variable.
        name: String,
        /// The underlying bind error.
        source: BindError,
    },
}

/// Ids of the nodes created by [`AddressSpaceBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNodes {
    /// The `MyDevice` folder.
    pub device: NodeId,
    /// The `Simulator` folder.
    pub simulator: NodeId,
    /// The computed `Temperature` variable.
    pub temperature: NodeId,
    /// The static read-only `MyVariable2` string.
    pub banner: NodeId,
    /// The static writable `MyVariable3` array.
    pub vector: NodeId,
    /// The computed `Percentage Memory Used` variable.
    pub memory_used: NodeId,
    /// Store-backed variables in the `Simulator` folder, in bind order.
    pub simulated: Vec<NodeId>,
}

/// The temperature reading at the given millisecond of the clock.
///
/// The millisecond is taken as radians, so consecutive readings swing
/// across the whole `[base - 10, base + 10]` range.
pub fn temperature_at(base: f64, millisecond: u32) -> f64 {
    TEMPERATURE_AMPLITUDE.mul_add(f64::from(millisecond).sin(), base)
}

/// Percentage of memory in use, or `None` if `total` is zero.
#[allow(clippy::cast_precision_loss)]
pub fn memory_used_percent(free: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let ratio = free as f64 / total as f64;
    Some((1.0 - ratio) * 100.0)
}

/// Builds the device tree into a namespace.
pub struct AddressSpaceBuilder {
    binder: VariableBinder,
    clock: Arc<dyn Clock>,
    memory: Arc<dyn MemoryProbe>,
    config: AddressSpaceConfig,
}

impl AddressSpaceBuilder {
    /// Create a builder binding store-backed variables into `store`.
    pub fn new(
        store: VariantStore,
        clock: Arc<dyn Clock>,
        memory: Arc<dyn MemoryProbe>,
        config: AddressSpaceConfig,
    ) -> Self {
        let binder = VariableBinder::new(store).with_sampling_interval(config.sampling_interval_ms);
        Self {
            binder,
            clock,
            memory,
            config,
        }
    }

    /// Populate `namespace` with the device and simulator folders.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] naming the first node that could not be
    /// registered.
    pub fn build(&self, namespace: &mut dyn Namespace) -> Result<DeviceNodes, BuildError> {
        let objects = NodeId::OBJECTS_FOLDER;

        let device = add_folder(namespace, &objects, "MyDevice")?;
        let temperature = self.bind_temperature(namespace, &device)?;
        let banner = self.bind_banner(namespace, &device)?;
        let vector = self.bind_vector(namespace, &device)?;
        let memory_used = self.bind_memory_used(namespace, &device)?;

        let simulator = add_folder(namespace, &objects, "Simulator")?;
        let simulated = self.bind_simulator(namespace, &simulator)?;

        info!(
            device = %device,
            simulator = %simulator,
            simulated = simulated.len(),
            "address space constructed"
        );

        Ok(DeviceNodes {
            device,
            simulator,
            temperature,
            banner,
            vector,
            memory_used,
            simulated,
        })
    }

    fn bind_temperature(
        &self,
        namespace: &mut dyn Namespace,
        device: &NodeId,
    ) -> Result<NodeId, BuildError> {
        let descriptor = VariableDescriptor::new(NodeId::string("Temperature"), "Temperature", DOUBLE_SCALAR)
            .with_sampling_interval(self.config.sampling_interval_ms);
        let clock = Arc::clone(&self.clock);
        let base = self.config.temperature_base;
        let kind = VariableKind::computed(move || {
            Ok(Scalar::Double(temperature_at(base, clock.millisecond())).into())
        });
        self.bind(namespace, device, descriptor, kind)
    }

    fn bind_banner(
        &self,
        namespace: &mut dyn Namespace,
        device: &NodeId,
    ) -> Result<NodeId, BuildError> {
        let value = Variant::Scalar(Scalar::String(self.config.banner.clone()));
        let node_id = namespace.allocate_numeric_id();
        let descriptor = VariableDescriptor::new(node_id, "MyVariable2", value.kind());
        self.bind(namespace, device, descriptor, VariableKind::Static(value))
    }

    fn bind_vector(
        &self,
        namespace: &mut dyn Namespace,
        device: &NodeId,
    ) -> Result<NodeId, BuildError> {
        let value = Variant::Array(Array::Double(vec![1.0, 2.0, 3.0]));
        let node_id = namespace.allocate_numeric_id();
        let descriptor = VariableDescriptor::new(node_id, "MyVariable3", value.kind())
            .with_access(AccessLevel::READ_WRITE)
            .with_array_dimensions(vec![3]);
        self.bind(namespace, device, descriptor, VariableKind::Static(value))
    }

    fn bind_memory_used(
        &self,
        namespace: &mut dyn Namespace,
        device: &NodeId,
    ) -> Result<NodeId, BuildError> {
        let descriptor = VariableDescriptor::new(
            NodeId::Opaque(MEMORY_USED_NODE.to_vec()),
            "Percentage Memory Used",
            DOUBLE_SCALAR,
        )
        .with_sampling_interval(self.config.memory_sampling_interval_ms);
        let memory = Arc::clone(&self.memory);
        let kind = VariableKind::computed(move || {
            let free = memory
                .free_memory()
                .map_err(|e| AccessError::Source(e.to_string()))?;
            let total = memory
                .total_memory()
                .map_err(|e| AccessError::Source(e.to_string()))?;
            let percent = memory_used_percent(free, total)
                .ok_or_else(|| AccessError::Source(String::from("total memory reported as zero")))?;
            Ok(Scalar::Double(percent).into())
        });
        self.bind(namespace, device, descriptor, kind)
    }

    fn bind_simulator(
        &self,
        namespace: &mut dyn Namespace,
        simulator: &NodeId,
    ) -> Result<Vec<NodeId>, BuildError> {
        let scalars: [(&str, Scalar); 8] = [
            ("FLOAT1", Scalar::Double(1.0)),
            ("FLOAT2", Scalar::Double(2.0)),
            ("INT1", Scalar::Int32(1)),
            ("INT2", Scalar::Int32(2)),
            ("BOOLEAN1", Scalar::Boolean(true)),
            ("BOOLEAN2", Scalar::Boolean(false)),
            ("STRING1", Scalar::from("StringA")),
            ("STRING2", Scalar::from("StringB")),
        ];
        let arrays: [(&str, Array); 3] = [
            ("FLOAT_ARRAY1", Array::Double(vec![1.0, 2.0, 3.0])),
            ("INT_ARRAY1", Array::Int32(vec![1, 2, 3])),
            ("BOOLEAN_ARRAY1", Array::Boolean(vec![true, false, true])),
        ];

        let mut bound = Vec::with_capacity(scalars.len().saturating_add(arrays.len()));
        for (suffix, initial) in scalars {
            let identifier = format!("{SIMULATOR_PREFIX}.{suffix}");
            let id = self
                .binder
                .bind_scalar(namespace, simulator, &identifier, initial)
                .map_err(|source| BuildError::Bind {
                    name: identifier.clone(),
                    source,
                })?;
            bound.push(id);
        }
        for (suffix, initial) in arrays {
            let identifier = format!("{SIMULATOR_PREFIX}.{suffix}");
            let id = self
                .binder
                .bind_array(namespace, simulator, &identifier, initial)
                .map_err(|source| BuildError::Bind {
                    name: identifier.clone(),
                    source,
                })?;
            bound.push(id);
        }
        Ok(bound)
    }

    fn bind(
        &self,
        namespace: &mut dyn Namespace,
        parent: &NodeId,
        descriptor: VariableDescriptor,
        kind: VariableKind,
    ) -> Result<NodeId, BuildError> {
        let name = descriptor.browse_name.clone();
        self.binder
            .bind(namespace, parent, descriptor, kind)
            .map_err(|source| BuildError::Bind { name, source })
    }
}

fn add_folder(
    namespace: &mut dyn Namespace,
    parent: &NodeId,
    name: &'static str,
) -> Result<NodeId, BuildError> {
    namespace
        .add_folder(parent, name)
        .map_err(|source| BuildError::Folder { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_stays_within_amplitude() {
        for ms in 0..1000 {
            let t = temperature_at(10.0, ms);
            assert!((0.0..=20.0).contains(&t), "ms={ms} t={t}");
        }
    }

    #[test]
    fn temperature_at_zero_is_base() {
        assert!((temperature_at(10.0, 0) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn memory_percent_from_free_and_total() {
        let percent = memory_used_percent(250, 1000).unwrap_or_default();
        assert!((percent - 75.0).abs() < 1e-9);
        assert!(memory_used_percent(0, 0).is_none());
    }
}
