//! Device trait: the interface through which tests reach the runtime under test.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod host;

pub use host::HostDevice;

/// Optional device features a test may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Double-precision floating point.
    Fp64,
    /// 64-bit atomic operations.
    Atomic64,
    /// Sub-group partitioning of work-groups.
    SubGroups,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 3] = [Capability::Fp64, Capability::Atomic64, Capability::SubGroups];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Capability::Fp64 => "fp64",
            Capability::Atomic64 => "atomic64",
            Capability::SubGroups => "sub-groups",
        };
        f.write_str(s)
    }
}

/// Errors reported by a device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The local size is zero or does not divide the global size.
    #[error("invalid work-group size {local} for global range {global}")]
    InvalidWorkGroup { global: usize, local: usize },

    /// The local size exceeds what the device supports.
    #[error("work-group size {local} exceeds device maximum {max}")]
    WorkGroupTooLarge { local: usize, max: usize },

    /// The operation needs a capability the device lacks.
    #[error("capability {0} is not supported")]
    Unsupported(Capability),

    /// The device cannot be used at all.
    #[error("device unavailable: {0}")]
    Unavailable(String),
}

/// Index space of a kernel launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdRange {
    /// Total number of work-items.
    pub global: usize,
    /// Work-items per work-group.
    pub local: usize,
}

impl NdRange {
    /// Create a range.
    pub fn new(global: usize, local: usize) -> Self {
        Self { global, local }
    }

    /// Number of work-groups, if the range is well formed.
    pub fn groups(&self) -> Option<usize> {
        if self.local == 0 || self.global % self.local != 0 {
            None
        } else {
            Some(self.global / self.local)
        }
    }
}

/// Position of one work-item within a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItem {
    pub global_id: usize,
    pub local_id: usize,
    pub group_id: usize,
}

/// A device that can execute data-parallel kernels.
pub trait Device: Send + Sync {
    /// Human-readable device name.
    fn name(&self) -> &str;

    /// Check if the device can be used on this system.
    fn is_available(&self) -> bool;

    /// Verify the device is usable before any test runs.
    fn validate(&self) -> Result<(), DeviceError> {
        if !self.is_available() {
            return Err(DeviceError::Unavailable(format!(
                "{} is not available on this system",
                self.name()
            )));
        }
        Ok(())
    }

    /// Whether the device supports `cap`.
    fn has(&self, cap: Capability) -> bool;

    /// Largest supported work-group size.
    fn max_work_group_size(&self) -> usize;

    /// Sub-group width, when sub-groups are supported.
    fn sub_group_size(&self) -> Option<usize>;

    /// Run `kernel` once per work-item in `range`. Blocks until every
    /// work-item has finished.
    fn launch(&self, range: NdRange, kernel: &(dyn Fn(WorkItem) + Sync)) -> Result<(), DeviceError>;

    /// Fail with [`DeviceError::Unsupported`] unless `cap` is present.
    fn require(&self, cap: Capability) -> Result<(), DeviceError> {
        if self.has(cap) {
            Ok(())
        } else {
            Err(DeviceError::Unsupported(cap))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nd_range_groups() {
        assert_eq!(NdRange::new(64, 16).groups(), Some(4));
        assert_eq!(NdRange::new(64, 0).groups(), None);
        assert_eq!(NdRange::new(65, 16).groups(), None);
        assert_eq!(NdRange::new(0, 4).groups(), Some(0));
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::Fp64.to_string(), "fp64");
        assert_eq!(Capability::SubGroups.to_string(), "sub-groups");
    }

    #[test]
    fn test_capability_deserialize_kebab() {
        let cap: Capability = serde_plain::from_str("atomic64").unwrap();
        assert_eq!(cap, Capability::Atomic64);
        let cap: Capability = serde_plain::from_str("sub-groups").unwrap();
        assert_eq!(cap, Capability::SubGroups);
    }

    #[test]
    fn test_device_error_display() {
        assert_eq!(
            DeviceError::InvalidWorkGroup {
                global: 10,
                local: 3
            }
            .to_string(),
            "invalid work-group size 3 for global range 10"
        );
    }
}
