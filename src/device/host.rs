use super::{Capability, Device, DeviceError, NdRange, WorkItem};
use crate::config::DeviceConfig;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-process device that runs work-groups on a pool of scoped threads.
#[derive(Debug, Clone)]
pub struct HostDevice {
    threads: usize,
    max_work_group_size: usize,
    sub_group_size: Option<usize>,
    fp64: bool,
    atomic64: bool,
}

impl HostDevice {
    /// Create a host device with default settings.
    pub fn new() -> Self {
        Self::from_config(&DeviceConfig::default())
    }

    /// Create a host device from configuration.
    ///
    /// A thread count of zero means one thread per available CPU.
    pub fn from_config(config: &DeviceConfig) -> Self {
        let threads = if config.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            config.threads
        };

        Self {
            threads,
            max_work_group_size: config.max_work_group_size,
            sub_group_size: config.sub_group_size,
            fp64: config.fp64,
            atomic64: config.atomic64,
        }
    }

    /// Number of worker threads used per launch.
    pub fn threads(&self) -> usize {
        self.threads
    }
}

impl Default for HostDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for HostDevice {
    fn name(&self) -> &str {
        "host"
    }

    fn is_available(&self) -> bool {
        self.threads > 0 && self.max_work_group_size > 0
    }

    fn validate(&self) -> Result<(), DeviceError> {
        if !self.is_available() {
            return Err(DeviceError::Unavailable(format!(
                "host device needs at least one thread and a non-zero work-group limit \
                 (threads = {}, max work-group size = {})",
                self.threads, self.max_work_group_size
            )));
        }

        if let Some(width) = self.sub_group_size {
            if width == 0 || self.max_work_group_size % width != 0 {
                return Err(DeviceError::Unavailable(format!(
                    "sub-group size {width} does not divide max work-group size {}",
                    self.max_work_group_size
                )));
            }
        }

        Ok(())
    }

    fn has(&self, cap: Capability) -> bool {
        match cap {
            Capability::Fp64 => self.fp64,
            Capability::Atomic64 => self.atomic64,
            Capability::SubGroups => self.sub_group_size.is_some(),
        }
    }

    fn max_work_group_size(&self) -> usize {
        self.max_work_group_size
    }

    fn sub_group_size(&self) -> Option<usize> {
        self.sub_group_size
    }

    fn launch(&self, range: NdRange, kernel: &(dyn Fn(WorkItem) + Sync)) -> Result<(), DeviceError> {
        let groups = range.groups().ok_or(DeviceError::InvalidWorkGroup {
            global: range.global,
            local: range.local,
        })?;

        if range.local > self.max_work_group_size {
            return Err(DeviceError::WorkGroupTooLarge {
                local: range.local,
                max: self.max_work_group_size,
            });
        }

        tracing::trace!(
            global = range.global,
            local = range.local,
            groups,
            "host launch"
        );

        let next_group = AtomicUsize::new(0);
        let workers = self.threads.min(groups).max(1);

        // Work-groups are claimed dynamically; all workers are joined when the scope ends.
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let group_id = next_group.fetch_add(1, Ordering::Relaxed);
                        if group_id >= groups {
                            break;
                        }
                        for local_id in 0..range.local {
                            kernel(WorkItem {
                                global_id: group_id * range.local + local_id,
                                local_id,
                                group_id,
                            });
                        }
                    }
                });
            }
        });

        Ok(())
    }
}
