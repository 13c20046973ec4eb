//! Malformed launch ranges must be rejected with the matching error.

use crate::case::{CaseResult, TestCase, TestDescriptor};
use crate::core::context::TestEnv;
use crate::device::{DeviceError, NdRange, WorkItem};
use crate::logger::Logger;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct WorkGroupErrors;

impl TestCase for WorkGroupErrors {
    fn descriptor(&self) -> TestDescriptor {
        crate::test_descriptor!("work_group_errors")
    }

    fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult {
        let device = env.device();
        let max = device.max_work_group_size();
        let executed = AtomicUsize::new(0);
        let kernel = |_: WorkItem| {
            executed.fetch_add(1, Ordering::Relaxed);
        };

        let zero = NdRange::new(64, 0);
        expect_rejected(log, "zero local size", device.launch(zero, &kernel), |e| {
            *e == DeviceError::InvalidWorkGroup { global: 64, local: 0 }
        });

        // With a limit of 1 every in-bounds local size divides the range.
        if max >= 2 {
            let uneven = NdRange::new(max * 2 + 1, 2);
            expect_rejected(log, "non-dividing local size", device.launch(uneven, &kernel), |e| {
                matches!(e, DeviceError::InvalidWorkGroup { .. })
            });
        } else {
            log.note("non-dividing local size: not checked, max work-group size is 1");
        }

        let oversize = NdRange::new((max + 1) * 2, max + 1);
        expect_rejected(log, "oversized work-group", device.launch(oversize, &kernel), |e| {
            *e == DeviceError::WorkGroupTooLarge { local: max + 1, max }
        });

        log.check_eq(
            &executed.load(Ordering::Relaxed),
            &0,
            "work-items executed by rejected launches",
        );

        // A launch at the limit must still succeed; any error here is unexpected.
        device.launch(NdRange::new(max * 2, max), &kernel)?;
        log.check_eq(
            &executed.load(Ordering::Relaxed),
            &(max * 2),
            "work-items executed at the work-group limit",
        );
        Ok(())
    }
}

crate::register_test!(WorkGroupErrors);

#[track_caller]
fn expect_rejected(
    log: &mut Logger,
    what: &str,
    result: Result<(), DeviceError>,
    accept: impl FnOnce(&DeviceError) -> bool,
) {
    match result {
        Ok(()) => log.fail(format!("{what}: launch succeeded, expected an error")),
        Err(e) if accept(&e) => log.note(format!("{what}: rejected with '{e}'")),
        Err(e) => log.fail(format!("{what}: rejected with unexpected error '{e}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Capability, HostDevice};
    use crate::logger::Status;
    use std::sync::Arc;

    /// Accepts every range, like a driver that skips validation.
    struct Permissive;

    impl crate::device::Device for Permissive {
        fn name(&self) -> &str {
            "permissive"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn has(&self, _cap: Capability) -> bool {
            false
        }

        fn max_work_group_size(&self) -> usize {
            4
        }

        fn sub_group_size(&self) -> Option<usize> {
            None
        }

        fn launch(
            &self,
            _range: NdRange,
            _kernel: &(dyn Fn(WorkItem) + Sync),
        ) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    #[test]
    fn test_host_device_rejects_bad_ranges() {
        let env = TestEnv::new(Arc::new(HostDevice::new()));
        let mut log = Logger::new();
        WorkGroupErrors.run(&env, &mut log).unwrap();
        assert_eq!(log.status(), Status::Passed, "{:?}", log.events());
    }

    /// Checks the size limit before divisibility, as some drivers do.
    struct SizeFirst {
        max: usize,
    }

    impl crate::device::Device for SizeFirst {
        fn name(&self) -> &str {
            "size-first"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn has(&self, _cap: Capability) -> bool {
            false
        }

        fn max_work_group_size(&self) -> usize {
            self.max
        }

        fn sub_group_size(&self) -> Option<usize> {
            None
        }

        fn launch(
            &self,
            range: NdRange,
            kernel: &(dyn Fn(WorkItem) + Sync),
        ) -> Result<(), DeviceError> {
            if range.local > self.max {
                return Err(DeviceError::WorkGroupTooLarge {
                    local: range.local,
                    max: self.max,
                });
            }
            let groups = range.groups().ok_or(DeviceError::InvalidWorkGroup {
                global: range.global,
                local: range.local,
            })?;
            for group_id in 0..groups {
                for local_id in 0..range.local {
                    kernel(WorkItem {
                        global_id: group_id * range.local + local_id,
                        local_id,
                        group_id,
                    });
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_unit_work_group_limit_passes_on_size_first_device() {
        let env = TestEnv::new(Arc::new(SizeFirst { max: 1 }));
        let mut log = Logger::new();
        WorkGroupErrors.run(&env, &mut log).unwrap();
        assert_eq!(log.status(), Status::Passed, "{:?}", log.events());
        assert!(log.events().iter().any(|e| matches!(
            e,
            crate::logger::LogEvent::Note { message } if message.contains("not checked")
        )));
    }

    #[test]
    fn test_size_first_device_passes() {
        let env = TestEnv::new(Arc::new(SizeFirst { max: 8 }));
        let mut log = Logger::new();
        WorkGroupErrors.run(&env, &mut log).unwrap();
        assert_eq!(log.status(), Status::Passed, "{:?}", log.events());
    }

    #[test]
    fn test_permissive_device_fails() {
        let env = TestEnv::new(Arc::new(Permissive));
        let mut log = Logger::new();
        WorkGroupErrors.run(&env, &mut log).unwrap();
        assert_eq!(log.status(), Status::Failed);
        let failures = log
            .events()
            .iter()
            .filter(|e| e.severity() == Status::Failed)
            .count();
        // three accepted launches plus the missing work-items at the limit
        assert_eq!(failures, 4);
    }
}
