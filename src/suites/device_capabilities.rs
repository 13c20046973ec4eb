//! Capability queries must agree with what the device actually does.

use crate::case::{CaseResult, TestCase, TestDescriptor};
use crate::core::context::TestEnv;
use crate::coverage;
use crate::device::{Capability, DeviceError};
use crate::logger::Logger;

#[derive(Debug, Default)]
pub struct DeviceCapabilities;

impl TestCase for DeviceCapabilities {
    fn descriptor(&self) -> TestDescriptor {
        crate::test_descriptor!("device_capabilities")
    }

    fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult {
        let device = env.device();

        coverage::for_all_values(&Capability::ALL, |cap, label| {
            let has = device.has(cap);
            log.note(format!("{label}: {}", if has { "supported" } else { "unsupported" }));

            match (has, device.require(cap)) {
                (true, Ok(())) | (false, Err(DeviceError::Unsupported(_))) => {}
                (true, Err(e)) => log.fail(format!("{label}: advertised but require() failed: {e}")),
                (false, Ok(())) => log.fail(format!("{label}: not advertised but require() succeeded")),
                (false, Err(e)) => log.fail(format!("{label}: require() returned '{e}', expected unsupported")),
            }

            if cap == Capability::SubGroups {
                log.check(has == device.sub_group_size().is_some(), || {
                    format!(
                        "{label}: has() is {has} but sub-group size is {:?}",
                        device.sub_group_size()
                    )
                });
            }
        });

        log.check(device.max_work_group_size() > 0, || {
            "max work-group size is zero".to_string()
        });
        Ok(())
    }
}

crate::register_test!(DeviceCapabilities);
