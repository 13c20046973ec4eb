//! Sub-group width reported by the device.

use crate::case::{CaseResult, TestCase, TestDescriptor};
use crate::core::context::TestEnv;
use crate::device::Capability;
use crate::logger::Logger;

#[derive(Debug, Default)]
pub struct SubGroupQuery;

impl TestCase for SubGroupQuery {
    fn descriptor(&self) -> TestDescriptor {
        crate::test_descriptor!("sub_group_query")
    }

    fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult {
        let device = env.device();
        if !device.has(Capability::SubGroups) {
            log.skip("device does not support sub-groups");
            return Ok(());
        }

        let Some(width) = device.sub_group_size() else {
            log.fail("sub-groups are advertised but no sub-group size is reported");
            return Ok(());
        };
        let max = device.max_work_group_size();
        log.note(format!("sub-group size {width}, max work-group size {max}"));

        if log.check(width > 0, || "sub-group size is zero".to_string()) {
            log.check(max % width == 0, || {
                format!("sub-group size {width} does not divide max work-group size {max}")
            });
        }
        Ok(())
    }
}

crate::register_test!(SubGroupQuery);
