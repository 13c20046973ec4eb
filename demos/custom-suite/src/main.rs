//! A downstream conformance binary: registers its own tests and reuses the harness CLI.
//!
//! ```text
//! cargo run -p custom-suite -- --show-notes always
//! ```

use cts_harness::coverage::{for_all_types, CoverageType, TypeVisitor};
use cts_harness::device::{NdRange, WorkItem};
use cts_harness::{cts_main, register_test, test_descriptor, type_pack};
use cts_harness::{CaseResult, Logger, TestCase, TestDescriptor, TestEnv};
use std::sync::atomic::{AtomicUsize, Ordering};

cts_main!();

/// Every work-item of a launch runs exactly once.
#[derive(Default)]
struct LaunchCoverage;

impl TestCase for LaunchCoverage {
    fn descriptor(&self) -> TestDescriptor {
        test_descriptor!("custom_launch_coverage")
    }

    fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult {
        let local = env.device().max_work_group_size().min(32);
        let range = NdRange::new(local * 8, local);
        let hits: Vec<AtomicUsize> = (0..range.global).map(|_| AtomicUsize::new(0)).collect();

        env.device().launch(range, &|item: WorkItem| {
            hits[item.global_id].fetch_add(1, Ordering::Relaxed);
        })?;

        let wrong = hits.iter().filter(|h| h.load(Ordering::Relaxed) != 1).count();
        log.check(wrong == 0, || format!("{wrong} work-items did not run exactly once"));
        Ok(())
    }
}

register_test!(LaunchCoverage);

/// Samples of small widths round-trip through `combine` with zero.
#[derive(Default)]
struct SmallTypeIdentity;

struct Identity<'a> {
    log: &'a mut Logger,
}

impl TypeVisitor for Identity<'_> {
    fn visit<T: CoverageType>(&mut self, type_name: &str) {
        for i in 0..16 {
            let x = T::sample(i);
            if !self.log.check_eq(&x.combine(T::zero()), &x, type_name) {
                break;
            }
        }
    }
}

impl TestCase for SmallTypeIdentity {
    fn descriptor(&self) -> TestDescriptor {
        test_descriptor!("custom_small_type_identity")
    }

    fn run(&self, _env: &TestEnv, log: &mut Logger) -> CaseResult {
        for_all_types(&type_pack![i8, u8, i16, u16, [u8; 4]], &mut Identity { log });
        Ok(())
    }
}

register_test!(SmallTypeIdentity);
