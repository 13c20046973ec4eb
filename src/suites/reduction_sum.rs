//! Work-group partial sums, combined on the host, per scalar type.

use crate::case::{CaseResult, TestCase, TestDescriptor};
use crate::core::context::TestEnv;
use crate::coverage::{self, CoverageType, TypeVisitor};
use crate::device::{DeviceError, NdRange, WorkItem};
use crate::logger::Logger;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct ReductionSum;

impl TestCase for ReductionSum {
    fn descriptor(&self) -> TestDescriptor {
        crate::test_descriptor!("reduction_sum")
    }

    fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult {
        let mut check = SumCheck {
            env,
            log: &mut *log,
            range: super::launch_range(env),
            error: None,
        };
        coverage::for_all_types(&coverage::scalar_types(), &mut check);

        match check.error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

crate::register_test!(ReductionSum);

struct SumCheck<'a> {
    env: &'a TestEnv,
    log: &'a mut Logger,
    range: NdRange,
    error: Option<DeviceError>,
}

impl TypeVisitor for SumCheck<'_> {
    fn visit<T: CoverageType>(&mut self, type_name: &str) {
        if self.error.is_some() {
            return;
        }
        let device = self.env.device();
        if let Some(cap) = T::REQUIRES.filter(|&cap| !device.has(cap)) {
            self.log.note(format!("{type_name}: not checked, device lacks {cap}"));
            return;
        }

        let groups = self.range.global / self.range.local;
        let partials: Vec<Mutex<T>> = (0..groups).map(|_| Mutex::new(T::zero())).collect();

        let kernel = |item: WorkItem| {
            let mut partial = partials[item.group_id]
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *partial = partial.combine(T::sample(item.global_id));
        };
        if let Err(e) = device.launch(self.range, &kernel) {
            self.error = Some(e);
            return;
        }

        let actual = partials
            .into_iter()
            .map(|p| p.into_inner().unwrap_or_else(PoisonError::into_inner))
            .fold(T::zero(), T::combine);
        let expected = (0..self.range.global)
            .map(T::sample)
            .fold(T::zero(), T::combine);

        self.log.check_eq(&actual, &expected, &format!("{type_name} sum"));
    }
}
