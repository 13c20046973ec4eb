//! Every work-item writes one value per type; the host checks every slot.

use crate::case::{CaseResult, TestCase, TestDescriptor};
use crate::core::context::TestEnv;
use crate::coverage::{self, CoverageType, TypeVisitor};
use crate::device::{DeviceError, NdRange, WorkItem};
use crate::logger::Logger;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct KernelCopy;

impl TestCase for KernelCopy {
    fn descriptor(&self) -> TestDescriptor {
        crate::test_descriptor!("kernel_copy")
    }

    fn run(&self, env: &TestEnv, log: &mut Logger) -> CaseResult {
        let mut check = CopyCheck {
            env,
            log: &mut *log,
            range: super::launch_range(env),
            checked: 0,
            error: None,
        };
        coverage::for_all_types_and_vectors(&coverage::scalar_types(), &mut check);

        if let Some(e) = check.error {
            return Err(e.into());
        }
        let checked = check.checked;
        log.note(format!("checked {checked} types"));
        Ok(())
    }
}

crate::register_test!(KernelCopy);

struct CopyCheck<'a> {
    env: &'a TestEnv,
    log: &'a mut Logger,
    range: NdRange,
    checked: usize,
    error: Option<DeviceError>,
}

impl TypeVisitor for CopyCheck<'_> {
    fn visit<T: CoverageType>(&mut self, type_name: &str) {
        if self.error.is_some() {
            return;
        }
        let device = self.env.device();
        if let Some(cap) = T::REQUIRES {
            if !device.has(cap) {
                self.log.note(format!("{type_name}: not checked, device lacks {cap}"));
                return;
            }
        }

        let global = self.range.global;
        let slots: Vec<OnceLock<T>> = (0..global).map(|_| OnceLock::new()).collect();
        let rewrites = AtomicUsize::new(0);

        let kernel = |item: WorkItem| {
            if slots[item.global_id].set(T::sample(item.global_id)).is_err() {
                rewrites.fetch_add(1, Ordering::Relaxed);
            }
        };
        if let Err(e) = device.launch(self.range, &kernel) {
            self.error = Some(e);
            return;
        }

        let wrong = slots
            .iter()
            .enumerate()
            .filter(|(i, slot)| slot.get() != Some(&T::sample(*i)))
            .count();
        self.log.check(wrong == 0, || {
            format!("{type_name}: {wrong} of {global} slots hold the wrong value")
        });

        let rewrites = rewrites.into_inner();
        self.log.check(rewrites == 0, || {
            format!("{type_name}: {rewrites} work-items ran more than once")
        });
        self.checked += 1;
    }
}
