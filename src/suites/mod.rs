//! Conformance suites shipped with the harness.
//!
//! Every suite registers itself; linking the crate with the `builtin-suites`
//! feature is enough for them to appear in [`registry::global`](crate::registry::global).
//!
//! Suites read these [`TestEnv`](crate::TestEnv) parameters:
//!
//! - `global_size` - work-items per launch (default 1024)
//! - `local_size` - work-items per work-group (default 64, capped at the device maximum)

pub mod device_capabilities;
pub mod kernel_copy;
pub mod reduction_sum;
pub mod sub_group_query;
pub mod work_group_errors;

use crate::core::context::TestEnv;
use crate::device::NdRange;

const DEFAULT_GLOBAL_SIZE: usize = 1024;
const DEFAULT_LOCAL_SIZE: usize = 64;

/// Launch range for data-parallel suites, from parameters and device limits.
///
/// The global size is rounded up to a multiple of the local size.
pub(crate) fn launch_range(env: &TestEnv) -> NdRange {
    let max = env.device().max_work_group_size().max(1);
    let local = env
        .param_or("local_size", DEFAULT_LOCAL_SIZE)
        .clamp(1, max);
    let global = env.param_or("global_size", DEFAULT_GLOBAL_SIZE).max(local);
    NdRange::new(global.div_ceil(local) * local, local)
}
