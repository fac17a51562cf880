//! featuresync core library: multi-resolution digest summaries for
//! reconciling two replicas of a feature dataset.
//!
//! Records are sorted by a bucket digest and split into groups that share a
//! bucket prefix of `level` bytes. Each group gets one aggregate digest, so two
//! peers can compare summaries coarsest-first and only descend into groups
//! whose digests differ.
//!
//! With the `python` feature the crate also builds the `_featuresync_core`
//! extension module.

pub mod errors;
pub mod models;
#[cfg(feature = "python")]
pub mod python;
pub mod sync;

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::wrap_pyfunction;

// ---------------------------------------------------------------------------
// Top-level Python module: _featuresync_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pymodule]
fn _featuresync_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("DEFAULT_MAX_LEVEL", sync::guards::DEFAULT_MAX_LEVEL)?;

    m.add_function(wrap_pyfunction!(python::digest_hex, m)?)?;
    m.add_function(wrap_pyfunction!(python::group_for_level, m)?)?;

    Ok(())
}
