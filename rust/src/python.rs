//! Python bindings. Requests and responses cross the boundary as JSON strings.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::AnalysisConfig;
use crate::engine::ScheduleEngine;

fn parse_config(config_json: Option<&str>) -> PyResult<AnalysisConfig> {
    match config_json {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| PyValueError::new_err(format!("Invalid config: {}", e))),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Schedule analysis engine (PyO3 wrapper).
#[pyclass(name = "Engine")]
#[derive(Clone, Debug)]
pub struct PyEngine {
    inner: ScheduleEngine,
}

#[pymethods]
impl PyEngine {
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        Ok(Self {
            inner: ScheduleEngine::new(parse_config(config_json)?),
        })
    }

    /// Run a JSON request such as `{"operation": "compute_critical_path", ...}`.
    ///
    /// # Raises
    /// * ValueError for malformed requests, cyclic graphs and rejected baselines
    fn execute(&self, py: Python<'_>, request_json: &str) -> PyResult<String> {
        py.allow_threads(|| self.inner.execute_json(request_json))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!("Engine(verbosity={})", self.inner.config().verbosity)
    }
}

/// Run a single JSON request with an optional JSON config.
#[pyfunction]
#[pyo3(signature = (request_json, config_json=None))]
fn execute(py: Python<'_>, request_json: &str, config_json: Option<&str>) -> PyResult<String> {
    PyEngine::new(config_json)?.execute(py, request_json)
}

/// The schedule_engine Python module.
#[pymodule]
fn schedule_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyEngine>()?;
    m.add_function(wrap_pyfunction!(execute, m)?)?;
    Ok(())
}
