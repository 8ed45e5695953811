//! Row-level error taxonomy and batch skip accounting.
//!
//! Every error here is scoped to a single star or planet. Batch operations
//! log the error, count it in a [`BatchReport`], drop the entity and carry on.
//! File-level failures (unreadable files, missing columns) are not modelled
//! here; they surface as `anyhow::Error` from the loaders.

use std::fmt;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkyError {
    /// Malformed or out-of-range input row.
    #[error("invalid data for {id}: {reason}")]
    DataInvalid { id: String, reason: String },

    /// A required orbital element is absent or NaN.
    #[error("missing orbital element `{field}` for planet {id}")]
    MissingOrbitalData { id: String, field: &'static str },

    /// Kepler's equation did not converge within the iteration cap.
    #[error(
        "Kepler solve for {id} did not converge after {iterations} iterations \
         (M = {mean_anomaly}, e = {eccentricity}, residual = {residual:e})"
    )]
    ConvergenceError {
        id: String,
        mean_anomaly: f64,
        eccentricity: f64,
        iterations: u32,
        residual: f64,
    },

    /// Degenerate geometry, e.g. a zero-length direction vector.
    #[error("degenerate geometry for {id}: {reason}")]
    DomainError { id: String, reason: String },
}

impl SkyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SkyError::DataInvalid { .. } => ErrorKind::DataInvalid,
            SkyError::MissingOrbitalData { .. } => ErrorKind::MissingOrbitalData,
            SkyError::ConvergenceError { .. } => ErrorKind::Convergence,
            SkyError::DomainError { .. } => ErrorKind::Domain,
        }
    }

    /// Replace the entity id carried by the error.
    ///
    /// Low-level routines (coordinate inversion, the Kepler solver) do not know
    /// which star or planet they work for; the batch layer stamps it on.
    pub fn with_id(mut self, new_id: impl Into<String>) -> Self {
        let new_id = new_id.into();
        match &mut self {
            SkyError::DataInvalid { id, .. }
            | SkyError::MissingOrbitalData { id, .. }
            | SkyError::ConvergenceError { id, .. }
            | SkyError::DomainError { id, .. } => *id = new_id,
        }
        self
    }
}

/// Discriminant of [`SkyError`], used as the key of skip counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DataInvalid,
    MissingOrbitalData,
    Convergence,
    Domain,
}

/// Count of entities dropped from a batch, per error kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Entities that made it through.
    pub accepted: usize,
    pub data_invalid: usize,
    pub missing_orbital_data: usize,
    pub convergence: usize,
    pub domain: usize,
}

impl BatchReport {
    /// Log and count a skipped entity.
    pub fn skip(&mut self, err: &SkyError) {
        warn!("skipping: {}", err);
        match err.kind() {
            ErrorKind::DataInvalid => self.data_invalid += 1,
            ErrorKind::MissingOrbitalData => self.missing_orbital_data += 1,
            ErrorKind::Convergence => self.convergence += 1,
            ErrorKind::Domain => self.domain += 1,
        }
    }

    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        match kind {
            ErrorKind::DataInvalid => self.data_invalid,
            ErrorKind::MissingOrbitalData => self.missing_orbital_data,
            ErrorKind::Convergence => self.convergence,
            ErrorKind::Domain => self.domain,
        }
    }

    pub fn skipped(&self) -> usize {
        self.data_invalid + self.missing_orbital_data + self.convergence + self.domain
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: &BatchReport) {
        self.accepted += other.accepted;
        self.data_invalid += other.data_invalid;
        self.missing_orbital_data += other.missing_orbital_data;
        self.convergence += other.convergence;
        self.domain += other.domain;
    }

    /// Report of a two-stage batch: the skips of both stages, and the
    /// entities accepted by the `later` one.
    pub fn chain(&self, later: &BatchReport) -> BatchReport {
        let mut report = BatchReport {
            accepted: 0,
            ..*self
        };
        report.merge(later);
        report
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} accepted, {} skipped (invalid: {}, missing orbit: {}, no convergence: {}, degenerate: {})",
            self.accepted,
            self.skipped(),
            self.data_invalid,
            self.missing_orbital_data,
            self.convergence,
            self.domain
        )
    }
}
