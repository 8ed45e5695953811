//! Readers for published catalogue snapshots.

pub mod exoplanet;
pub mod gaia;
pub mod hipparcos;
