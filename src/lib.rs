//! Scenarist core library.
//!
//! Builds database fixtures for integration tests from chains of named
//! scenarios. Each scenario's seed runs inside a transaction on a caller-supplied
//! [`db::UnitOfWork`]; the committed state is captured as a checksummed snapshot
//! so later runs restore it instead of reseeding.
//!
//! The main entry points are [`registry::ScenarioRegistry`] for declaring
//! scenarios, [`plan::Resolver`] for ordering a preload chain, and
//! [`executor::ScenarioExecutor`] for building a target against a
//! [`snapshot::SnapshotStore`].

pub mod catalog;
pub mod cli;
pub mod db;
pub mod error;
pub mod executor;
pub mod fingerprint;
pub mod plan;
pub mod registry;
pub mod runner;
pub mod scenario;
pub mod snapshot;
pub mod status;
