//! Configurable mock of the Saleae Logic 2 Automation RPC surface.
//!
//! A scenario document (YAML) is compiled into an immutable [`plan::Plan`];
//! a [`server::MockServer`] built from that plan answers the full automation
//! method set with deterministic, declaratively-configured responses
//! (fixtures, behavior toggles, fault injection, optional placeholder
//! files), so client tooling can be developed and tested without hardware.

pub mod clock;
pub mod config;
pub mod fault;
pub mod handlers;
pub mod harness;
pub mod plan;
pub mod server;
pub mod side_effects;
pub mod state;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, ScenarioConfig};
pub use plan::{compile, Plan, PlanError};
pub use server::{serve, MockServer, RuntimeContext, ServerHandle};
