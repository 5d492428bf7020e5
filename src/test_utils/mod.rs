//! Test utilities shared by use case and route tests.
//!
//! This module provides:
//! - Test data factories for creating valid fixtures
//! - In-memory repository implementations for mocking persistence
//! - Recording / failing notification senders and a fixed clock
//! - A builder for `AppState` backed by the in-memory mocks

mod app_state_builder;
mod factories;
mod messaging_mocks;
mod subscription_mocks;

pub use app_state_builder::*;
pub use factories::*;
pub use messaging_mocks::*;
pub use subscription_mocks::*;
