//! In-process adapters standing in for the provider SDK and the platform UI.
//!
//! Used by the replay binary and the test suite.

pub mod scripted;
