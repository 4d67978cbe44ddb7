//! Outer surfaces: scenario files and the replay driver built on them.

pub mod csv;
pub mod replay;
