//! Locate decisions: baseline lookup, eligibility chain and local rewrite.

pub mod correlation;
pub mod decider;
pub mod types;

pub use decider::{Decision, Ineligible, RedirectDecider};
pub use types::{FinderCode, LocateStatus, LocationRequest, LocationResponse};
