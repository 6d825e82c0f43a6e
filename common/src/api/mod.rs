//! Typed RPC parameter/result pairs for every method in section 6.2,
//! grounded on the `tos_common::api::daemon` convention of keeping wire
//! schemas in one place, separate from the business logic that produces
//! or consumes them. `bank` covers the CO -> BP surface, `coordinator`
//! the CL -> CO surface.

pub mod bank;
pub mod coordinator;
