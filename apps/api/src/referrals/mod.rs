// Referral lifecycle: the status graph, derived pipeline stages, and
// client-driven status changes. Hiring is owned by revenue::distributor.

pub mod handlers;
pub mod service;
pub mod status;
