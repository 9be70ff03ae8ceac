// Role gating at the HTTP boundary. The engine modules never re-check these rules.

pub mod caller;
pub mod handlers;
pub mod policy;
