// Placement fee estimation and the platform / Select Circle / Founding Circle
// revenue split recorded when a referral is hired.

pub mod distributor;
pub mod fee;
pub mod handlers;
pub mod split;
