pub mod distribution;
pub mod profile;
pub mod referral;
