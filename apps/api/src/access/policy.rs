//! Role access policy: which job tiers and features each member role may use.
//!
//! Identifiers arriving from the boundary are free-form strings. Anything that
//! does not parse into a known `Role`, `Tier`, or `Feature` is denied.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FoundingCircle,
    SelectCircle,
    Client,
    Candidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Connect,
    Priority,
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    SubmitReferrals,
    ViewEarnings,
    ViewDistributions,
    PostJobs,
    ReviewReferrals,
    CreateDistributions,
    ViewOwnApplications,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "founding_circle" => Some(Role::FoundingCircle),
            "select_circle" => Some(Role::SelectCircle),
            "client" => Some(Role::Client),
            "candidate" => Some(Role::Candidate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FoundingCircle => "founding_circle",
            Role::SelectCircle => "select_circle",
            Role::Client => "client",
            Role::Candidate => "candidate",
        }
    }

    pub fn tiers(&self) -> &'static [Tier] {
        match self {
            Role::FoundingCircle => &[Tier::Connect, Tier::Priority, Tier::Exclusive],
            Role::SelectCircle => &[Tier::Connect, Tier::Priority],
            Role::Client => &[Tier::Connect, Tier::Priority, Tier::Exclusive],
            Role::Candidate => &[Tier::Connect],
        }
    }

    pub fn features(&self) -> &'static [Feature] {
        match self {
            Role::FoundingCircle | Role::SelectCircle => &[
                Feature::SubmitReferrals,
                Feature::ViewEarnings,
                Feature::ViewDistributions,
            ],
            Role::Client => &[
                Feature::PostJobs,
                Feature::ReviewReferrals,
                Feature::CreateDistributions,
            ],
            Role::Candidate => &[Feature::ViewOwnApplications],
        }
    }

    pub fn has_tier(&self, tier: Tier) -> bool {
        self.tiers().contains(&tier)
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features().contains(&feature)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Tier {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "connect" => Some(Tier::Connect),
            "priority" => Some(Tier::Priority),
            "exclusive" => Some(Tier::Exclusive),
            _ => None,
        }
    }
}

impl Feature {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "submit_referrals" => Some(Feature::SubmitReferrals),
            "view_earnings" => Some(Feature::ViewEarnings),
            "view_distributions" => Some(Feature::ViewDistributions),
            "post_jobs" => Some(Feature::PostJobs),
            "review_referrals" => Some(Feature::ReviewReferrals),
            "create_distributions" => Some(Feature::CreateDistributions),
            "view_own_applications" => Some(Feature::ViewOwnApplications),
            _ => None,
        }
    }
}

/// Returns true when `role` may see or refer against jobs of `tier`.
pub fn can_access_tier(role: &str, tier: &str) -> bool {
    match (Role::parse(role), Tier::parse(tier)) {
        (Some(role), Some(tier)) => role.has_tier(tier),
        _ => false,
    }
}

/// Returns true when `role` may use `feature`.
pub fn can_use_feature(role: &str, feature: &str) -> bool {
    match (Role::parse(role), Feature::parse(feature)) {
        (Some(role), Some(feature)) => role.has_feature(feature),
        _ => false,
    }
}
