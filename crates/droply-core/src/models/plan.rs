//! Subscription tiers and the static limits table consulted at
//! transfer-creation time. Limits are not persisted: a transfer that was
//! within its owner's limits at creation stays valid even if the owner
//! later downgrades.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const GIB: i64 = 1024 * 1024 * 1024;

/// Subscription plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanTier {
    Free,
    Pro,
    Business,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "FREE",
            PlanTier::Pro => "PRO",
            PlanTier::Business => "BUSINESS",
        }
    }

    /// Parse the tier as stored in `app_user.plan`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FREE" => Some(PlanTier::Free),
            "PRO" => Some(PlanTier::Pro),
            "BUSINESS" => Some(PlanTier::Business),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits applied when a transfer is created.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PlanLimits {
    /// Maximum summed byte size of one transfer
    pub max_transfer_bytes: i64,
    /// Default and maximum expiry window
    pub expiry_days: i64,
    /// Transfers per calendar month; `None` = unlimited
    pub monthly_transfer_limit: Option<i64>,
    /// Whether transfers may be password protected
    pub password_protection: bool,
}

impl PlanLimits {
    /// Static policy table. Adding a tier means adding an arm here; no
    /// other component encodes per-tier numbers.
    pub const fn for_tier(tier: PlanTier) -> PlanLimits {
        match tier {
            PlanTier::Free => PlanLimits {
                max_transfer_bytes: 5 * GIB,
                expiry_days: 7,
                monthly_transfer_limit: Some(10),
                password_protection: false,
            },
            PlanTier::Pro => PlanLimits {
                max_transfer_bytes: 100 * GIB,
                expiry_days: 30,
                monthly_transfer_limit: None,
                password_protection: true,
            },
            PlanTier::Business => PlanLimits {
                max_transfer_bytes: 500 * GIB,
                expiry_days: 90,
                monthly_transfer_limit: None,
                password_protection: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_limits() {
        let limits = PlanLimits::for_tier(PlanTier::Free);
        assert_eq!(limits.max_transfer_bytes, 5 * GIB);
        assert_eq!(limits.expiry_days, 7);
        assert_eq!(limits.monthly_transfer_limit, Some(10));
        assert!(!limits.password_protection);
    }

    #[test]
    fn paid_tiers_allow_passwords_and_unlimited_transfers() {
        for tier in [PlanTier::Pro, PlanTier::Business] {
            let limits = PlanLimits::for_tier(tier);
            assert!(limits.password_protection);
            assert!(limits.monthly_transfer_limit.is_none());
        }
    }

    #[test]
    fn tiers_round_trip_through_strings() {
        for tier in [PlanTier::Free, PlanTier::Pro, PlanTier::Business] {
            assert_eq!(PlanTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(PlanTier::parse("business"), Some(PlanTier::Business));
        assert_eq!(PlanTier::parse("ENTERPRISE"), None);
    }
}
