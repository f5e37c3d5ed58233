use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::workflows::accounts::Role;

/// Renewal costs the same for every role.
pub const MONTHLY_RENEWAL_MINOR: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    FirstTime,
    MonthlyRenewal,
}

impl SubscriptionType {
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionType::FirstTime => "first_time",
            SubscriptionType::MonthlyRenewal => "monthly_renewal",
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SubscriptionType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "first_time" => Ok(SubscriptionType::FirstTime),
            "monthly_renewal" => Ok(SubscriptionType::MonthlyRenewal),
            _ => Err(()),
        }
    }
}

pub fn first_time_fee_minor(role: Role) -> u64 {
    match role {
        Role::Student => 100,
        Role::GovernmentWorker | Role::Family => 200,
        Role::Landlord => 300,
    }
}

/// Fee in minor currency units (cents) for a subscription purchase.
pub fn fee_minor(subscription_type: SubscriptionType, role: Role) -> u64 {
    match subscription_type {
        SubscriptionType::FirstTime => first_time_fee_minor(role),
        SubscriptionType::MonthlyRenewal => MONTHLY_RENEWAL_MINOR,
    }
}

pub fn to_major_units(minor: u64) -> f64 {
    minor as f64 / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstTimePricing {
    pub student: f64,
    pub government_worker: f64,
    pub family: f64,
    pub landlord: f64,
}

/// Published price list in major units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingTable {
    pub first_time: FirstTimePricing,
    pub monthly_renewal: f64,
}

impl PricingTable {
    pub fn current() -> Self {
        let first_time = |role| to_major_units(first_time_fee_minor(role));
        Self {
            first_time: FirstTimePricing {
                student: first_time(Role::Student),
                government_worker: first_time(Role::GovernmentWorker),
                family: first_time(Role::Family),
                landlord: first_time(Role::Landlord),
            },
            monthly_renewal: to_major_units(MONTHLY_RENEWAL_MINOR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_time_fees_follow_role_table() {
        let expected = [
            (Role::Student, 1.00),
            (Role::GovernmentWorker, 2.00),
            (Role::Family, 2.00),
            (Role::Landlord, 3.00),
        ];
        for (role, major) in expected {
            assert_eq!(
                to_major_units(fee_minor(SubscriptionType::FirstTime, role)),
                major,
                "first-time fee for {role}"
            );
        }
    }

    #[test]
    fn renewal_is_flat_for_every_role() {
        for role in Role::ALL {
            assert_eq!(fee_minor(SubscriptionType::MonthlyRenewal, role), 100);
        }
    }

    #[test]
    fn pricing_table_serializes_published_shape() {
        let json = serde_json::to_value(PricingTable::current()).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({
                "first_time": {
                    "student": 1.0,
                    "government_worker": 2.0,
                    "family": 2.0,
                    "landlord": 3.0
                },
                "monthly_renewal": 1.0
            })
        );
    }

    #[test]
    fn subscription_types_parse_wire_labels() {
        assert_eq!(
            "first_time".parse::<SubscriptionType>(),
            Ok(SubscriptionType::FirstTime)
        );
        assert_eq!(
            "monthly_renewal".parse::<SubscriptionType>(),
            Ok(SubscriptionType::MonthlyRenewal)
        );
        assert!("yearly".parse::<SubscriptionType>().is_err());
    }
}
