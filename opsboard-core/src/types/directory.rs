//! Identity-directory types: user accounts, verified domains, and the
//! create-user request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::record::{Record, SOURCE_DIRECTORY};

/// Monthly list price of a basic directory license, in USD.
pub const LICENSE_BASIC_MONTHLY: f64 = 6.00;
/// Monthly list price of a standard directory license, in USD.
pub const LICENSE_STANDARD_MONTHLY: f64 = 12.50;

/// A directory account as reported by the identity provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Directory object ID.
    pub id: String,
    /// Primary mail address (or principal name when mail is unset).
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Mail domain, extracted from the address.
    pub domain: String,
    /// Last interactive sign-in, when the directory reports one.
    pub last_sign_in: Option<DateTime<Utc>>,
    /// Whether the account is enabled.
    pub account_enabled: bool,
    /// Assigned license tier, when any license is assigned.
    pub license_type: Option<String>,
    /// Department, when set.
    pub department: Option<String>,
    /// Manager's mail address, when known.
    pub manager: Option<String>,
}

impl DirectoryUser {
    /// Estimated monthly license cost for this account.
    ///
    /// Disabled or unlicensed accounts cost nothing; a license tier
    /// containing "Standard" bills at the standard rate, anything else at
    /// the basic rate.
    pub fn monthly_cost(&self) -> Option<f64> {
        if !self.account_enabled {
            return None;
        }
        let license = self.license_type.as_deref()?;
        if license.contains("Standard") {
            Some(LICENSE_STANDARD_MONTHLY)
        } else {
            Some(LICENSE_BASIC_MONTHLY)
        }
    }
}

impl From<DirectoryUser> for Record {
    fn from(user: DirectoryUser) -> Self {
        let monthly_cost = user.monthly_cost();
        let attrs = match serde_json::to_value(&user) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let mut record = Record::new(user.id, user.display_name, SOURCE_DIRECTORY)
            .with_domain(user.domain)
            .with_attrs(attrs);
        record.monthly_cost = monthly_cost;
        record
    }
}

/// A verified mail/DNS domain registered with the directory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Domain ID (the directory uses the domain name itself).
    pub id: String,
    /// Domain name.
    pub name: String,
    /// Whether ownership has been verified.
    pub is_verified: bool,
}

impl From<DomainRecord> for Record {
    fn from(domain: DomainRecord) -> Self {
        let attrs = match serde_json::to_value(&domain) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Record::new(domain.id, domain.name.clone(), SOURCE_DIRECTORY)
            .with_domain(domain.name)
            .with_attrs(attrs)
    }
}

/// Request to provision a new directory account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewUser {
    /// Full display name ("Given Surname").
    pub full_name: String,
    /// Mailbox local part; the principal name becomes `username@domain`.
    pub username: String,
    /// Mail domain to create the account under.
    pub domain: String,
    /// Department, when known.
    #[serde(default)]
    pub department: Option<String>,
    /// Manager's mail address, when known.
    #[serde(default)]
    pub manager_email: Option<String>,
    /// License tier to assign.
    #[serde(default = "NewUser::default_license")]
    pub license_type: String,
}

impl NewUser {
    fn default_license() -> String {
        "Business Basic".into()
    }
}
