//! External service clients for Opsboard.
//!
//! One client per external system, each independently constructed and
//! independently fallible:
//!
//! - [`GraphDirectory`] - the identity directory (Microsoft Graph), including
//!   the user lifecycle mutations
//! - [`DigitalOceanProvider`] - droplet inventory
//! - [`AwsProvider`] - EC2 inventory
//! - [`GoDaddyProvider`] - registered domains
//!
//! All infrastructure providers implement [`opsboard_core::Provider`] and
//! degrade to an empty listing when unconfigured, so a partially configured
//! deployment still aggregates what it can.

mod aws;
mod digitalocean;
mod directory;
mod godaddy;

pub use aws::{AwsConfig, AwsProvider};
pub use digitalocean::{DigitalOceanConfig, DigitalOceanProvider};
pub use directory::{DirectoryConfig, GraphDirectory};
pub use godaddy::{GoDaddyConfig, GoDaddyProvider};
