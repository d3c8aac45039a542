//! Data models for the tunnel-management backend.
//!
//! - `Tunnel`, `DnsRecord`: cloudflared tunnels and the DNS records routed to them
//! - `User`, `NewUser`, `Role`: user administration
//! - `TokenDto`, `LoginDto`, `CodeDto`: authentication payloads

pub mod token;
pub mod tunnel;
pub mod user;

pub use token::{CodeDto, LoginDto, TokenDto};
pub use tunnel::{DnsRecord, Tunnel};
pub use user::{NewUser, Role, User};

use serde::{Deserialize, Deserializer};

/// Deserialize a JSON `null` array as an empty `Vec`.
/// The backend serializes empty slices as `null`.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
