//! # Identities and Keyspaces
//!
//! The ledger is keyed by an (item, location) pair, but different
//! collaborators name items and locations differently:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Keyspaces                                        │
//! │                                                                         │
//! │   Warehouse keyspace             Retail keyspace                        │
//! │   ──────────────────             ───────────────                        │
//! │   Item     = ProductId           Item     = Sku                         │
//! │   Location = WarehouseId         Location = StoreId                     │
//! │                                                                         │
//! │   Both share ONE ledger implementation. The keyspace NAME is stored    │
//! │   on every row, so ("P-1", "W-1") in one keyspace never collides with  │
//! │   ("P-1", "W-1") in the other.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identities are opaque strings. Whether they refer to live entities is the
//! caller's concern; the ledger only requires them to be non-blank.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// An opaque, string-backed identifier.
pub trait Identity:
    Clone + Debug + Display + PartialEq + Eq + Hash + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// The raw identifier as persisted.
    fn as_str(&self) -> &str;

    /// Rebuilds the identifier from its persisted form.
    fn from_stored(raw: String) -> Self;
}

/// A pair of identity types that together key a stock balance.
pub trait Keyspace: Debug + Clone + Copy + Default + PartialEq + Eq + Send + Sync + 'static {
    /// Stable name persisted in the `keyspace` column. Never change it
    /// once rows exist.
    const NAME: &'static str;

    type Item: Identity;
    type Location: Identity;
}

macro_rules! identity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }
        }

        impl Identity for $name {
            fn as_str(&self) -> &str {
                &self.0
            }

            fn from_stored(raw: String) -> Self {
                $name(raw)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name(id)
            }
        }
    };
}

identity!(
    /// Product identifier (warehouse-side item).
    ProductId
);
identity!(
    /// Warehouse identifier.
    WarehouseId
);
identity!(
    /// Stock keeping unit (store-side item).
    Sku
);
identity!(
    /// Retail store identifier.
    StoreId
);

/// Products stocked in warehouses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Warehouse;

impl Keyspace for Warehouse {
    const NAME: &'static str = "warehouse";
    type Item = ProductId;
    type Location = WarehouseId;
}

/// SKUs stocked in retail stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Retail;

impl Keyspace for Retail {
    const NAME: &'static str = "retail";
    type Item = Sku;
    type Location = StoreId;
}
