//! Domain models for the marketplace.
//!
//! These are validated domain objects, separate from the `FromRow` row types
//! in [`crate::db`]. Related rows (a vendor's address, an item's images, a
//! district's city) hang off the models as [`rosewood_core::LazyField`]
//! slots and are loaded on first access through the repositories.

pub mod account;
pub mod address;
pub mod collection;
pub mod distributor;
pub mod item;
pub mod order;
pub mod privilege;
pub mod reference;
pub mod region;
pub mod remind;
pub mod session;
pub mod user;
pub mod vendor;

pub use account::Account;
pub use address::{Address, AddressOwner};
pub use collection::{Collection, CollectionEntry};
pub use distributor::{Distributor, DistributorRevocation};
pub use item::{Item, ItemImage, Stock, StockLine, StockedDistributor};
pub use order::Order;
pub use privilege::Privilege;
pub use reference::{Choice, ItemFormOptions, SecondCategory};
pub use region::{Area, City, District, Province, RegionName};
pub use remind::{Remind, RemindLink, Reminds};
pub use session::{CurrentAccount, PasswordResetGrant, RegistrationStep, keys as session_keys};
pub use user::User;
pub use vendor::{Vendor, VendorStatistics};
