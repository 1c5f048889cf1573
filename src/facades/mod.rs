//! Typed wrappers over host capabilities
//!
//! Each facade prefers a direct method the host injected and falls back to
//! the correlated command route. When neither exists the call fails with
//! `CapabilityUnavailable`.

pub mod address;
pub mod brc100;
pub mod identity;
pub mod navigation;
pub mod overlay;
pub mod routes;
pub mod transaction;
pub mod wallet;

pub use address::{AddressData, AddressFacade};
pub use brc100::{AuthDecision, AuthPrompt, Brc100Facade};
pub use identity::{IdentityData, IdentityFacade, IdentityResult};
pub use navigation::NavigationFacade;
pub use overlay::{OverlayFacade, Panel};
pub use transaction::{HistoryEntry, SendRequest, TransactionFacade, TransactionResponse};
pub use wallet::WalletFacade;
