//! Host command names and the surfaces their responses arrive on
//!
//! These names are shared with the native host and must match exactly.

use crate::bridge::{Route, Surface};

const fn callback(command: &'static str, ok: &'static str, err: &'static str) -> Route {
    Route {
        command,
        success: Surface::Callback(ok),
        error: Some(Surface::Callback(err)),
    }
}

// ============================================================================
// Address
// ============================================================================

pub const ADDRESS_GENERATE: Route = callback("address_generate", "onAddressGenerated", "onAddressError");

// ============================================================================
// Wallet
// ============================================================================

pub const WALLET_STATUS: Route = callback("wallet_status_check", "onWalletStatusResponse", "onWalletStatusError");
pub const CREATE_WALLET: Route = callback("create_wallet", "onCreateWalletResponse", "onCreateWalletError");
pub const LOAD_WALLET: Route = callback("load_wallet", "onLoadWalletResponse", "onLoadWalletError");
pub const GET_WALLET_INFO: Route = callback("get_wallet_info", "onGetWalletInfoResponse", "onGetWalletInfoError");
pub const GET_CURRENT_ADDRESS: Route =
    callback("get_current_address", "onGetCurrentAddressResponse", "onGetCurrentAddressError");
pub const GET_ADDRESSES: Route = callback("get_addresses", "onGetAddressesResponse", "onGetAddressesError");
pub const MARK_WALLET_BACKED_UP: Route =
    callback("mark_wallet_backed_up", "onMarkWalletBackedUpResponse", "onMarkWalletBackedUpError");

pub const GET_BACKUP_MODAL_STATE: Route = Route {
    command: "get_backup_modal_state",
    success: Surface::Callback("onGetBackupModalStateResponse"),
    error: None,
};

pub const SET_BACKUP_MODAL_STATE: Route = Route {
    command: "set_backup_modal_state",
    success: Surface::Callback("onSetBackupModalStateResponse"),
    error: None,
};

// ============================================================================
// Transactions
// ============================================================================

pub const CREATE_TRANSACTION: Route =
    callback("create_transaction", "onCreateTransactionResponse", "onCreateTransactionError");

pub const SIGN_TRANSACTION: Route = Route {
    command: "sign_transaction",
    success: Surface::Event("sign_transaction_response"),
    error: Some(Surface::Callback("onSignTransactionError")),
};

pub const BROADCAST_TRANSACTION: Route = Route {
    command: "broadcast_transaction",
    success: Surface::Event("broadcast_transaction_response"),
    error: Some(Surface::Callback("onBroadcastTransactionError")),
};

pub const SEND_TRANSACTION: Route =
    callback("send_transaction", "onSendTransactionResponse", "onSendTransactionError");
pub const GET_BALANCE: Route = callback("get_balance", "onGetBalanceResponse", "onGetBalanceError");

pub const GET_TRANSACTION_HISTORY: Route = Route {
    command: "get_transaction_history",
    success: Surface::Event("get_transaction_history_response"),
    error: Some(Surface::Callback("onGetTransactionHistoryError")),
};

// ============================================================================
// Identity
// ============================================================================

pub const IDENTITY_STATUS: Route = Route {
    command: "identity_status_check",
    success: Surface::Event("identity_status_check_response"),
    error: None,
};

pub const CREATE_IDENTITY: Route = Route {
    command: "create_identity",
    success: Surface::Event("create_identity_response"),
    error: None,
};

pub const MARK_IDENTITY_BACKED_UP: Route = Route {
    command: "mark_identity_backed_up",
    success: Surface::Event("mark_identity_backed_up_response"),
    error: None,
};

// ============================================================================
// Fire-and-forget commands
// ============================================================================

pub const OVERLAY_SHOW: &str = "overlay_show";
pub const OVERLAY_HIDE: &str = "overlay_hide";
pub const OVERLAY_INPUT: &str = "overlay_input";
pub const OVERLAY_CLOSE: &str = "overlay_close";
pub const OVERLAY_SHOW_WALLET: &str = "overlay_show_wallet";
pub const OVERLAY_SHOW_SETTINGS: &str = "overlay_show_settings";
pub const OVERLAY_SHOW_BACKUP: &str = "overlay_show_backup";
pub const FORCE_REPAINT: &str = "force_repaint";

pub const NAVIGATE_BACK: &str = "navigate_back";
pub const NAVIGATE_FORWARD: &str = "navigate_forward";
pub const NAVIGATE_RELOAD: &str = "navigate_reload";

pub const ADD_DOMAIN_TO_WHITELIST: &str = "add_domain_to_whitelist";
pub const BRC100_AUTH_RESPONSE: &str = "brc100_auth_response";
