//! BSV Bridge Probe
//!
//! A small native binary that plays the renderer side of the bridge over
//! stdin/stdout, so a host build can be smoke-tested without the UI. The host
//! writes JSON-line events to our stdin and reads commands from our stdout.
//! Results go to stderr as pretty JSON.
//!
//! Usage: `bsv-bridge-probe [status|identity|address|balance|history|startup|watch|back|forward|reload]`
//!
//! `watch` refreshes balance and price every `balanceRefreshSecs` until Ctrl-C.

use anyhow::{bail, Context};
use bsv_browser_lib::bridge::stdio;
use bsv_browser_lib::config::BridgeConfig;
use bsv_browser_lib::facades::overlay::OverlayFacade;
use bsv_browser_lib::facades::{
    AddressFacade, IdentityFacade, NavigationFacade, TransactionFacade, WalletFacade,
};
use bsv_browser_lib::logging::init_logger;
use bsv_browser_lib::panels::{OverlayController, OverlayRoot};
use bsv_browser_lib::startup::check_identity_on_startup;
use bsv_browser_lib::state::{BalanceState, HttpPriceFeed};
use serde_json::Value;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = env::args().nth(1).unwrap_or_else(|| "status".to_string());

    let config = BridgeConfig::load();
    let _log = init_logger(config.log_directory(), config.log_level_filter())
        .context("Failed to initialize logging")?;
    log::info!("Bridge probe starting ({})", command);

    let (bridge, tasks) = stdio::connect(config.clone(), tokio::io::stdin(), tokio::io::stdout());
    // Direct host methods may still answer, so a silent host is not fatal here
    if let Err(e) = bridge.readiness().wait(config.request_timeout()).await {
        log::warn!("Host did not announce readiness: {}", e);
    }
    let navigation = NavigationFacade::new(bridge.clone());

    let result: Value = match command.as_str() {
        "status" => serde_json::to_value(WalletFacade::new(bridge.clone()).get_status().await?)?,
        "identity" => serde_json::to_value(IdentityFacade::new(bridge.clone()).get().await?)?,
        "address" => serde_json::to_value(AddressFacade::new(bridge.clone()).generate().await?)?,
        "balance" => serde_json::to_value(TransactionFacade::new(bridge.clone()).get_balance(None).await?)?,
        "history" => serde_json::to_value(TransactionFacade::new(bridge.clone()).get_history().await?)?,
        "startup" => {
            let mut overlay =
                OverlayController::mount(OverlayFacade::new(bridge.clone()), OverlayRoot::General);
            serde_json::to_value(check_identity_on_startup(&bridge, &mut overlay).await)?
        }
        "watch" => {
            let feed = HttpPriceFeed::from_config(&config)?;
            let balance = Arc::new(BalanceState::new(
                TransactionFacade::new(bridge.clone()),
                Arc::new(feed),
            ));
            let Some(_refresh) = balance.spawn_auto_refresh(config.balance_refresh()) else {
                bail!("Balance auto-refresh is disabled (balanceRefreshSecs is 0)");
            };
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
            serde_json::to_value(balance.state().snapshot())?
        }
        "back" => serde_json::to_value(navigation.back()?)?,
        "forward" => serde_json::to_value(navigation.forward()?)?,
        "reload" => serde_json::to_value(navigation.reload()?)?,
        other => bail!(
            "Unknown probe '{}'; expected status, identity, address, balance, history, startup, watch, back, forward or reload",
            other
        ),
    };

    eprintln!("{}", serde_json::to_string_pretty(&result)?);
    tasks.abort();
    Ok(())
}
