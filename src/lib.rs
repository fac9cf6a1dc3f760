pub mod api;
pub mod content;
pub mod error;
pub mod ipfs;
pub mod ledger;
pub mod moderation;
pub mod publish;
pub mod state;
pub mod storage;
pub mod workflow;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use crate::{
    ipfs::Web3StorageClient,
    ledger::{EvmLedger, LedgerConfig},
    moderation::TogetherAiClient,
    state::AppState,
};

pub async fn run() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("KNOWLEDGEHUB_LOG"))
        .init();

    let ledger =
        EvmLedger::new(LedgerConfig::from_env()).expect("Failed to create ledger client");

    let app = AppState::new(
        storage::init_db_from_env().await,
        ledger,
        Web3StorageClient::default(),
        TogetherAiClient::default(),
    );

    api::run_server(app).await
}
