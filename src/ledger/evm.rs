use std::env;
use std::str::FromStr;
use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;

use super::{Ledger, LedgerArticle};
use crate::error::{Error, Result};

sol! {
    #[sol(rpc)]
    contract KnowledgeHub {
        function articleCount() external view returns (uint256);
        function publishArticle(string memory title, string memory ipfsHash) external;
        function getArticle(uint256 index) external view returns (address author, string memory ipfsHash, string memory title, uint256 timestamp);
    }
}

/// 账本客户端配置
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// 发布交易的签名私钥；只读访问可以不配置
    pub private_key: Option<String>,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            contract_address: String::new(),
            private_key: None,
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: 60,
        }
    }
}

impl LedgerConfig {
    /// 从环境变量构建配置
    ///
    /// - Panics
    ///
    /// `LEDGER_RPC_URL` 或 `ARTICLE_CONTRACT_ADDRESS` 未设置时 panic；
    /// `LEDGER_PRIVATE_KEY` 可选。
    pub fn from_env() -> Self {
        Self {
            rpc_url: env::var("LEDGER_RPC_URL").expect("LEDGER_RPC_URL not set"),
            contract_address: env::var("ARTICLE_CONTRACT_ADDRESS")
                .expect("ARTICLE_CONTRACT_ADDRESS not set"),
            private_key: env::var("LEDGER_PRIVATE_KEY").ok(),
            ..Default::default()
        }
    }
}

/// EVM 账本客户端
///
/// 每次操作创建独立的 provider，不维护连接状态。
#[derive(Clone)]
pub struct EvmLedger {
    contract_address: Address,
    config: LedgerConfig,
}

impl EvmLedger {
    /// 创建账本客户端，校验合约地址与私钥格式
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let contract_address = Address::from_str(&config.contract_address).map_err(|e| {
            Error::Ledger(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        if let Some(ref private_key) = config.private_key {
            let _ = private_key
                .parse::<PrivateKeySigner>()
                .map_err(|e| Error::Ledger(format!("Invalid private key: {}", e)))?;
        }

        Ok(Self {
            contract_address,
            config,
        })
    }

    /// 创建只读 provider
    fn create_provider(&self) -> Result<impl Provider> {
        let rpc_url = self
            .config
            .rpc_url
            .parse()
            .map_err(|e| Error::Ledger(format!("Invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new().connect_http(rpc_url))
    }

    /// 创建携带签名钱包的 provider，用于发送交易
    fn create_provider_with_signer(&self) -> Result<impl Provider> {
        let private_key = self
            .config
            .private_key
            .as_ref()
            .ok_or_else(|| Error::Ledger("No private key configured".to_string()))?;

        let signer = private_key
            .parse::<PrivateKeySigner>()
            .map_err(|e| Error::Ledger(format!("Invalid private key: {}", e)))?;

        let wallet = EthereumWallet::from(signer);

        let rpc_url = self
            .config
            .rpc_url
            .parse()
            .map_err(|e| Error::Ledger(format!("Invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new().wallet(wallet).connect_http(rpc_url))
    }
}

fn format_tx_hash(hash: TxHash) -> String {
    format!("0x{:x}", hash)
}

fn parse_tx_hash(s: &str) -> Result<TxHash> {
    TxHash::from_str(s)
        .map_err(|e| Error::Ledger(format!("Invalid transaction hash '{}': {}", s, e)))
}

impl Ledger for EvmLedger {
    async fn article_count(&self) -> Result<u64> {
        let provider = self.create_provider()?;
        let contract = KnowledgeHub::new(self.contract_address, &provider);

        let count = contract
            .articleCount()
            .call()
            .await
            .map_err(|e| Error::Ledger(e.to_string()))?;

        Ok(count.to::<u64>())
    }

    async fn submit_article(&self, title: &str, ipfs_hash: &str) -> Result<String> {
        let provider = self.create_provider_with_signer()?;
        let contract = KnowledgeHub::new(self.contract_address, &provider);

        let pending = contract
            .publishArticle(title.to_string(), ipfs_hash.to_string())
            .send()
            .await
            .map_err(|e| Error::Ledger(e.to_string()))?;

        let tx_hash = format_tx_hash(*pending.tx_hash());
        tracing::info!(%tx_hash, "publish transaction sent");
        Ok(tx_hash)
    }

    async fn confirm(&self, tx_hash: &str) -> Result<bool> {
        let hash = parse_tx_hash(tx_hash)?;
        let provider = self.create_provider()?;

        for _ in 0..self.config.max_poll_attempts {
            let receipt = provider
                .get_transaction_receipt(hash)
                .await
                .map_err(|e| Error::Ledger(e.to_string()))?;

            if let Some(receipt) = receipt {
                return Ok(receipt.status());
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }

        Err(Error::Ledger(format!(
            "transaction {} not confirmed after {} attempts",
            tx_hash, self.config.max_poll_attempts
        )))
    }

    async fn article_at(&self, index: u64) -> Result<Option<LedgerArticle>> {
        let provider = self.create_provider()?;
        let contract = KnowledgeHub::new(self.contract_address, &provider);

        let count = contract
            .articleCount()
            .call()
            .await
            .map_err(|e| Error::Ledger(e.to_string()))?;

        if U256::from(index) >= count {
            return Ok(None);
        }

        let article = contract
            .getArticle(U256::from(index))
            .call()
            .await
            .map_err(|e| Error::Ledger(e.to_string()))?;

        Ok(Some(LedgerArticle {
            author: article.author.to_string(),
            ipfs_hash: article.ipfsHash,
            title: article.title,
            timestamp: article.timestamp.to::<u64>(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LedgerConfig {
        LedgerConfig {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            private_key: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_ledger_creation() {
        assert!(EvmLedger::new(test_config()).is_ok());
    }

    #[test]
    fn test_invalid_contract_address() {
        let mut config = test_config();
        config.contract_address = "invalid".to_string();
        assert!(EvmLedger::new(config).is_err());
    }

    #[test]
    fn test_invalid_private_key() {
        let mut config = test_config();
        config.private_key = Some("not-a-key".to_string());
        assert!(EvmLedger::new(config).is_err());
    }

    #[test]
    fn test_tx_hash_round_trip() {
        let hash = TxHash::from([7u8; 32]);
        let formatted = format_tx_hash(hash);
        assert!(formatted.starts_with("0x"));
        assert_eq!(parse_tx_hash(&formatted).unwrap(), hash);
        assert!(parse_tx_hash("0x123").is_err());
    }
}
