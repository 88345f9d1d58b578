//! The live RPC transport: `EthersRpcClient` wraps `ethers::providers::Provider<Http>`
//! for every call it already has a convenience wrapper for. `eth_getProof` has
//! no first-class binding in the pinned `ethers` version, so it goes out via
//! the provider's generic `request` (the lower-level JSON-RPC call ethers
//! exposes for exactly this case), rather than reimplementing the framing by
//! hand.

use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider, ProviderError},
    types::{Block, BlockId, BlockNumber, Bytes, EIP1186ProofResponse, TransactionRequest, H160, H256, U64},
};
use tokenproof_types::{BlockHeader, BlockTag, EthRpcClient, RpcError, StorageProof, StorageResult};
use url::Url;

/// Every RPC round trip carries this deadline unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct EthersRpcClient {
    provider: Provider<Http>,
    timeout: Duration,
}

impl EthersRpcClient {
    pub fn new(endpoint: Url) -> Result<Self, RpcError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: Url, timeout: Duration) -> Result<Self, RpcError> {
        let provider = Provider::<Http>::try_from(endpoint.to_string())
            .map_err(|e| RpcError::RpcFailure(e.to_string()))?;
        Ok(Self { provider, timeout })
    }

    async fn with_deadline<F, T>(&self, fut: F) -> Result<T, RpcError>
    where
        F: std::future::Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(RpcError::RpcFailure(e.to_string())),
            Err(_) => Err(RpcError::Cancelled),
        }
    }
}

fn to_block_id(tag: BlockTag) -> BlockId {
    match tag {
        BlockTag::Latest => BlockId::Number(BlockNumber::Latest),
        BlockTag::Pending => BlockId::Number(BlockNumber::Pending),
        BlockTag::Number(n) => BlockId::Number(BlockNumber::Number(U64::from(n))),
    }
}

#[async_trait]
impl EthRpcClient for EthersRpcClient {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        let id = self.with_deadline(self.provider.get_chainid()).await?;
        Ok(id.as_u64())
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        let n = self.with_deadline(self.provider.get_block_number()).await?;
        Ok(n.as_u64())
    }

    async fn block_by_number(&self, tag: BlockTag) -> Result<BlockHeader, RpcError> {
        let block: Option<Block<H256>> = self
            .with_deadline(self.provider.get_block(to_block_id(tag)))
            .await?;
        let block = block.ok_or_else(|| RpcError::RpcFailure("block not found".to_string()))?;
        let number = block
            .number
            .ok_or_else(|| RpcError::RpcFailure("pending block has no number".to_string()))?;
        Ok(BlockHeader {
            number: number.as_u64(),
            state_root: block.state_root,
        })
    }

    async fn storage_at(&self, address: H160, slot: H256, tag: BlockTag) -> Result<H256, RpcError> {
        self.with_deadline(
            self.provider
                .get_storage_at(address, slot, Some(to_block_id(tag))),
        )
        .await
    }

    async fn get_proof(
        &self,
        address: H160,
        slots: &[H256],
        tag: BlockTag,
    ) -> Result<StorageProof, RpcError> {
        let params = (address, slots.to_vec(), to_block_id(tag));
        let response: EIP1186ProofResponse = tokio::time::timeout(
            self.timeout,
            self.provider.request("eth_getProof", params),
        )
        .await
        .map_err(|_| RpcError::Cancelled)?
        .map_err(|e: ProviderError| RpcError::RpcFailure(e.to_string()))?;

        let header = self.block_by_number(tag).await?;
        Ok(StorageProof {
            state_root: header.state_root,
            height: header.number,
            address: response.address,
            account_proof: response.account_proof,
            balance: response.balance,
            nonce: response.nonce,
            code_hash: response.code_hash,
            storage_hash: response.storage_hash,
            storage: response
                .storage_proof
                .into_iter()
                .map(|sp| StorageResult {
                    key: sp.key,
                    value: sp.value,
                    proof: sp.proof,
                })
                .collect(),
        })
    }

    async fn call(&self, to: H160, data: Bytes, tag: BlockTag) -> Result<Bytes, RpcError> {
        let tx: ethers::types::transaction::eip2718::TypedTransaction =
            TransactionRequest::new().to(to).data(data).into();
        self.with_deadline(self.provider.call(&tx, Some(to_block_id(tag))))
            .await
    }
}
