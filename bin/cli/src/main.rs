//! Reference CLI: resolve a token holder's balance to a storage slot,
//! fetch an `eth_getProof` proof for it, and verify that proof against the
//! block's state root. Wiring order: token data, then balance, then slot
//! discovery, then block + proof, then verification.
//!
//! The ERC20 ABI calls (`balanceOf`, `decimals`) are hand-encoded here
//! rather than imported from a bindings crate, since ABI bindings are
//! explicitly out of scope for the verifying core — this binary is their
//! one external collaborator.

mod cli;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ethers::types::{Bytes, U256};
use log::info;
use tokenproof_discovery::{EthersRpcClient, TokenHandle, VerifiedBundle};
use tokenproof_types::{BlockTag, EthRpcClient, Layout};

use crate::cli::AppArgs;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = AppArgs::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: AppArgs) -> Result<()> {
    let client = EthersRpcClient::new(args.web3.clone()).context("constructing RPC client")?;
    let layout: Layout = args.r#type.into();

    let decimals = fetch_decimals(&client, args.contract).await?;
    let balance = fetch_balance_of(&client, args.contract, args.holder).await?;
    info!(
        "contract {:#x} holder {:#x} balance {}",
        args.contract,
        args.holder,
        tokenproof_token::to_decimal_string(balance, decimals)
    );
    if balance.is_zero() {
        bail!("no balance for holder");
    }

    let tag = if args.height == 0 {
        BlockTag::Latest
    } else {
        BlockTag::Number(args.height)
    };

    let handle = TokenHandle::discover(&client, args.contract, layout, args.holder, balance, tag)
        .await
        .context("discovering storage index slot")?;
    info!("discovered index slot {}", handle.index_slot);

    let header = client.block_by_number(tag).await.context("fetching block header")?;
    let (full_proof, bundle) = handle
        .get_proof(&client, args.holder, header.number, tag)
        .await
        .context("fetching storage proof")?;

    let verified = handle
        .verify(
            args.holder,
            full_proof.storage_hash,
            &bundle,
            balance,
            header.number,
        )
        .context("verifying storage proof")?;

    tokenproof_trie::account::verify_account_proof(
        full_proof.state_root,
        full_proof.address,
        full_proof.nonce,
        full_proof.balance,
        full_proof.storage_hash,
        full_proof.code_hash,
        &full_proof
            .account_proof
            .iter()
            .map(|b| b.to_vec())
            .collect::<Vec<_>>(),
    )
    .context("verifying account proof against block state root")?;

    match verified {
        VerifiedBundle::MapBased(verdict) => info!("mapbased proof: {verdict:?}"),
        VerifiedBundle::MiniMe(active, next) => {
            info!("minime active checkpoint: {active:?}, next checkpoint: {next:?}");
        }
    }
    println!("proof is valid at block {}", header.number);
    Ok(())
}

/// Hand-encodes and issues `decimals()`, falling back to `TokenData::UNKNOWN_*`
/// semantics (18) when the call reverts, since not every ERC20 implements it.
async fn fetch_decimals(client: &EthersRpcClient, contract: ethers::types::H160) -> Result<u8> {
    let selector = &ethers::utils::keccak256(b"decimals()")[0..4];
    let result = client
        .call(contract, Bytes::from(selector.to_vec()), BlockTag::Latest)
        .await;
    match result {
        Ok(bytes) if bytes.len() >= 32 => Ok(bytes[31]),
        _ => Ok(18),
    }
}

/// Hand-encodes and issues `balanceOf(address)`.
async fn fetch_balance_of(
    client: &EthersRpcClient,
    contract: ethers::types::H160,
    holder: ethers::types::H160,
) -> Result<U256> {
    let mut data = ethers::utils::keccak256(b"balanceOf(address)")[0..4].to_vec();
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(holder.as_bytes());
    let bytes = client
        .call(contract, Bytes::from(data), BlockTag::Latest)
        .await
        .context("calling balanceOf")?;
    Ok(U256::from_big_endian(&bytes))
}
