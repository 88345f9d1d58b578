//! Command line interface for the `tokenproof` reference binary.

use clap::{Parser, ValueEnum};
use ethers::types::H160;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct AppArgs {
    /// web3 RPC endpoint URL
    #[clap(long, default_value_t = Url::parse("https://web3.dappnode.net").expect("built-in default is a valid URL"))]
    pub web3: Url,
    /// ERC20 contract address
    #[clap(long)]
    pub contract: H160,
    /// Address of the token holder
    #[clap(long)]
    pub holder: H160,
    /// ERC20 storage layout
    #[clap(long, value_enum, default_value_t = TokenType::Mapbased)]
    pub r#type: TokenType,
    /// Ethereum block height (0 becomes the latest block)
    #[clap(long, default_value_t = 0)]
    pub height: u64,
}

/// The two storage layouts the reference binary knows how to prove, mirrored
/// from `tokenproof_types::Layout` since `clap::ValueEnum` needs its own
/// derive and this CLI's flag spelling (`mapbased`/`minime`) is its own
/// concern, not the data model's.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    Mapbased,
    Minime,
}

impl From<TokenType> for tokenproof_types::Layout {
    fn from(value: TokenType) -> Self {
        match value {
            TokenType::Mapbased => tokenproof_types::Layout::MapBased,
            TokenType::Minime => tokenproof_types::Layout::MiniMe,
        }
    }
}
