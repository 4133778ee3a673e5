//! Typed pair and token reads on top of [`LedgerClient::call`].

use super::abi::{self, IERC20Metadata, IUniswapV2Pair};
use super::{LedgerClient, LedgerError};
use crate::domain::{Address, Token};
use alloy_primitives::U256;
use alloy_sol_types::SolCall;
use tracing::debug;

async fn read<C: SolCall>(
    ledger: &dyn LedgerClient,
    to: &Address,
    call: C,
    block: Option<u64>,
) -> Result<C::Return, LedgerError> {
    let data = ledger.call(to, &call.abi_encode(), block).await?;
    abi::decode_returns::<C>(&data)
}

pub async fn token0(ledger: &dyn LedgerClient, pool: &Address) -> Result<Address, LedgerError> {
    read(ledger, pool, IUniswapV2Pair::token0Call {}, None).await
}

pub async fn token1(ledger: &dyn LedgerClient, pool: &Address) -> Result<Address, LedgerError> {
    read(ledger, pool, IUniswapV2Pair::token1Call {}, None).await
}

pub async fn balance_of(
    ledger: &dyn LedgerClient,
    token: &Address,
    owner: &Address,
) -> Result<U256, LedgerError> {
    read(ledger, token, IUniswapV2Pair::balanceOfCall { owner: *owner }, None).await
}

/// `(reserve0, reserve1)`; the trailing block timestamp is ignored.
pub async fn reserves(ledger: &dyn LedgerClient, pool: &Address) -> Result<(U256, U256), LedgerError> {
    let r = read(ledger, pool, IUniswapV2Pair::getReservesCall {}, None).await?;
    Ok((U256::from(r.reserve0), U256::from(r.reserve1)))
}

/// Total LP supply, optionally as of a past block.
pub async fn total_supply(
    ledger: &dyn LedgerClient,
    pool: &Address,
    block: Option<u64>,
) -> Result<U256, LedgerError> {
    read(ledger, pool, IUniswapV2Pair::totalSupplyCall {}, block).await
}

/// Token metadata; any failed read yields [`Token::unknown`].
pub async fn token_metadata(ledger: &dyn LedgerClient, token: Address) -> Token {
    let name_data = IERC20Metadata::nameCall {}.abi_encode();
    let symbol_data = IERC20Metadata::symbolCall {}.abi_encode();
    let (name, symbol, decimals) = tokio::join!(
        ledger.call(&token, &name_data, None),
        ledger.call(&token, &symbol_data, None),
        read(ledger, &token, IERC20Metadata::decimalsCall {}, None),
    );

    let decoded = (|| {
        Ok::<_, LedgerError>(Token::new(
            token,
            abi::decode_text::<IERC20Metadata::symbolCall>(&symbol?)?,
            abi::decode_text::<IERC20Metadata::nameCall>(&name?)?,
            decimals?,
        ))
    })();

    decoded.unwrap_or_else(|e| {
        debug!(token = %token, error = %e, "Token metadata unavailable, using placeholder");
        Token::unknown(token)
    })
}
