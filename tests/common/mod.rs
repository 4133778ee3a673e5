//! Fixtures for building a mock pair on top of `MockLedger`.
#![allow(dead_code)]

use alloy_primitives::aliases::U112;
use alloy_primitives::U256;
use alloy_sol_types::{SolEvent, SolValue};
use lplens::domain::{Address, TxHash};
use lplens::ledger::abi::IERC20Metadata::{decimalsCall, nameCall, symbolCall};
use lplens::ledger::abi::IUniswapV2Pair::{
    balanceOfCall, getReservesCall, token0Call, token1Call, totalSupplyCall, Burn, Mint, Sync,
    Transfer,
};
use lplens::ledger::{LogRecord, MockLedger};

pub const WALLET: u8 = 0x01;
pub const POOL: u8 = 0xaa;
pub const WETH: u8 = 0x10;
pub const USDC: u8 = 0x20;

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Lowercase hex, the form query strings and JSON bodies use.
pub fn addr_str(byte: u8) -> String {
    format!("{:#x}", addr(byte))
}

/// `n` whole units at `decimals` precision.
pub fn units(n: u64, decimals: usize) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(decimals))
}

fn record(pool: Address, event: &impl SolEvent, block: u64, tx: u8, log_index: u64) -> LogRecord {
    LogRecord {
        address: pool,
        data: event.encode_log_data(),
        block_number: block,
        transaction_hash: TxHash::repeat_byte(tx),
        log_index,
    }
}

pub fn transfer_log(
    pool: Address,
    from: Address,
    to: Address,
    value: U256,
    block: u64,
    tx: u8,
    log_index: u64,
) -> LogRecord {
    record(pool, &Transfer { from, to, value }, block, tx, log_index)
}

pub fn sync_log(pool: Address, r0: U256, r1: U256, block: u64, tx: u8, log_index: u64) -> LogRecord {
    let event = Sync {
        reserve0: U112::from(r0),
        reserve1: U112::from(r1),
    };
    record(pool, &event, block, tx, log_index)
}

pub fn mint_log(pool: Address, a0: U256, a1: U256, block: u64, tx: u8, log_index: u64) -> LogRecord {
    let event = Mint {
        sender: addr(0x77),
        amount0: a0,
        amount1: a1,
    };
    record(pool, &event, block, tx, log_index)
}

pub fn burn_log(
    pool: Address,
    a0: U256,
    a1: U256,
    to: Address,
    block: u64,
    tx: u8,
    log_index: u64,
) -> LogRecord {
    let event = Burn {
        sender: addr(0x77),
        amount0: a0,
        amount1: a1,
        to,
    };
    record(pool, &event, block, tx, log_index)
}

pub fn with_token(ledger: MockLedger, token: Address, symbol: &str, decimals: u8) -> MockLedger {
    ledger
        .with_call(token, nameCall {}, symbol.to_string().abi_encode())
        .with_call(token, symbolCall {}, symbol.to_string().abi_encode())
        .with_call(token, decimalsCall {}, <alloy_sol_types::sol_data::Uint<8> as alloy_sol_types::SolType>::abi_encode(&decimals))
}

/// Register the pair identity, reserves and supply reads for `pool`.
pub fn with_pair(
    ledger: MockLedger,
    pool: Address,
    token0: Address,
    token1: Address,
    reserves: (U256, U256),
    total_supply: U256,
) -> MockLedger {
    ledger
        .with_call(pool, token0Call {}, token0.abi_encode())
        .with_call(pool, token1Call {}, token1.abi_encode())
        .with_call(
            pool,
            getReservesCall {},
            (reserves.0, reserves.1, 0u32).abi_encode_params(),
        )
        .with_call(pool, totalSupplyCall {}, total_supply.abi_encode())
}

pub fn with_balance(ledger: MockLedger, token: Address, owner: Address, balance: U256) -> MockLedger {
    ledger.with_call(token, balanceOfCall { owner }, balance.abi_encode())
}

/// Share supply as of a past block.
pub fn with_supply_at(ledger: MockLedger, pool: Address, block: u64, supply: U256) -> MockLedger {
    use alloy_sol_types::SolCall;
    ledger.with_calldata(
        pool,
        totalSupplyCall {}.abi_encode(),
        Some(block),
        supply.abi_encode(),
    )
}

/// The WETH/USDC pair used across tests: 40 WETH and 18,000 USDC against
/// 100 shares, half of them held by the wallet.
pub fn weth_usdc_pair(ledger: MockLedger) -> MockLedger {
    let ledger = with_token(ledger, addr(WETH), "WETH", 18);
    let ledger = with_token(ledger, addr(USDC), "USDC", 6);
    let ledger = with_pair(
        ledger,
        addr(POOL),
        addr(WETH),
        addr(USDC),
        (units(40, 18), units(18_000, 6)),
        units(100, 18),
    );
    with_balance(ledger, addr(POOL), addr(WALLET), units(50, 18))
}

/// A single mint at block 100: 10 WETH and 20,000 USDC for 50 shares.
pub fn entry_mint_logs() -> Vec<LogRecord> {
    let pool = addr(POOL);
    vec![
        transfer_log(pool, Address::ZERO, addr(WALLET), units(50, 18), 100, 0x01, 0),
        sync_log(pool, units(20, 18), units(40_000, 6), 100, 0x01, 1),
        mint_log(pool, units(10, 18), units(20_000, 6), 100, 0x01, 2),
    ]
}
