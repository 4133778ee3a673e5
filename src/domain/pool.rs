//! Constant-product pool state and a wallet's position in it.

use crate::domain::units::{format_units, LP_SHARE_DECIMALS};
use crate::domain::{Address, Token};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A two-asset constant-product pool as read at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub address: Address,
    pub token0: Token,
    pub token1: Token,
    pub reserve0_raw: U256,
    pub reserve1_raw: U256,
    pub total_supply_raw: U256,
}

impl Pool {
    /// Reserve of token0 in whole-token units.
    pub fn reserve0(&self) -> f64 {
        format_units(self.reserve0_raw, self.token0.decimals)
    }

    /// Reserve of token1 in whole-token units.
    pub fn reserve1(&self) -> f64 {
        format_units(self.reserve1_raw, self.token1.decimals)
    }

    pub fn total_supply(&self) -> f64 {
        format_units(self.total_supply_raw, LP_SHARE_DECIMALS)
    }

    /// Invariant k = reserve0 × reserve1 in token units.
    pub fn k(&self) -> f64 {
        self.reserve0() * self.reserve1()
    }
}

/// A wallet's live liquidity position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LpPosition {
    pub pool: Pool,
    pub wallet: Address,
    pub lp_balance_raw: U256,
    pub lp_balance: f64,
    /// balance / totalSupply, in [0, 1].
    pub share: f64,
    pub token0_amount: f64,
    pub token1_amount: f64,
}

impl LpPosition {
    /// Build a position from live pool state and the wallet's share balance.
    ///
    /// A zero total supply yields a zero share rather than a division by zero.
    pub fn new(pool: Pool, wallet: Address, lp_balance_raw: U256) -> Self {
        let lp_balance = format_units(lp_balance_raw, LP_SHARE_DECIMALS);
        let total = pool.total_supply();
        let share = if total > 0.0 { lp_balance / total } else { 0.0 };
        let token0_amount = pool.reserve0() * share;
        let token1_amount = pool.reserve1() * share;
        LpPosition {
            pool,
            wallet,
            lp_balance_raw,
            lp_balance,
            share,
            token0_amount,
            token1_amount,
        }
    }
}
