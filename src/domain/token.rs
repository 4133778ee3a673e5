//! Token metadata.

use crate::domain::Address;
use serde::{Deserialize, Serialize};

/// ERC-20 style token metadata. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: String, name: String, decimals: u8) -> Self {
        Token {
            address,
            symbol,
            name,
            decimals,
        }
    }

    /// Placeholder for tokens whose metadata reads failed.
    ///
    /// Assumes 18 decimals, the common default, so amounts stay usable.
    pub fn unknown(address: Address) -> Self {
        Token {
            address,
            symbol: "???".to_string(),
            name: "Unknown Token".to_string(),
            decimals: 18,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.symbol == "???" && self.name == "Unknown Token"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_token_sentinel() {
        let t = Token::unknown(Address::repeat_byte(1));
        assert!(t.is_unknown());
        assert_eq!(t.decimals, 18);

        let real = Token::new(
            Address::repeat_byte(1),
            "USDC".to_string(),
            "USD Coin".to_string(),
            6,
        );
        assert!(!real.is_unknown());
    }
}
