//! The slice of the pair and ERC-20 ABI this service speaks.

use super::LedgerError;
use alloy_sol_types::{sol, SolCall};

sol! {
    #[derive(Debug)]
    interface IUniswapV2Pair {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Sync(uint112 reserve0, uint112 reserve1);
        event Mint(address indexed sender, uint256 amount0, uint256 amount1);
        event Burn(address indexed sender, uint256 amount0, uint256 amount1, address indexed to);

        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
    }

    interface IERC20Metadata {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
    }
}

/// Decode and validate a call's return data.
///
/// Malformed data (including the empty return of an account without code)
/// is `Undecodable`, which callers treat like a revert.
pub fn decode_returns<C: SolCall>(data: &[u8]) -> Result<C::Return, LedgerError> {
    C::abi_decode_returns_validate(data).map_err(|e| {
        LedgerError::Undecodable(format!("{}: {}", C::SIGNATURE, e))
    })
}

/// Decode a `string` return, accepting the legacy `bytes32` form some
/// older tokens use for name/symbol.
pub fn decode_text<C: SolCall<Return = String>>(data: &[u8]) -> Result<String, LedgerError> {
    if data.len() == 32 {
        let end = data.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        return Ok(String::from_utf8_lossy(&data[..end]).into_owned());
    }
    decode_returns::<C>(data)
}

#[cfg(test)]
mod tests {
    use super::IERC20Metadata::{decimalsCall, symbolCall};
    use super::IUniswapV2Pair::{balanceOfCall, token0Call, Transfer};
    use super::*;
    use alloy_primitives::{b256, Address, U256};
    use alloy_sol_types::{SolEvent, SolValue};

    #[test]
    fn test_signatures_match_the_pair_abi() {
        assert_eq!(
            Transfer::SIGNATURE_HASH,
            b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
        );
        assert_eq!(
            IUniswapV2Pair::Sync::SIGNATURE_HASH,
            b256!("1c411e9a96e071241c2f21f7726b17ae89e3cab4c78be50e062b03a9fffbbad1")
        );
        assert_eq!(token0Call::SELECTOR, [0x0d, 0xfe, 0x16, 0x81]);
        assert_eq!(balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_balance_of_encodes_owner_word() {
        let wallet = Address::repeat_byte(0x11);
        let data = balanceOfCall { owner: wallet }.abi_encode();
        assert_eq!(data.len(), 36);
        assert_eq!(&data[16..], wallet.as_slice());
    }

    #[test]
    fn test_address_return_is_validated() {
        let token = Address::repeat_byte(0x42);
        assert_eq!(decode_returns::<token0Call>(&token.abi_encode()).unwrap(), token);
        assert!(decode_returns::<token0Call>(&[0xff; 32]).unwrap_err().is_revert());
        assert!(decode_returns::<token0Call>(&[]).unwrap_err().is_revert());
    }

    #[test]
    fn test_decode_text_handles_both_forms() {
        let encoded = "Wrapped Ether".to_string().abi_encode();
        assert_eq!(decode_text::<symbolCall>(&encoded).unwrap(), "Wrapped Ether");

        let mut legacy = [0u8; 32];
        legacy[..3].copy_from_slice(b"MKR");
        assert_eq!(decode_text::<symbolCall>(&legacy).unwrap(), "MKR");

        assert!(decode_text::<symbolCall>(&[]).is_err());
    }

    #[test]
    fn test_decimals_out_of_range_is_undecodable() {
        assert_eq!(decode_returns::<decimalsCall>(&U256::from(6u64).abi_encode()).unwrap(), 6);
        assert!(decode_returns::<decimalsCall>(&U256::from(256u64).abi_encode()).is_err());
    }
}
