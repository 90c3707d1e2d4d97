//! Bindings for the mint contract

use ethers::abi::AbiEncode;
use ethers::prelude::*;

abigen!(
    MintContract,
    r#"[
        function balanceOf(address owner) external view returns (uint256)
        function getPrice() external view returns (uint256)
        function safeMint(address referral) external payable
    ]"#
);

/// Calldata for `safeMint(referral)`
pub fn encode_safe_mint(referral: Address) -> Bytes {
    Bytes::from(SafeMintCall { referral }.encode())
}
