//! Solidity interfaces of the launchpad contracts.

use alloy_sol_types::sol;

sol! {
    /// Token factory. One deployment per chain.
    interface ITokenFactory {
        struct TokenConfig {
            string name;
            string symbol;
            string description;
            string imageUrl;
            address creator;
            uint256 totalSupply;
            uint256 createdAt;
        }

        /// Current creation event. Pool address is indexed so explorers can filter on it.
        event TokenCreated(
            address indexed token,
            address indexed creator,
            address indexed amm,
            string name,
            string symbol,
            uint256 totalSupply,
            uint256 timestamp
        );

        function createToken(
            string name,
            string symbol,
            string description,
            string imageUrl,
            string website,
            string twitter,
            string telegram
        ) external payable returns (address token, address amm);

        function getAllTokens() external view returns (address[]);
        function getTokenConfig(address token) external view returns (TokenConfig);
        function getTokenAMM(address token) external view returns (address);
        function isKnownToken(address token) external view returns (bool);
        function creationFee() external view returns (uint256);
    }

    /// Factories deployed before the pool address became indexed.
    interface ILegacyTokenFactory {
        event TokenCreated(
            address indexed token,
            address indexed creator,
            address amm,
            string name,
            string symbol
        );
    }

    /// Per-token bonding curve pool.
    interface IBondingPool {
        function buy(uint256 minTokensOut) external payable;
        function sell(uint256 tokenAmount, uint256 minEthOut) external;
        function getTradingInfo() external view returns (
            uint256 supply,
            uint256 price,
            uint256 volume,
            uint256 graduationProgress,
            bool isGraduated
        );
        function quoteBuy(uint256 ethIn, uint256 supply) external view returns (uint256);
        function quoteSell(uint256 tokensIn, uint256 supply) external view returns (uint256);
        function priceImpact(uint256 amount, bool isBuy) external view returns (uint256);
    }

    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
    }
}
