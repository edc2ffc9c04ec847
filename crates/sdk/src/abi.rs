//! Bindings of the exchange contracts, limited to the functions and events the
//! SDK uses.

#![allow(clippy::too_many_arguments)]

pub mod mangrove {
    alloy::sol! {
        /// Offer list key: outbound token is what makers give.
        struct OLKey {
            address outbound_tkn;
            address inbound_tkn;
            uint256 tickSpacing;
        }

        /// Unordered pair of tokens with a tick spacing.
        struct Market {
            address tkn0;
            address tkn1;
            uint256 tickSpacing;
        }

        struct LocalUnpacked {
            bool active;
            uint256 fee;
            uint256 density;
            uint256 binPosInLeaf;
            uint256 level3;
            uint256 level2;
            uint256 level1;
            uint256 root;
            uint256 kilo_offer_gasbase;
            bool lock;
            uint256 last;
        }

        struct MarketConfig {
            LocalUnpacked config01;
            LocalUnpacked config10;
        }

        struct OfferUnpacked {
            uint256 prev;
            uint256 next;
            int256 tick;
            uint256 gives;
        }

        struct OfferDetailUnpacked {
            address maker;
            uint256 gasreq;
            uint256 kilo_offer_gasbase;
            uint256 gasprice;
        }

        #[sol(rpc)]
        contract Mangrove {
            event OfferWrite(
                bytes32 indexed olKeyHash,
                address indexed maker,
                int256 tick,
                uint256 gives,
                uint256 gasprice,
                uint256 gasreq,
                uint256 id
            );

            event OfferRetract(
                bytes32 indexed olKeyHash,
                address indexed maker,
                uint256 id,
                bool deprovision
            );

            function marketOrderByVolume(
                OLKey memory olKey,
                uint256 takerWants,
                uint256 takerGives,
                bool fillWants
            ) external returns (uint256 takerGot, uint256 takerGave, uint256 bounty, uint256 feePaid);

            function newOfferByVolume(
                OLKey memory olKey,
                uint256 wants,
                uint256 gives,
                uint256 gasreq,
                uint256 gasprice
            ) external payable returns (uint256 offerId);

            function retractOffer(
                OLKey memory olKey,
                uint256 offerId,
                bool deprovision
            ) external returns (uint256 provision);
        }

        #[sol(rpc)]
        contract MgvReader {
            function numOpenMarkets() external view returns (uint256);

            function openMarkets(uint256 from, uint256 maxLen, bool withConfig)
                external
                view
                returns (Market[] memory markets, MarketConfig[] memory configs);

            function isMarketOpen(Market memory market) external view returns (bool);

            function offerList(OLKey memory olKey, uint256 fromId, uint256 maxOffers)
                external
                view
                returns (
                    uint256 nextId,
                    uint256[] memory offerIds,
                    OfferUnpacked[] memory offers,
                    OfferDetailUnpacked[] memory details
                );

            function getProvisionWithDefaultGasPrice(OLKey memory olKey, uint256 gasreq)
                external
                view
                returns (uint256);
        }
    }
}

pub mod erc20 {
    alloy::sol! {
        #[sol(rpc)]
        contract IERC20 {
            function symbol() external view returns (string);
            function decimals() external view returns (uint8);
            function balanceOf(address owner) external view returns (uint256);
            function approve(address spender, uint256 amount) external returns (bool);
        }
    }
}
