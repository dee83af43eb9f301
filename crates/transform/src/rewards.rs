//! The fixed Ethereum mining reward schedule.

use alloy_primitives::U256;
use indexer_primitives::ChainSpec;

/// Amount of Wei in one Ether.
const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// The base miner reward of the era `block_number` falls in: 5 Ether until byzantium, 3 Ether
/// until constantinople, 2 Ether afterwards.
pub fn base_block_reward(chain_spec: &ChainSpec, block_number: u64) -> U256 {
    let ether = if chain_spec.is_constantinople_active_at_block(block_number) {
        2
    } else if chain_spec.is_byzantium_active_at_block(block_number) {
        3
    } else {
        5
    };
    U256::from(ether * WEI_PER_ETHER)
}

/// The full miner reward for a block including `ommer_count` uncles: the era base reward plus
/// 1/32 of it per included uncle.
pub fn block_reward(base_block_reward: U256, ommer_count: usize) -> U256 {
    base_block_reward + (base_block_reward >> 5) * U256::from(ommer_count)
}

/// The reward paid to the miner of an uncle included at `block_number`:
/// `(ommer_number + 8 - block_number) * base / 8`.
///
/// An uncle deeper than eight blocks earns nothing; consensus rules keep real uncles within
/// six blocks of their nephew.
pub fn ommer_reward(base_block_reward: U256, block_number: u64, ommer_number: u64) -> U256 {
    let depth = block_number.saturating_sub(ommer_number);
    if depth >= 8 {
        return U256::ZERO
    }
    (U256::from(8 - depth) * base_block_reward) >> 3
}
