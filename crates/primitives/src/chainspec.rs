use crate::Signer;

/// The subset of chain parameters this pipeline needs: the chain ID and the activation heights
/// of the forks that change sender recovery or the reward schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    /// Chain ID used by EIP-155 replay protection.
    pub chain_id: u64,
    /// Homestead switch block.
    pub homestead_block: Option<u64>,
    /// EIP-155 (Spurious Dragon) switch block.
    pub eip155_block: Option<u64>,
    /// Byzantium switch block.
    pub byzantium_block: Option<u64>,
    /// Constantinople switch block.
    pub constantinople_block: Option<u64>,
}

/// The Ethereum mainnet schedule.
pub const MAINNET: ChainSpec = ChainSpec {
    chain_id: 1,
    homestead_block: Some(1_150_000),
    eip155_block: Some(2_675_000),
    byzantium_block: Some(4_370_000),
    constantinople_block: Some(7_280_000),
};

impl ChainSpec {
    /// Returns a spec with every fork active from genesis, for chains that launched past
    /// Constantinople.
    pub const fn all_forks_active(chain_id: u64) -> Self {
        Self {
            chain_id,
            homestead_block: Some(0),
            eip155_block: Some(0),
            byzantium_block: Some(0),
            constantinople_block: Some(0),
        }
    }

    const fn active(fork_block: Option<u64>, block_number: u64) -> bool {
        matches!(fork_block, Some(fork) if fork <= block_number)
    }

    /// Whether homestead rules are active at the given block.
    pub const fn is_homestead_active_at_block(&self, block_number: u64) -> bool {
        Self::active(self.homestead_block, block_number)
    }

    /// Whether EIP-155 replay protection is active at the given block.
    pub const fn is_eip155_active_at_block(&self, block_number: u64) -> bool {
        Self::active(self.eip155_block, block_number)
    }

    /// Whether byzantium rules are active at the given block.
    pub const fn is_byzantium_active_at_block(&self, block_number: u64) -> bool {
        Self::active(self.byzantium_block, block_number)
    }

    /// Whether constantinople rules are active at the given block.
    pub const fn is_constantinople_active_at_block(&self, block_number: u64) -> bool {
        Self::active(self.constantinople_block, block_number)
    }

    /// The sender-recovery scheme active at the given block.
    pub const fn signer(&self, block_number: u64) -> Signer {
        if self.is_eip155_active_at_block(block_number) {
            Signer::Eip155 { chain_id: self.chain_id }
        } else if self.is_homestead_active_at_block(block_number) {
            Signer::Homestead
        } else {
            Signer::Frontier
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_signer_schedule() {
        assert_eq!(MAINNET.signer(0), Signer::Frontier);
        assert_eq!(MAINNET.signer(1_149_999), Signer::Frontier);
        assert_eq!(MAINNET.signer(1_150_000), Signer::Homestead);
        assert_eq!(MAINNET.signer(2_674_999), Signer::Homestead);
        assert_eq!(MAINNET.signer(2_675_000), Signer::Eip155 { chain_id: 1 });
    }

    #[test]
    fn mainnet_reward_eras() {
        assert!(!MAINNET.is_byzantium_active_at_block(4_369_999));
        assert!(MAINNET.is_byzantium_active_at_block(4_370_000));
        assert!(!MAINNET.is_constantinople_active_at_block(7_279_999));
        assert!(MAINNET.is_constantinople_active_at_block(7_280_000));
    }

    #[test]
    fn all_forks_active_spec() {
        let spec = ChainSpec::all_forks_active(1337);
        assert_eq!(spec.signer(0), Signer::Eip155 { chain_id: 1337 });
        assert!(spec.is_constantinople_active_at_block(0));
    }
}
