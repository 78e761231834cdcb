use std::fmt::Debug;

use warp_intents_types::ActionKind;

pub const BASE_GAS: u64 = 3_000_000;
pub const CONTRACT_CALL_GAS: u64 = 300_000;
pub const TRANSFER_GAS: u64 = 50_000;
pub const QUERY_GAS: u64 = 100_000;
pub const GAS_PER_DATA_BYTE: u64 = 10;

/// Gas limit for transactions whose actions do not declare one
pub trait GasEstimator: Send + Sync + Debug {
    /// Estimate for a payload of `payload_len` bytes covering `kinds`
    fn estimate(&self, kinds: &[ActionKind], payload_len: usize) -> u64;
}

/// `base + Σ per-kind + per-byte * payload length`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearGasEstimator {
    pub base: u64,
    pub contract_call: u64,
    pub transfer: u64,
    pub query: u64,
    pub per_byte: u64,
}

impl Default for LinearGasEstimator {
    fn default() -> Self {
        Self {
            base: BASE_GAS,
            contract_call: CONTRACT_CALL_GAS,
            transfer: TRANSFER_GAS,
            query: QUERY_GAS,
            per_byte: GAS_PER_DATA_BYTE,
        }
    }
}

impl LinearGasEstimator {
    fn per_action(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::ContractCall => self.contract_call,
            ActionKind::Transfer => self.transfer,
            ActionKind::Query => self.query,
        }
    }
}

impl GasEstimator for LinearGasEstimator {
    fn estimate(&self, kinds: &[ActionKind], payload_len: usize) -> u64 {
        let actions: u64 = kinds.iter().map(|k| self.per_action(*k)).sum();
        self.base
            .saturating_add(actions)
            .saturating_add(self.per_byte.saturating_mul(payload_len as u64))
    }
}
