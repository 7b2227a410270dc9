//! Bid-slot value ladder
//!
//! Slot values follow a pseudo-exponential curve: the value doubles every
//! `slots_per_price_double` slots and interpolates linearly inside each
//! doubling band. Strict monotonicity between adjacent slots holds
//! whenever the base price is at least `slots_per_price_double` wei, which
//! every real auction configuration clears by many orders of magnitude.

use ethers_core::types::U256;

use crate::types::RamConfig;

/// Value of `slot_index` for an auction starting at `base_price`.
///
/// `value = base << (slot / K)`, plus `value * (slot % K) / K` within the
/// band, where `K = slots_per_price_double`.
pub fn slot_index_to_bid_value(config: &RamConfig, base_price: U256, slot_index: u16) -> U256 {
    let k = u64::from(config.slots_per_price_double);
    let doublings = u64::from(slot_index) / k;
    let within_band = u64::from(slot_index) % k;

    let band_base = base_price << doublings;
    band_base + band_base * U256::from(within_band) / U256::from(k)
}

/// Smallest slot whose value is at least `bid_value`, or `None` when the
/// value exceeds the top of the ladder.
pub fn nearest_slot_for_bid_value(
    config: &RamConfig,
    base_price: U256,
    bid_value: U256,
) -> Option<u16> {
    if config.num_slots == 0 {
        return None;
    }
    let top = config.num_slots - 1;
    if slot_index_to_bid_value(config, base_price, top) < bid_value {
        return None;
    }

    // the ladder is monotone, so binary-search the first satisfying slot
    let (mut low, mut high) = (0u16, top);
    while low < high {
        let mid = low + (high - low) / 2;
        if slot_index_to_bid_value(config, base_price, mid) >= bid_value {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    Some(low)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RamConfig {
        RamConfig::default()
    }

    fn base() -> U256 {
        // 0.25 ether
        U256::exp10(18) / U256::from(4)
    }

    #[test]
    fn slot_zero_is_the_base_price() {
        assert_eq!(slot_index_to_bid_value(&config(), base(), 0), base());
    }

    #[test]
    fn value_doubles_every_band() {
        let cfg = config();
        for band in 1..(cfg.num_slots / cfg.slots_per_price_double) {
            let slot = band * cfg.slots_per_price_double;
            assert_eq!(
                slot_index_to_bid_value(&cfg, base(), slot),
                base() << u64::from(band),
                "band {band}"
            );
        }
    }

    #[test]
    fn values_are_strictly_increasing() {
        let cfg = config();
        let mut previous = None;
        for slot in 0..cfg.num_slots {
            let value = slot_index_to_bid_value(&cfg, base(), slot);
            if let Some(previous) = previous {
                assert!(value > previous, "slot {slot} did not increase");
            }
            previous = Some(value);
        }
    }

    #[test]
    fn nearest_slot_round_trips_exact_values() {
        let cfg = config();
        for slot in [0u16, 1, 63, 64, 65, 200, 511] {
            let value = slot_index_to_bid_value(&cfg, base(), slot);
            assert_eq!(nearest_slot_for_bid_value(&cfg, base(), value), Some(slot));
        }
    }

    #[test]
    fn nearest_slot_rounds_up_between_rungs() {
        let cfg = config();
        let between = slot_index_to_bid_value(&cfg, base(), 10) + U256::one();
        assert_eq!(nearest_slot_for_bid_value(&cfg, base(), between), Some(11));
    }

    #[test]
    fn values_above_the_ladder_have_no_slot() {
        let cfg = config();
        let top = slot_index_to_bid_value(&cfg, base(), cfg.num_slots - 1);
        assert_eq!(nearest_slot_for_bid_value(&cfg, base(), top + U256::one()), None);
    }
}
