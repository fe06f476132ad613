//! Table slot pool and per-slot route reference counts.
//!
//! A slot pairs one interface with one secondary routing table. Slots are
//! keyed by the exact interface name; a slot's index, and therefore its
//! table id, stays fixed for as long as the interface has at least one
//! route in it.

use std::collections::{BTreeSet, HashMap};

use sectable_common::{TableMgrError, TableMgrResult};
use tracing::{debug, info};

use crate::types::is_valid_ifname;

/// One occupied entry of the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSlot {
    /// Position in the pool, `0..capacity`
    pub index: usize,
    /// Interface holding the slot
    pub interface: String,
    /// Routes currently installed in the slot's table
    pub rule_count: u32,
}

/// Bounded interface -> slot map
#[derive(Debug, Clone)]
pub struct SlotRegistry {
    /// Interface name -> occupied slot
    slots: HashMap<String, TableSlot>,

    /// Slot indexes not held by any interface
    free: BTreeSet<usize>,

    capacity: usize,
    base_table: u32,
}

impl SlotRegistry {
    /// Create an empty pool of `capacity` slots whose tables start at `base_table`.
    ///
    /// Fails if the last table id of the pool does not fit in a `u32`.
    pub fn new(capacity: usize, base_table: u32) -> TableMgrResult<Self> {
        let last = u32::try_from(capacity.saturating_sub(1))
            .ok()
            .and_then(|span| base_table.checked_add(span));
        if last.is_none() {
            return Err(TableMgrError::invalid_config(
                "tables.capacity",
                "table id range overflows u32",
            ));
        }

        Ok(Self {
            slots: HashMap::with_capacity(capacity),
            free: (0..capacity).collect(),
            capacity,
            base_table,
        })
    }

    /// Pool size
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// External routing table id of a slot index.
    ///
    /// `index` must be below [`capacity`](Self::capacity).
    pub fn table_id(&self, index: usize) -> u32 {
        debug_assert!(index < self.capacity);
        // new() checked that the whole pool range fits in u32.
        self.base_table + index as u32
    }

    /// Exact-match lookup of the slot held by `name`
    pub fn find_slot(&self, name: &str) -> Option<&TableSlot> {
        self.slots.get(name)
    }

    /// Lowest free slot index, if any
    pub fn find_free_slot(&self) -> Option<usize> {
        self.free.iter().next().copied()
    }

    /// Assign the lowest free slot to `name`.
    ///
    /// The new slot starts with a zero rule count; the caller is expected to
    /// [`increment`](Self::increment) it in the same step. Names that cannot
    /// name a kernel interface are rejected and never stored.
    pub fn allocate(&mut self, name: &str) -> TableMgrResult<usize> {
        if !is_valid_ifname(name) {
            return Err(TableMgrError::invalid_interface(name));
        }
        if let Some(slot) = self.slots.get(name) {
            return Ok(slot.index);
        }

        let index = self
            .find_free_slot()
            .ok_or_else(|| TableMgrError::resource_exhausted(name))?;
        self.free.remove(&index);
        self.slots.insert(
            name.to_string(),
            TableSlot {
                index,
                interface: name.to_string(),
                rule_count: 0,
            },
        );

        info!(
            "Allocated slot {} (table {}) to {}",
            index,
            self.table_id(index),
            name
        );
        Ok(index)
    }

    /// Count one more route in `name`'s table
    pub fn increment(&mut self, name: &str) {
        if let Some(slot) = self.slots.get_mut(name) {
            slot.rule_count += 1;
            debug!("{} now has {} routes", slot.interface, slot.rule_count);
        }
    }

    /// Count one route fewer in `name`'s table.
    ///
    /// The count never goes below zero; reaching zero frees the slot.
    /// Returns true if the slot was freed.
    pub fn decrement(&mut self, name: &str) -> bool {
        let Some(slot) = self.slots.get_mut(name) else {
            return false;
        };

        slot.rule_count = slot.rule_count.saturating_sub(1);
        if slot.rule_count > 0 {
            debug!("{} now has {} routes", slot.interface, slot.rule_count);
            return false;
        }

        let index = slot.index;
        self.slots.remove(name);
        self.free.insert(index);
        info!(
            "Released slot {} (table {}) from {}",
            index,
            self.table_id(index),
            name
        );
        true
    }

    /// Number of interfaces holding a slot
    pub fn occupied_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots available for allocation
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Occupied slots ordered by index
    pub fn occupied(&self) -> Vec<&TableSlot> {
        let mut slots: Vec<&TableSlot> = self.slots.values().collect();
        slots.sort_by_key(|s| s.index);
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BASE_TABLE_NUMBER, INTERFACES_TRACKED};

    fn registry() -> SlotRegistry {
        SlotRegistry::new(INTERFACES_TRACKED, BASE_TABLE_NUMBER).unwrap()
    }

    #[test]
    fn test_new_registry_is_empty() {
        let reg = registry();
        assert_eq!(reg.capacity(), INTERFACES_TRACKED);
        assert_eq!(reg.free_count(), INTERFACES_TRACKED);
        assert_eq!(reg.occupied_count(), 0);
        assert_eq!(reg.find_free_slot(), Some(0));
    }

    #[test]
    fn test_allocate_lowest_free() {
        let mut reg = registry();
        assert_eq!(reg.allocate("wlan0").unwrap(), 0);
        assert_eq!(reg.allocate("rmnet0").unwrap(), 1);
        assert_eq!(reg.table_id(1), BASE_TABLE_NUMBER + 1);
        assert_eq!(reg.find_slot("rmnet0").map(|s| s.index), Some(1));
    }

    #[test]
    fn test_allocate_existing_is_stable() {
        let mut reg = registry();
        reg.allocate("wlan0").unwrap();
        assert_eq!(reg.allocate("wlan0").unwrap(), 0);
        assert_eq!(reg.occupied_count(), 1);
    }

    #[test]
    fn test_find_slot_exact_match() {
        let mut reg = registry();
        reg.allocate("wlan0").unwrap();
        assert!(reg.find_slot("wlan").is_none());
        assert!(reg.find_slot("wlan01").is_none());
        assert!(reg.find_slot("").is_none());
    }

    #[test]
    fn test_exhaustion() {
        let mut reg = SlotRegistry::new(2, 100).unwrap();
        reg.allocate("a").unwrap();
        reg.allocate("b").unwrap();

        let err = reg.allocate("c").unwrap_err();
        assert!(matches!(err, TableMgrError::ResourceExhausted { .. }));
        assert_eq!(reg.occupied_count(), 2);
        assert!(reg.find_slot("c").is_none());
    }

    #[test]
    fn test_find_slot_does_not_match_shared_prefix() {
        let mut reg = registry();
        reg.allocate("tethering_ifa_A").unwrap();

        assert!(reg.find_slot("tethering_ifa_B").is_none());
        assert!(reg.find_slot("tethering_ifa_A0").is_none());
        assert!(reg.find_slot("tethering_ifa_").is_none());

        reg.increment("tethering_ifa_B");
        assert!(!reg.decrement("tethering_ifa_B"));
        assert_eq!(reg.find_slot("tethering_ifa_A").unwrap().rule_count, 0);
        assert_eq!(reg.occupied_count(), 1);
    }

    #[test]
    fn test_allocate_rejects_invalid_names() {
        let mut reg = registry();

        let err = reg.allocate("tethering_iface_A").unwrap_err();
        assert!(matches!(err, TableMgrError::InvalidInterface { .. }));
        let err = reg.allocate("").unwrap_err();
        assert!(matches!(err, TableMgrError::InvalidInterface { .. }));
        assert_eq!(reg.occupied_count(), 0);
        assert_eq!(reg.free_count(), INTERFACES_TRACKED);
    }

    #[test]
    fn test_new_rejects_table_overflow() {
        let err = SlotRegistry::new(2, u32::MAX).unwrap_err();
        assert!(matches!(err, TableMgrError::InvalidConfig { .. }));

        let reg = SlotRegistry::new(1, u32::MAX).unwrap();
        assert_eq!(reg.table_id(0), u32::MAX);

        let reg = SlotRegistry::new(0, u32::MAX).unwrap();
        assert_eq!(reg.find_free_slot(), None);
    }

    #[test]
    fn test_refcount_release() {
        let mut reg = registry();
        reg.allocate("wlan0").unwrap();
        reg.increment("wlan0");
        reg.increment("wlan0");
        assert_eq!(reg.find_slot("wlan0").unwrap().rule_count, 2);

        assert!(!reg.decrement("wlan0"));
        assert_eq!(reg.find_slot("wlan0").unwrap().rule_count, 1);

        assert!(reg.decrement("wlan0"));
        assert!(reg.find_slot("wlan0").is_none());
        assert_eq!(reg.free_count(), INTERFACES_TRACKED);
    }

    #[test]
    fn test_decrement_zero_count_frees_without_underflow() {
        let mut reg = registry();
        reg.allocate("usb0").unwrap();
        assert!(reg.decrement("usb0"));
        assert!(!reg.decrement("usb0"));
        assert_eq!(reg.occupied_count(), 0);
    }

    #[test]
    fn test_released_index_reused_by_other_interface() {
        let mut reg = registry();
        reg.allocate("wlan0").unwrap();
        reg.increment("wlan0");
        reg.allocate("rmnet0").unwrap();
        reg.decrement("wlan0");

        assert_eq!(reg.allocate("usb0").unwrap(), 0);
        let order: Vec<&str> = reg
            .occupied()
            .iter()
            .map(|s| s.interface.as_str())
            .collect();
        assert_eq!(order, vec!["usb0", "rmnet0"]);
    }
}
