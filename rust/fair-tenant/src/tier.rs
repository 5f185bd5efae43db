use std::time::Duration;

use crate::{ActiveSlot, ConfigurationError, QueueName, SlotName};

/// A rerouting rule: once a tenant has submitted `threshold` jobs within
/// `window`, further jobs from that tenant go to `target_queue` until the
/// window lapses.
///
/// A tier with no slots applies to every job of its job type. A tier with
/// slots only applies to jobs headed for one of those slots, and counts them
/// per slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tier {
    target_queue: QueueName,
    threshold: u64,
    window: Duration,
    slots: Vec<SlotName>,
}

impl Tier {
    /// Counter stores keep expiries at millisecond precision, so `window` must
    /// be at least one millisecond long.
    pub fn new<Q>(
        target_queue: Q,
        threshold: u64,
        window: Duration,
    ) -> Result<Self, ConfigurationError>
    where
        Q: Into<QueueName>,
    {
        let target_queue = target_queue.into();

        if target_queue.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        if threshold < 1 {
            return Err(ConfigurationError::InvalidThreshold(target_queue));
        }
        if window < Duration::from_millis(1) {
            return Err(ConfigurationError::InvalidWindow(target_queue));
        }

        Ok(Tier {
            target_queue,
            threshold,
            window,
            slots: Vec::new(),
        })
    }

    /// Restrict this tier to the given slots. Whether the slots exist is
    /// checked when the tier is registered with a job type.
    pub fn with_slots<I, N>(mut self, slots: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<SlotName>,
    {
        for slot in slots {
            let slot = slot.into();
            if !self.slots.contains(&slot) {
                self.slots.push(slot);
            }
        }
        self
    }

    pub fn target_queue(&self) -> &QueueName {
        &self.target_queue
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn slots(&self) -> &[SlotName] {
        &self.slots
    }

    pub fn is_global(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn applies_to(&self, slot: &ActiveSlot) -> bool {
        if self.is_global() {
            return true;
        }
        match slot {
            ActiveSlot::Slot(name) => self.slots.contains(name),
            ActiveSlot::Global | ActiveSlot::Queue(_) => false,
        }
    }

    /// Whether a window count (which includes the job being routed) means the
    /// tenant had already used up its `threshold` jobs for this window.
    pub fn fires_at(&self, count: u64) -> bool {
        count > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{ActiveSlot, ConfigurationError, QueueName, SlotName, Tier};

    #[test]
    fn it_rejects_malformed_tiers() {
        assert_eq!(
            Tier::new("slow", 0, Duration::from_secs(1)),
            Err(ConfigurationError::InvalidThreshold(QueueName::from("slow")))
        );
        assert_eq!(
            Tier::new("slow", 1, Duration::ZERO),
            Err(ConfigurationError::InvalidWindow(QueueName::from("slow")))
        );
        assert_eq!(
            Tier::new("slow", 1, Duration::from_micros(999)),
            Err(ConfigurationError::InvalidWindow(QueueName::from("slow")))
        );
        assert!(Tier::new("slow", 1, Duration::from_millis(1)).is_ok());
        assert_eq!(
            Tier::new(" ", 1, Duration::from_secs(1)),
            Err(ConfigurationError::EmptyName)
        );
    }

    #[test]
    fn it_fires_only_after_the_threshold_is_used_up() {
        let tier = Tier::new("slow", 3, Duration::from_secs(60)).unwrap();

        assert!(!tier.fires_at(1));
        assert!(!tier.fires_at(3));
        assert!(tier.fires_at(4));
    }

    #[test]
    fn it_applies_slotted_tiers_only_to_their_slots() {
        let global = Tier::new("slow", 1, Duration::from_secs(60)).unwrap();
        let slotted = Tier::new("a_slow", 1, Duration::from_secs(60))
            .unwrap()
            .with_slots(["a", "b", "a"]);

        assert_eq!(slotted.slots().len(), 2);

        let slot_a = ActiveSlot::Slot(SlotName::from("a"));
        let slot_c = ActiveSlot::Slot(SlotName::from("c"));
        let unslotted = ActiveSlot::Queue(QueueName::from("default"));

        assert!(global.applies_to(&slot_a));
        assert!(global.applies_to(&ActiveSlot::Global));
        assert!(global.applies_to(&unslotted));
        assert!(slotted.applies_to(&slot_a));
        assert!(!slotted.applies_to(&slot_c));
        assert!(!slotted.applies_to(&unslotted));
        assert!(!slotted.applies_to(&ActiveSlot::Global));
    }
}
