use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use crate::{ConfigurationError, QueueName, SlotName};

/// Explicit mapping of slotted queues to the slot they belong to. Queues in
/// the same slot share their fair-tenant counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotMap {
    queues: BTreeMap<QueueName, SlotName>,
    slots: BTreeSet<SlotName>,
}

impl SlotMap {
    /// Declare `slot` as a group of `queues`. Declaring the same slot again
    /// adds queues to it; a queue that already belongs to another slot is a
    /// configuration error.
    pub fn insert<I, Q>(&mut self, slot: SlotName, queues: I) -> Result<(), ConfigurationError>
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QueueName>,
    {
        if slot.is_empty() {
            return Err(ConfigurationError::EmptyName);
        }

        let mut added = 0;
        for queue in queues {
            let queue = queue.into();
            if queue.is_empty() {
                return Err(ConfigurationError::EmptyName);
            }

            match self.queues.get(&queue) {
                Some(existing) if existing != &slot => {
                    return Err(ConfigurationError::ConflictingSlot {
                        queue,
                        first: existing.clone(),
                        second: slot,
                    });
                }
                _ => {
                    self.queues.insert(queue, slot.clone());
                    added += 1;
                }
            }
        }

        if added == 0 && !self.slots.contains(&slot) {
            return Err(ConfigurationError::EmptySlot(slot));
        }

        self.slots.insert(slot);
        Ok(())
    }

    /// Declare a queue that is a slot of its own, named after the queue.
    pub fn insert_queue<Q>(&mut self, queue: Q) -> Result<(), ConfigurationError>
    where
        Q: Into<QueueName>,
    {
        let queue = queue.into();
        self.insert(SlotName::from(queue.as_str()), [queue])
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    pub fn contains_queue(&self, queue: &QueueName) -> bool {
        self.queues.contains_key(queue)
    }

    pub fn contains_slot(&self, slot: &SlotName) -> bool {
        self.slots.contains(slot)
    }

    pub fn slot_for(&self, queue: &QueueName) -> Option<&SlotName> {
        self.queues.get(queue)
    }

    pub fn queues(&self) -> impl Iterator<Item = (&QueueName, &SlotName)> {
        self.queues.iter()
    }

    /// Determine which slot a job is counted against. Without slotting, every
    /// job of a job type shares one global slot. With slotting, the requested
    /// queue decides the slot if it is slotted, otherwise the declared queue
    /// does; a declared queue outside every slot is counted on its own.
    pub fn resolve(&self, declared: &QueueName, requested: &QueueName) -> ActiveSlot {
        if self.is_empty() {
            return ActiveSlot::Global;
        }

        self.slot_for(requested)
            .or_else(|| self.slot_for(declared))
            .map(|slot| ActiveSlot::Slot(slot.clone()))
            .unwrap_or_else(|| ActiveSlot::Queue(declared.clone()))
    }
}

/// The slot a single job is counted against.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActiveSlot {
    /// The job type has no slotting; all of its jobs share one slot
    Global,
    /// A declared slot
    Slot(SlotName),
    /// The job type has slotting, but the job is headed for a queue outside
    /// of every slot
    Queue(QueueName),
}

impl Display for ActiveSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveSlot::Global => write!(f, "*"),
            ActiveSlot::Slot(slot) => write!(f, "slot:{slot}"),
            ActiveSlot::Queue(queue) => write!(f, "queue:{queue}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ActiveSlot, ConfigurationError, QueueName, SlotMap, SlotName};

    fn queue(name: &str) -> QueueName {
        QueueName::from(name)
    }

    #[test]
    fn it_resolves_to_the_global_slot_without_slotting() {
        let slots = SlotMap::default();
        assert_eq!(
            slots.resolve(&queue("default"), &queue("default")),
            ActiveSlot::Global
        );
    }

    #[test]
    fn it_prefers_the_requested_queue_when_it_is_slotted() -> Result<(), ConfigurationError> {
        let mut slots = SlotMap::default();
        slots.insert_queue("whatever_a")?;
        slots.insert(SlotName::from("shared"), ["whatever_b", "whatever_c"])?;

        assert_eq!(
            slots.resolve(&queue("whatever"), &queue("whatever_a")),
            ActiveSlot::Slot(SlotName::from("whatever_a"))
        );
        assert_eq!(
            slots.resolve(&queue("whatever"), &queue("whatever_c")),
            ActiveSlot::Slot(SlotName::from("shared"))
        );
        assert_eq!(
            slots.resolve(&queue("whatever"), &queue("whatever")),
            ActiveSlot::Queue(queue("whatever"))
        );
        assert_eq!(
            slots.resolve(&queue("whatever_b"), &queue("whatever_b")),
            ActiveSlot::Slot(SlotName::from("shared"))
        );

        Ok(())
    }

    #[test]
    fn it_rejects_a_queue_in_two_slots() {
        let mut slots = SlotMap::default();
        slots
            .insert(SlotName::from("first"), ["whatever_a"])
            .unwrap();

        assert_eq!(
            slots.insert(SlotName::from("second"), ["whatever_a"]),
            Err(ConfigurationError::ConflictingSlot {
                queue: queue("whatever_a"),
                first: SlotName::from("first"),
                second: SlotName::from("second"),
            })
        );
    }

    #[test]
    fn it_rejects_empty_slots() {
        let mut slots = SlotMap::default();
        let no_queues: [&str; 0] = [];

        assert_eq!(
            slots.insert(SlotName::from("lonely"), no_queues),
            Err(ConfigurationError::EmptySlot(SlotName::from("lonely")))
        );
        assert!(!slots.contains_slot(&SlotName::from("lonely")));
    }
}
