//! Bounded particle emitter arena
//!
//! Emitters live in fixed slots recycled through a free list. Ids carry a
//! generation so a stale id never touches a slot that has been reused.

use glam::Vec3;

use crate::consts::{SPARK_LIFETIME_TICKS, STAR_BURST_COUNT, STAR_BURST_LIFETIME_TICKS};

/// What an emitter draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterKind {
    /// Trail behind a climbing rocket, lives until released
    RocketTrail,
    /// One explosion fragment flying along a proxy vertex normal
    Spark,
    /// Pickup star burst
    StarBurst,
}

/// A live particle emitter
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub kind: EmitterKind,
    pub origin: Vec3,
    /// Unit emission direction
    pub direction: Vec3,
    pub color: [f32; 4],
    /// Particles emitted over the emitter's life (0 = continuous)
    pub burst_count: u32,
    /// Ticks until the emitter disposes itself (`None` = until released)
    pub ticks_left: Option<u32>,
}

impl Emitter {
    pub fn rocket_trail(origin: Vec3) -> Self {
        Self {
            kind: EmitterKind::RocketTrail,
            origin,
            direction: Vec3::NEG_Y,
            color: [0.49, 0.57, 0.76, 1.0],
            burst_count: 0,
            ticks_left: None,
        }
    }

    pub fn spark(origin: Vec3, direction: Vec3, color: [f32; 4]) -> Self {
        Self {
            kind: EmitterKind::Spark,
            origin,
            direction: direction.normalize_or_zero(),
            color,
            burst_count: 0,
            ticks_left: Some(SPARK_LIFETIME_TICKS),
        }
    }

    pub fn star_burst(origin: Vec3) -> Self {
        Self {
            kind: EmitterKind::StarBurst,
            origin,
            direction: Vec3::Y,
            color: [1.0, 1.0, 1.0, 1.0],
            burst_count: STAR_BURST_COUNT,
            ticks_left: Some(STAR_BURST_LIFETIME_TICKS),
        }
    }
}

/// Handle to an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    emitter: Option<Emitter>,
}

/// Fixed-capacity emitter pool
#[derive(Debug, Default)]
pub struct EmitterArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
    dropped: u64,
}

impl EmitterArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            live: 0,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live emitters
    pub fn live(&self) -> usize {
        self.live
    }

    /// Spawns refused because the arena was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Place an emitter, or drop it when every slot is in use
    pub fn spawn(&mut self, emitter: Emitter) -> Option<EmitterId> {
        let index = if let Some(index) = self.free.pop() {
            index
        } else if self.slots.len() < self.capacity {
            self.slots.push(Slot::default());
            (self.slots.len() - 1) as u32
        } else {
            self.dropped += 1;
            if self.dropped == 1 || self.dropped % 256 == 0 {
                log::warn!(
                    "Emitter arena full ({} slots), dropped {} spawns so far",
                    self.capacity,
                    self.dropped
                );
            }
            return None;
        };

        let slot = &mut self.slots[index as usize];
        slot.emitter = Some(emitter);
        self.live += 1;
        Some(EmitterId {
            index,
            generation: slot.generation,
        })
    }

    pub fn get(&self, id: EmitterId) -> Option<&Emitter> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.emitter.as_ref())
    }

    /// Move an emitter (rocket trails follow their rocket)
    pub fn set_origin(&mut self, id: EmitterId, origin: Vec3) {
        if let Some(slot) = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            && let Some(emitter) = slot.emitter.as_mut()
        {
            emitter.origin = origin;
        }
    }

    /// Stop an emitter and free its slot; false if the id is stale
    pub fn release(&mut self, id: EmitterId) -> bool {
        match self.slots.get(id.index as usize) {
            Some(slot) if slot.generation == id.generation && slot.emitter.is_some() => {
                self.free_slot(id.index);
                true
            }
            _ => false,
        }
    }

    fn free_slot(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.emitter = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.live -= 1;
    }

    /// Age timed emitters by one tick, freeing the ones that finished
    pub fn tick(&mut self) {
        let mut finished = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(Emitter {
                ticks_left: Some(ticks),
                ..
            }) = slot.emitter.as_mut()
            {
                *ticks = ticks.saturating_sub(1);
                if *ticks == 0 {
                    finished.push(index as u32);
                }
            }
        }
        for index in finished {
            self.free_slot(index);
        }
    }

    /// Live emitters in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Emitter> {
        self.slots.iter().filter_map(|s| s.emitter.as_ref())
    }

    pub fn count_kind(&self, kind: EmitterKind) -> usize {
        self.iter().filter(|e| e.kind == kind).count()
    }

    /// Drop every emitter
    pub fn clear(&mut self) {
        let live: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.emitter.is_some())
            .map(|(i, _)| i as u32)
            .collect();
        for index in live {
            self.free_slot(index);
        }
    }
}
