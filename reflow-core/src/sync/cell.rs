//! Single-slot atomic cells
//!
//! Built on `portable-atomic` so the same code works on cores without
//! native compare-and-swap (Cortex-M0+) when the `critical-section`
//! feature is enabled by the firmware.

use portable_atomic::{AtomicF32, AtomicU32, AtomicU8, Ordering};

use crate::state::{ModeEvent, OperatingMode, OvenError};

/// Controller output handed from the supervisory task to the firing trigger
///
/// Single writer (the supervisory task), single reader (the half-cycle
/// trigger). A read never observes a torn value.
#[derive(Debug)]
pub struct OutputSlot(AtomicF32);

impl OutputSlot {
    /// Create a slot holding zero output
    pub const fn new() -> Self {
        Self(AtomicF32::new(0.0))
    }

    /// Publish a new controller output
    pub(crate) fn publish(&self, output: f32) {
        self.0.store(output, Ordering::Release);
    }

    /// Read the latest published output
    pub fn read(&self) -> f32 {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for OutputSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain `f32` value shared between contexts
#[derive(Debug)]
pub(crate) struct F32Cell(AtomicF32);

impl F32Cell {
    pub(crate) const fn new(value: f32) -> Self {
        Self(AtomicF32::new(value))
    }

    pub(crate) fn set(&self, value: f32) {
        self.0.store(value, Ordering::Release);
    }

    pub(crate) fn get(&self) -> f32 {
        self.0.load(Ordering::Acquire)
    }
}

/// Mode before and after applying an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub from: OperatingMode,
    pub to: OperatingMode,
}

const MODE_MASK: u32 = 0xFF;
const GENERATION_SHIFT: u32 = 8;

const fn pack(raw: u8, generation: u32) -> u32 {
    (generation << GENERATION_SHIFT) | raw as u32
}

const fn unpack(word: u32) -> (u8, u32) {
    ((word & MODE_MASK) as u8, word >> GENERATION_SHIFT)
}

/// Operating mode and run generation in one word
///
/// The low byte is the raw mode, the upper 24 bits count entries into
/// Reflow and wrap. Both change in the same atomic step, so Reflow is
/// never visible without the generation of the run that entered it.
#[derive(Debug)]
pub(crate) struct ModeCell(AtomicU32);

impl ModeCell {
    pub(crate) const fn new(mode: OperatingMode) -> Self {
        Self(AtomicU32::new(pack(mode.as_raw(), 0)))
    }

    pub(crate) fn load(&self) -> OperatingMode {
        OperatingMode::from_raw(self.raw())
    }

    pub(crate) fn raw(&self) -> u8 {
        self.snapshot().0
    }

    /// Raw mode byte and run generation from a single load
    pub(crate) fn snapshot(&self) -> (u8, u32) {
        unpack(self.0.load(Ordering::Acquire))
    }

    /// Apply `event` atomically through the transition function
    ///
    /// A concurrent abort can never be overwritten by a stale transition
    /// computed from the mode it replaced. Entering Reflow from any other
    /// mode bumps the generation in the same update.
    pub(crate) fn apply(&self, event: ModeEvent) -> Transition {
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                let (raw, generation) = unpack(word);
                let from = OperatingMode::from_raw(raw);
                let to = from.transition(event);
                let generation = if to == OperatingMode::Reflow && from != OperatingMode::Reflow {
                    generation.wrapping_add(1)
                } else {
                    generation
                };
                Some(pack(to.as_raw(), generation))
            })
            .unwrap_or_else(|word| word);
        let from = OperatingMode::from_raw(unpack(previous).0);
        Transition {
            from,
            to: from.transition(event),
        }
    }

    /// Overwrite the mode byte, keeping the generation
    #[cfg(test)]
    pub(crate) fn store_raw(&self, raw: u8) {
        let (_, generation) = self.snapshot();
        self.0.store(pack(raw, generation), Ordering::Release);
    }
}

/// Last abort reason, `0` meaning none recorded
#[derive(Debug)]
pub(crate) struct ErrorCell(AtomicU8);

impl ErrorCell {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub(crate) fn store(&self, error: OvenError) {
        self.0.store(error.code(), Ordering::Release);
    }

    pub(crate) fn load(&self) -> Option<OvenError> {
        match self.0.load(Ordering::Acquire) {
            0 => None,
            // Unknown codes can only come from corrupted memory
            code => Some(OvenError::from_code(code).unwrap_or(OvenError::ErroneousState)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_slot_publish_read() {
        let slot = OutputSlot::new();
        assert_eq!(slot.read(), 0.0);
        slot.publish(4_321.5);
        assert_eq!(slot.read(), 4_321.5);
    }

    #[test]
    fn test_mode_cell_apply() {
        let cell = ModeCell::new(OperatingMode::Idle);
        let t = cell.apply(ModeEvent::Start);
        assert_eq!(t.from, OperatingMode::Idle);
        assert_eq!(t.to, OperatingMode::Reflow);
        assert_eq!(cell.load(), OperatingMode::Reflow);

        let t = cell.apply(ModeEvent::Start);
        assert_eq!(t.from, OperatingMode::Reflow);
        assert_eq!(t.to, OperatingMode::Reflow);
    }

    #[test]
    fn test_mode_cell_corruption() {
        let cell = ModeCell::new(OperatingMode::Idle);
        cell.store_raw(42);
        assert_eq!(cell.load(), OperatingMode::Error);
        assert_eq!(cell.raw(), 42);

        let t = cell.apply(ModeEvent::Abort);
        assert_eq!(t.from, OperatingMode::Error);
        assert_eq!(cell.load(), OperatingMode::Abort);
    }

    #[test]
    fn test_generation_moves_with_mode() {
        let reflow = OperatingMode::Reflow.as_raw();
        let cell = ModeCell::new(OperatingMode::Idle);
        assert_eq!(cell.snapshot(), (OperatingMode::Idle.as_raw(), 0));

        cell.apply(ModeEvent::Start);
        assert_eq!(cell.snapshot(), (reflow, 1));
        cell.apply(ModeEvent::Start);
        assert_eq!(cell.snapshot(), (reflow, 1));

        // Rejected start leaves both halves alone
        cell.apply(ModeEvent::Abort);
        cell.apply(ModeEvent::Start);
        assert_eq!(cell.snapshot(), (OperatingMode::Abort.as_raw(), 1));

        cell.apply(ModeEvent::ClearError);
        cell.apply(ModeEvent::Start);
        assert_eq!(cell.snapshot(), (reflow, 2));

        cell.store_raw(42);
        assert_eq!(cell.snapshot(), (42, 2));
    }

    #[test]
    fn test_generation_wraps() {
        let cell = ModeCell::new(OperatingMode::Idle);
        cell.0
            .store(pack(OperatingMode::Idle.as_raw(), 0xFF_FFFF), Ordering::Release);
        cell.apply(ModeEvent::Start);
        assert_eq!(cell.snapshot(), (OperatingMode::Reflow.as_raw(), 0));
    }

    #[test]
    fn test_error_cell() {
        let cell = ErrorCell::new();
        assert_eq!(cell.load(), None);
        cell.store(OvenError::SensorStale);
        assert_eq!(cell.load(), Some(OvenError::SensorStale));
    }
}
