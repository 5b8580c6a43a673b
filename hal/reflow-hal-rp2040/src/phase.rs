//! PIO zero-cross synchronised SSR firing
//!
//! One state machine implements the whole firing cascade:
//!
//! 1. wait for the rising edge of the zero-cross detector
//! 2. raise PIO IRQ 0, the half-cycle trigger for software
//! 3. `pull noblock` the newest window word; with an empty FIFO this
//!    reloads the previous window from X, so a late update repeats the
//!    last firing angle instead of skipping a cycle
//! 4. spin the edge delay, raise the gate, spin the latch width, drop it
//!
//! The program cannot see an edge while it spins, so the deskew is folded
//! into the edge delay on the host side ([`FiringWindow::edge_delay`]).
//! Pulses that would run into the next edge are launched from that edge
//! instead, and every pulse ends a guard band before the following one.
//!
//! Each `jmp y--` iteration is one state machine cycle, so the clock
//! divider makes one cycle equal one firing timer tick.

use embassy_rp::gpio::{Level, Pull};
use embassy_rp::pio::{
    Common, Config, Direction as PioDirection, Instance, Pin, PioPin, ShiftConfig,
    ShiftDirection, StateMachine,
};
use embassy_rp::Peri;
use fixed::types::U24F8;
use reflow_hal::{FiringWindow, PhaseTimer};

use crate::pio::{calc_clock_divider, half_cycle_ticks, pack_window, MAX_FIELD_TICKS};

/// Phase timer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseTimerError {
    /// Tick clock cannot be derived from the system clock
    ClockOutOfRange,
    /// Half-cycle is zero ticks or exceeds the 16-bit fields
    HalfCycleOutOfRange,
    /// Deskew delay is not shorter than the half-cycle
    DeskewOutOfRange,
    /// Window is inverted or cannot end before the next edge
    WindowOutOfRange,
    /// TX FIFO still full from earlier windows
    FifoFull,
}

/// PIO-backed [`PhaseTimer`]
///
/// The half-cycle trigger is raised at the detector edge itself; windows
/// are still measured from the deskewed crossing.
pub struct PioPhaseTimer<'d, PIO: Instance, const SM: usize> {
    sm: StateMachine<'d, PIO, SM>,
    /// Reapplied on every arm so the program restarts at its prologue
    cfg: Config<'d, PIO>,
    gate: Pin<'d, PIO>,
    half_ticks: u32,
    deskew_ticks: u32,
    armed: bool,
}

impl<'d, PIO: Instance, const SM: usize> PioPhaseTimer<'d, PIO, SM> {
    /// Load the firing program and configure the state machine
    ///
    /// The state machine stays disabled until [`PhaseTimer::arm`].
    ///
    /// # Arguments
    /// * `common` - PIO common resources (for loading program)
    /// * `sm` - State machine to use
    /// * `zero_cross` - Zero-cross detector input (rising edge at crossing)
    /// * `gate` - SSR gate output (active high)
    /// * `tick_hz` - Firing timer tick rate
    /// * `half_cycle_us` - Mains half-cycle width
    pub fn new<ZC: PioPin, GATE: PioPin>(
        common: &mut Common<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        zero_cross: Peri<'d, ZC>,
        gate: Peri<'d, GATE>,
        tick_hz: u32,
        half_cycle_us: u32,
    ) -> Result<Self, PhaseTimerError> {
        let divider = calc_clock_divider(tick_hz).ok_or(PhaseTimerError::ClockOutOfRange)?;
        let half_ticks =
            half_cycle_ticks(tick_hz, half_cycle_us).ok_or(PhaseTimerError::HalfCycleOutOfRange)?;

        let prg = pio::pio_asm!(
            "pull block",      // Initial window
            "mov x, osr",
            ".wrap_target",
            "wait 0 pin 0",
            "wait 1 pin 0",    // Zero-cross edge
            "irq 0",           // Cycle start
            "pull noblock",    // Newest window, or X when empty
            "mov x, osr",
            "out y, 16",       // Delay from the edge
            "delay:",
            "jmp y-- delay",
            "set pins, 1",     // Gate on
            "out y, 16",
            "latch:",
            "jmp y-- latch",
            "set pins, 0",     // Gate off
            ".wrap"
        );

        let installed = common.load_program(&prg.program);

        let mut zc_pin = common.make_pio_pin(zero_cross);
        zc_pin.set_pull(Pull::Down);
        let gate_pin = common.make_pio_pin(gate);

        let mut cfg = Config::default();
        cfg.use_program(&installed, &[]);
        cfg.set_in_pins(&[&zc_pin]);
        cfg.set_set_pins(&[&gate_pin]);
        cfg.shift_out = ShiftConfig {
            auto_fill: false,
            threshold: 32,
            direction: ShiftDirection::Right,
        };
        cfg.clock_divider = U24F8::from_bits(divider);

        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::In, &[&zc_pin]);
        sm.set_pins(Level::Low, &[&gate_pin]);
        sm.set_pin_dirs(PioDirection::Out, &[&gate_pin]);

        Ok(Self {
            sm,
            cfg,
            gate: gate_pin,
            half_ticks,
            deskew_ticks: 0,
            armed: false,
        })
    }

    /// Check if the cascade is running
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Stop firing and drop the gate
    pub fn disarm(&mut self) {
        self.sm.set_enable(false);
        self.sm.set_pins(Level::Low, &[&self.gate]);
        self.armed = false;
    }

    fn pack(&self, window: FiringWindow) -> Result<u32, PhaseTimerError> {
        pack_window(window, self.deskew_ticks, self.half_ticks)
            .ok_or(PhaseTimerError::WindowOutOfRange)
    }

    fn push(&mut self, word: u32) -> Result<(), PhaseTimerError> {
        if self.sm.tx().try_push(word) {
            Ok(())
        } else {
            Err(PhaseTimerError::FifoFull)
        }
    }
}

impl<'d, PIO: Instance, const SM: usize> PhaseTimer for PioPhaseTimer<'d, PIO, SM> {
    type Error = PhaseTimerError;
    const MAX_TICKS: u32 = MAX_FIELD_TICKS;

    fn arm(&mut self, deskew_ticks: u32, initial: FiringWindow) -> Result<(), Self::Error> {
        if deskew_ticks >= self.half_ticks {
            return Err(PhaseTimerError::DeskewOutOfRange);
        }
        self.deskew_ticks = deskew_ticks;
        let word = self.pack(initial)?;
        if self.armed {
            self.disarm();
        }
        self.sm.set_config(&self.cfg);
        self.sm.clear_fifos();
        self.push(word)?;
        self.sm.set_enable(true);
        self.armed = true;
        Ok(())
    }

    fn set_compare_window(&mut self, window: FiringWindow) -> Result<(), Self::Error> {
        let word = self.pack(window)?;
        self.push(word)
    }
}
