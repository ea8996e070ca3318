//! GPIO pin assignments for the BrewTherm main board.
//!
//! Single source of truth — every driver references this module rather
//! than hard-coding pin numbers.

/// Digital output driving the heater SSR (active HIGH).
pub const HEATER_GPIO: i32 = 4;

/// Single-wire data line of the TSic temperature probe.
pub const TEMP_PROBE_GPIO: i32 = 2;
