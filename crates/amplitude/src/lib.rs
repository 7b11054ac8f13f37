//! Amplitude transition control for the displaced mesh.
//!
//! The live amplitude only ever moves through [`AmplitudeController::tick`],
//! which runs once per frame against the scene clock. User triggers pass a
//! [`DebounceGate`] and then either step the target through the oscillation
//! policy ([`AmplitudeController::advance`]) or select it directly
//! ([`AmplitudeController::retarget`]). A trigger that lands mid-flight
//! restarts the eased transition from the live value, so the output never
//! jumps except for the final snap onto the target.

mod controller;
mod debounce;
mod easing;

pub use controller::{
    AmplitudeController, AmplitudeError, AmplitudeSettings, Direction, Phase, Transition,
};
pub use debounce::{DebounceGate, DEFAULT_DEBOUNCE};
pub use easing::Easing;
