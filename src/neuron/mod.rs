//! The single compartment Hodgkin Huxley membrane: gating kinetics, ionic and
//! synaptic currents, and the differential equations that combine them.
//!
//! Every function here is pure, parameters are passed explicitly as a
//! [`hodgkin_huxley::HodgkinHuxleyParameters`] value so separate conditions
//! never share state.

pub mod gating;
pub mod synapse;
pub mod ion_channels;
pub mod hodgkin_huxley;
