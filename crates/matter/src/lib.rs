//! Atomic structures: sites, periodic cells, and charge/spin bookkeeping.

pub mod atom;
pub mod charge;
pub mod masses;
pub mod structure;

pub use atom::Atom;
pub use charge::{ChargeSpinError, resolve_charge_spin};
pub use structure::{Mat3, Structure, Vec3};
