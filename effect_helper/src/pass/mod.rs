//! Pass assembly and minimal-call binding

mod pass;

pub use pass::{Pass, PassDesc};
