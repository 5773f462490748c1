//! Static reference data about sports and the markets they support.

pub mod sports;
