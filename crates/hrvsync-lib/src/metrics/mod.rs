pub mod coherence;
pub mod group;
pub mod rolling;
pub mod sync;
