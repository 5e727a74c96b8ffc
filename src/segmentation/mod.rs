//! Text segmentation helpers shared by strategies and the overlap manager.

pub mod sentence;
