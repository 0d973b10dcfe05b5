/// Cross-thread handoff to the graphics-context owner.
pub mod handoff;
/// Display surface contract and the headless implementation.
pub mod surface;
