/// Hit/miss/bypass decisions and publish reservations.
pub mod gate;
/// Composite render-result keys.
pub mod key;
/// Cache storage contract and the bundled in-memory store.
pub mod store;
