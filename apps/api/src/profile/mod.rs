// Student accounts and onboarding profiles.
// Strength tiers are derived on every write; the scorer only ever reads profiles.

pub mod handlers;
pub mod store;
pub mod strength;
