mod setups;
pub mod storefront_world;

pub use storefront_world::StorefrontWorld;
