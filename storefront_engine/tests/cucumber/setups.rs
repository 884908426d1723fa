use cucumber::given;

use crate::cucumber::{storefront_world::StorefrontSystem, StorefrontWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut StorefrontWorld) {
    let system = StorefrontSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "users {word} and {word}")]
async fn two_users(world: &mut StorefrontWorld, a: String, b: String) {
    world.add_user(&a).await;
    world.add_user(&b).await;
}

#[given(expr = "a user {word}")]
async fn one_user(world: &mut StorefrontWorld, name: String) {
    world.add_user(&name).await;
}
