use cucumber::given;

use crate::{cucumber::LifecycleWorld, support::TestSystem};

#[given("a restaurant with a menu")]
async fn fresh_restaurant(world: &mut LifecycleWorld) {
    let system = TestSystem::new().await;
    world.system = Some(system);
}
