use std::str::FromStr;

use chrono::{Duration, Utc};
use cucumber::{given, then, when};
use restaurant_engine::{
    db_types::{Money, NewOrder, NewOrderItem, OrderStatusType, OrderType},
    EngineError,
    OrderManagement,
};

use crate::cucumber::LifecycleWorld;

fn money(s: &str) -> Money {
    Money::from_str(s).unwrap_or_else(|e| panic!("'{s}' is not an amount. {e}"))
}

fn status(s: &str) -> OrderStatusType {
    OrderStatusType::from_str(s).unwrap_or_else(|e| panic!("'{s}' is not an order status. {e}"))
}

async fn place(world: &mut LifecycleWorld, name: String, order: NewOrder, quantity: i64, item: String) {
    let menu_item_id = world.menu_item(&item).id;
    let placed = world
        .system()
        .flow
        .place_order(order, vec![NewOrderItem::new(menu_item_id, quantity)])
        .await
        .expect("Error placing order");
    world.orders.insert(name, placed.order.id);
}

#[given(expr = "{string} has placed a pickup order for {int} x {string}")]
async fn existing_pickup_order(world: &mut LifecycleWorld, name: String, quantity: i64, item: String) {
    place_pickup_order(world, name, quantity, item).await;
}

#[when(expr = "{string} places a pickup order for {int} x {string}")]
async fn place_pickup_order(world: &mut LifecycleWorld, name: String, quantity: i64, item: String) {
    let sys = world.system();
    let order = NewOrder::new(sys.customer.id, sys.restaurant.id, OrderType::Pickup);
    place(world, name, order, quantity, item).await;
}

#[when(expr = "{string} places a delivery order to {string} with a fee of {word} for {int} x {string}")]
async fn place_delivery_order(
    world: &mut LifecycleWorld,
    name: String,
    address: String,
    fee: String,
    quantity: i64,
    item: String,
) {
    let sys = world.system();
    let order = NewOrder::delivery(sys.customer.id, sys.restaurant.id, address).with_delivery_fee(money(&fee));
    place(world, name, order, quantity, item).await;
}

#[when(expr = "I add {int} x {string} to order {string}")]
async fn add_item(world: &mut LifecycleWorld, quantity: i64, item: String, name: String) {
    let order_id = world.order_id(&name);
    let menu_item_id = world.menu_item(&item).id;
    let result = world.system().flow.add_item(order_id, menu_item_id, quantity, None).await;
    world.record(result);
}

#[when(expr = "I change the quantity of {string} on order {string} to {int}")]
async fn update_quantity(world: &mut LifecycleWorld, item: String, name: String, quantity: i64) {
    let order_id = world.order_id(&name);
    let menu_item_id = world.menu_item(&item).id;
    let items = world.system().db.fetch_order_items(order_id).await.expect("Error fetching items");
    let line = items.iter().find(|i| i.menu_item_id == menu_item_id).expect("Item is not on the order");
    let result = world.system().flow.update_item_quantity(line.id, quantity).await;
    world.record(result);
}

#[when(expr = "I remove {string} from order {string}")]
async fn remove_item(world: &mut LifecycleWorld, item: String, name: String) {
    let order_id = world.order_id(&name);
    let menu_item_id = world.menu_item(&item).id;
    let items = world.system().db.fetch_order_items(order_id).await.expect("Error fetching items");
    let line = items.iter().find(|i| i.menu_item_id == menu_item_id).expect("Item is not on the order");
    let result = world.system().flow.remove_item(line.id).await;
    world.record(result);
}

#[when(expr = "the restaurant moves order {string} to {word}")]
async fn change_status(world: &mut LifecycleWorld, name: String, new_status: String) {
    let order_id = world.order_id(&name);
    let new_status = status(&new_status);
    let owner = world.system().owner.id;
    if new_status == OrderStatusType::Confirmed {
        world.confirmed_at = Some(Utc::now());
    }
    let result = world.system().flow.change_status(order_id, new_status, Some(owner), None).await;
    world.record(result);
}

#[when(expr = "an administrator forces order {string} to {word}")]
async fn override_status(world: &mut LifecycleWorld, name: String, new_status: String) {
    let order_id = world.order_id(&name);
    let owner = world.system().owner.id;
    let result =
        world.system().flow.override_status(order_id, status(&new_status), Some(owner), Some("Forced".into())).await;
    world.record(result);
}

#[when(expr = "the customer reviews order {string} with {int} stars")]
async fn review(world: &mut LifecycleWorld, name: String, rating: i64) {
    let order_id = world.order_id(&name);
    let result = world.system().flow.submit_review(order_id, rating, None).await;
    world.record(result);
}

#[then(expr = "order {string} has a subtotal of {word}, tax of {word} and a total of {word}")]
async fn check_totals(world: &mut LifecycleWorld, name: String, subtotal: String, tax: String, total: String) {
    let order = world.order(&name).await;
    assert_eq!(order.subtotal, money(&subtotal), "Subtotal is incorrect");
    assert_eq!(order.tax_amount, money(&tax), "Tax is incorrect");
    assert_eq!(order.total, money(&total), "Total is incorrect");
}

#[then(expr = "order {string} is {word}")]
async fn check_status(world: &mut LifecycleWorld, name: String, expected: String) {
    let order = world.order(&name).await;
    assert_eq!(order.status, status(&expected));
}

#[then(expr = "order {string} has {int} line(s)")]
async fn check_line_count(world: &mut LifecycleWorld, name: String, count: usize) {
    let order_id = world.order_id(&name);
    let items = world.system().db.fetch_order_items(order_id).await.expect("Error fetching items");
    assert_eq!(items.len(), count);
}

#[then(expr = "order {string} has {int} x {string}")]
async fn check_quantity(world: &mut LifecycleWorld, name: String, quantity: i64, item: String) {
    let order_id = world.order_id(&name);
    let menu_item_id = world.menu_item(&item).id;
    let items = world.system().db.fetch_order_items(order_id).await.expect("Error fetching items");
    let line = items.iter().find(|i| i.menu_item_id == menu_item_id).expect("Item is not on the order");
    assert_eq!(line.quantity, quantity);
}

#[then(expr = "order {string} has {int} status history entries")]
async fn check_history(world: &mut LifecycleWorld, name: String, count: usize) {
    let order_id = world.order_id(&name);
    let history = world.system().db.fetch_status_history(order_id).await.expect("Error fetching history");
    assert_eq!(history.len(), count);
}

#[then(expr = "order {string} is expected {int} minutes after confirmation")]
async fn check_estimate(world: &mut LifecycleWorld, name: String, minutes: i64) {
    let order = world.order(&name).await;
    let confirmed_at = world.confirmed_at.expect("Order was never confirmed");
    let eta = order.estimated_delivery_time.expect("No delivery estimate");
    let offset = eta - confirmed_at;
    assert!(offset >= Duration::minutes(minutes) - Duration::seconds(1), "Estimate is too early: {eta}");
    assert!(offset <= Duration::minutes(minutes) + Duration::seconds(5), "Estimate is too late: {eta}");
}

#[then("the last request succeeded")]
async fn check_success(world: &mut LifecycleWorld) {
    assert!(world.last_error.is_none(), "Request failed: {:?}", world.last_error);
}

#[then(expr = "the last request was rejected as {word}")]
async fn check_rejection(world: &mut LifecycleWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last request succeeded");
    let matched = match kind.as_str() {
        "invalid_transition" => matches!(err, EngineError::InvalidTransition { .. }),
        "invalid_state" => matches!(err, EngineError::InvalidState(_)),
        "invalid_input" => matches!(err, EngineError::ValidationError(_)),
        "not_found" => matches!(err, EngineError::NotFound(_)),
        _ => panic!("Unknown error kind {kind}"),
    };
    assert!(matched, "Expected {kind}, got {err}");
}
