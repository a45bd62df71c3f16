use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{
    EventHandler,
    EventProducer,
    Handler,
    OrderModifiedEvent,
    OrderPlacedEvent,
    OrderStatusChangedEvent,
    ReviewSubmittedEvent,
};

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The publishing side of the event hooks. The APIs hold one of these, and publish to every producer in each list.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_placed_producer: Vec<EventProducer<OrderPlacedEvent>>,
    pub status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub order_modified_producer: Vec<EventProducer<OrderModifiedEvent>>,
    pub review_submitted_producer: Vec<EventProducer<ReviewSubmittedEvent>>,
}

impl EventProducers {
    pub fn publish_order_placed(&self, event: OrderPlacedEvent) {
        self.order_placed_producer.iter().for_each(|p| {
            p.publish_event(event.clone());
        });
    }

    pub fn publish_status_changed(&self, event: OrderStatusChangedEvent) {
        self.status_changed_producer.iter().for_each(|p| {
            p.publish_event(event.clone());
        });
    }

    pub fn publish_order_modified(&self, event: OrderModifiedEvent) {
        self.order_modified_producer.iter().for_each(|p| {
            p.publish_event(event.clone());
        });
    }

    pub fn publish_review_submitted(&self, event: ReviewSubmittedEvent) {
        self.review_submitted_producer.iter().for_each(|p| {
            p.publish_event(event.clone());
        });
    }
}

pub struct EventHandlers {
    pub on_order_placed: Option<EventHandler<OrderPlacedEvent>>,
    pub on_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_order_modified: Option<EventHandler<OrderModifiedEvent>>,
    pub on_review_submitted: Option<EventHandler<ReviewSubmittedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_placed = hooks.on_order_placed.map(|f| EventHandler::new("order placed", buffer_size, f));
        let on_status_changed = hooks.on_status_changed.map(|f| EventHandler::new("status changed", buffer_size, f));
        let on_order_modified = hooks.on_order_modified.map(|f| EventHandler::new("order modified", buffer_size, f));
        let on_review_submitted =
            hooks.on_review_submitted.map(|f| EventHandler::new("review submitted", buffer_size, f));
        Self { on_order_placed, on_status_changed, on_order_modified, on_review_submitted }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_placed {
            result.order_placed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_status_changed {
            result.status_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_modified {
            result.order_modified_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_review_submitted {
            result.review_submitted_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task for each configured handler. The tasks end once all their producers have been dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_order_placed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_status_changed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_order_modified {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_review_submitted {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_placed: Option<Handler<OrderPlacedEvent>>,
    pub on_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_order_modified: Option<Handler<OrderModifiedEvent>>,
    pub on_review_submitted: Option<Handler<ReviewSubmittedEvent>>,
}

impl EventHooks {
    pub fn on_order_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderPlacedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_placed = Some(Arc::new(f));
        self
    }

    pub fn on_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderStatusChangedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_status_changed = Some(Arc::new(f));
        self
    }

    pub fn on_order_modified<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderModifiedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_order_modified = Some(Arc::new(f));
        self
    }

    pub fn on_review_submitted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(ReviewSubmittedEvent) -> HookFuture) + Send + Sync + 'static {
        self.on_review_submitted = Some(Arc::new(f));
        self
    }
}
