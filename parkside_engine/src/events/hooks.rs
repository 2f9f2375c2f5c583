use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, PaymentRequestedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_requested_producer: Vec<EventProducer<PaymentRequestedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_requested: Option<EventHandler<PaymentRequestedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_requested = hooks.on_payment_requested.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_requested }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_requested {
            result.payment_requested_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_requested {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_requested: Option<Handler<PaymentRequestedEvent>>,
}

impl EventHooks {
    pub fn on_payment_requested<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentRequestedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_requested = Some(Arc::new(f));
        self
    }
}
