use std::collections::HashMap;

use tracing::{debug, warn};

use super::types::{Classification, Entities, IntentKind};

/// Performs an action on the host. Returns `false` on any failure.
///
/// The router calls this synchronously, so implementations must not block
/// for long.
pub trait Executor {
    fn execute(&mut self, intent: IntentKind, entities: &Entities) -> bool;
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&mut self, intent: IntentKind, entities: &Entities) -> bool {
        (**self).execute(intent, entities)
    }
}

/// Maps an utterance to an intent label. `None` means the model was unreachable.
pub trait IntentClassifier {
    fn classify(&self, text: &str) -> Option<Classification>;
}

impl<C: IntentClassifier + ?Sized> IntentClassifier for Box<C> {
    fn classify(&self, text: &str) -> Option<Classification> {
        (**self).classify(text)
    }
}

/// One handler per intent inside a [`DispatchTable`].
pub trait ActionHandler: Send {
    fn handle(&mut self, intent: IntentKind, entities: &Entities) -> bool;
}

/// Explicit intent → handler table.
///
/// Intents without a handler fail (and get logged) instead of silently succeeding.
#[derive(Default)]
pub struct DispatchTable {
    handlers: HashMap<IntentKind, Box<dyn ActionHandler>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, intent: IntentKind, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(intent, handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Executor for DispatchTable {
    fn execute(&mut self, intent: IntentKind, entities: &Entities) -> bool {
        match self.handlers.get_mut(&intent) {
            Some(handler) => {
                let ok = handler.handle(intent, entities);
                debug!(%intent, ok, "dispatched");
                ok
            }
            None => {
                warn!(%intent, "no handler registered");
                false
            }
        }
    }
}
