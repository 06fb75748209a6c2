pub mod dispatch;
pub mod inverse;
pub mod registry;
pub mod types;

pub use dispatch::{ActionHandler, DispatchTable, Executor, IntentClassifier};
pub use types::{keys, Action, Classification, Direction, Entities, IntentKind};
