//! # anymail-mvvm
//!
//! View-model plumbing that is independent of any particular GUI toolkit.
//!
//! ## Components
//!
//! - [`weak_event`]: handler registry holding only [`std::sync::Weak`]
//!   references, so a publisher never keeps its subscribers alive
//! - [`dispatch`]: explicit UI task sink used to marshal notifications onto
//!   the UI thread
//! - [`command`]: [`DelegateCommand`], an execute / can-execute pair with a
//!   can-execute-changed notification
//! - [`bindable`]: [`PropertyChanged`], the property-changed channel used by
//!   view-models
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use anymail_mvvm::{CommandId, DelegateCommand, EventArgs, EventHandler};
//!
//! let command = DelegateCommand::<Option<u32>>::with_can_execute(
//!     |id| println!("opening {id:?}"),
//!     |id| id.is_some(),
//! );
//!
//! // The command holds the handler weakly: keep it alive yourself.
//! let requery: EventHandler<CommandId> = Arc::new(|_sender: &CommandId, _args: &EventArgs| {});
//! command.subscribe_can_execute_changed(&requery);
//!
//! assert!(!command.can_execute(&None));
//! assert!(command.can_execute(&Some(7)));
//! command.raise_can_execute_changed();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod bindable;
pub mod command;
pub mod dispatch;
mod error;
pub mod weak_event;

pub use bindable::{Bindable, PropertyChanged, PropertyChangedEventArgs, PropertyChangedHandler};
pub use command::{BoxFuture, CommandBuilder, CommandId, CommandParameter, DelegateCommand};
pub use dispatch::{DispatchQueue, Dispatcher, ImmediateDispatcher, QueuedDispatcher};
pub use error::{Error, Result};
pub use weak_event::{EventArgs, EventHandler, HandlerList, SubscriptionToken, WeakEventManager};
