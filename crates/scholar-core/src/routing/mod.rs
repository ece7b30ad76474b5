//! Query routing
//!
//! The [`TutorRouter`] drives one tutoring turn:
//!
//! 1. Validate the query and resolve (or create) the conversation
//! 2. Take the conversation's turn lock so turns are recorded in order
//! 3. Classify the query with the [`Classifier`], unless the caller named
//!    a preferred specialist
//! 4. Hand the query and recent history to the matching specialist, or to
//!    the general tutor prompt
//! 5. Append the interaction and return a [`RoutedReply`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use scholar_core::routing::TutorRouter;
//!
//! let router = TutorRouter::new(invoker, store);
//! let reply = router.handle_query("2 + 2", None, None).await?;
//! println!("{} ({})", reply.response, reply.specialist);
//! ```

mod classifier;
mod router;
mod types;

pub use classifier::{Classifier, DEFAULT_CLASSIFIER_WINDOW};
pub use router::{AUTO_SPECIALIST, RouterConfig, TutorRouter};
pub use types::{Category, ReplyStatus, RoutedReply};
