//! Services layer
//!
//! - `identity`: ids, slugs, reading time, display dates
//! - `resolver`: matching a record against the cached posts
//! - `reconcile`: the memoized hosted / snapshot / local load
//! - `blog`: the public data-access API, split across `taxonomy`, `media`
//!   and `transfer`

pub mod blog;
pub mod identity;
pub mod media;
pub mod reconcile;
pub mod resolver;
pub mod taxonomy;
pub mod transfer;

pub use blog::{BlogError, BlogService};
pub use identity::{calculate_reading_time, format_date, generate_slug};
pub use media::DEFAULT_IMAGE_LIST_LIMIT;
pub use reconcile::{LoadOutcome, Reconciler};
pub use resolver::{resolve, IdentityKey, IdentityMatch};
