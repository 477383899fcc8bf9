//! Tracking topic activity.
//!
//! A topic's `last_updated` timestamp drives the board listing order, and
//! its reply count is derived from its posts rather than stored. Both live
//! here so there is exactly one mutation path for activity and no second
//! counter that could drift.

use chrono::offset::Utc;
use chrono::DateTime;

use crate::models::{Store, TopicId};
use crate::Result;

/// Record activity on a topic after a new post has been durably attached
/// to it.
///
/// Persists `last_updated = at` with an atomic per-topic update that never
/// moves the timestamp backwards. Storage failure propagates to the caller.
pub fn record_activity<S: Store>(
    store: &S,
    topic_id: TopicId,
    at: DateTime<Utc>,
) -> Result<()> {
    store.touch_topic(topic_id, at)
}

/// The number of replies in a topic: the post count minus the opening post.
///
/// Every topic has at least its opening post, so this is never negative.
pub fn reply_count<S: Store>(store: &S, topic_id: TopicId) -> Result<u32> {
    Ok(store.topic_post_count(topic_id)?.saturating_sub(1))
}
