//! The topic/reply lifecycle operations.
//!
//! Each operation here is a plain function over explicit inputs: the store,
//! the acting identity, and the user's input. The caller (an HTTP layer, the
//! control binary, a test) is responsible for resolving the identity and
//! presenting the result.

use chrono::offset::Utc;

use log::info;

use crate::activity;
use crate::auth::Identity;
use crate::models::{
    BoardId, NewPost, NewTopic, Post, PostId, Store, Topic, TopicId,
    TopicSummary,
};
use crate::pagination::{page_number, Page, Paginator};
use crate::{Error, FieldError, FieldErrors, Result};

/// How many topics fit on one page of a board listing.
pub const TOPIC_PAGE_WIDTH: u32 = 4;

fn require_non_empty(
    errors: &mut FieldErrors,
    field: &'static str,
    value: &str,
) {
    if value.trim().is_empty() {
        errors.0.push(FieldError {
            field,
            message: "must not be empty".into(),
        });
    }
}

/// Start a new topic on a board, with its opening post.
///
/// The topic and the opening post are written as one atomic store
/// operation; a failure leaves neither behind. Both are attributed to
/// `starter`, and the topic's `last_updated` starts at the creation time.
pub fn create_topic<S: Store>(
    store: &S,
    board_id: BoardId,
    starter: &Identity,
    subject: &str,
    message: &str,
) -> Result<Topic> {
    let board = store.board(board_id)?;

    let mut errors = FieldErrors::default();
    require_non_empty(&mut errors, "subject", subject);
    require_non_empty(&mut errors, "message", message);

    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }

    let topic = store.create_topic(
        NewTopic {
            subject,
            board: board.id,
            starter: starter.id,
            last_updated: Utc::now(),
        },
        message,
    )?;

    info!(
        "user #{} started topic #{} on board '{}'",
        starter.id, topic.id, board.name
    );

    Ok(topic)
}

/// Add a reply to an existing topic.
///
/// `author` must be an authenticated identity; resolving one is the
/// caller's job (see [`crate::auth::IdentityProvider`]). After the post is
/// durably attached, the topic's activity timestamp is advanced to the
/// post's creation time.
pub fn reply_topic<S: Store>(
    store: &S,
    topic_id: TopicId,
    author: &Identity,
    message: &str,
) -> Result<Post> {
    let topic = store.topic(topic_id)?;

    let mut errors = FieldErrors::default();
    require_non_empty(&mut errors, "message", message);

    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }

    let post = store.insert_post(NewPost {
        message,
        topic: topic.id,
        created_by: author.id,
        created_at: Utc::now(),
    })?;

    activity::record_activity(store, topic.id, post.created_at)?;

    info!("user #{} replied to topic #{}", author.id, topic.id);

    Ok(post)
}

/// One page of a board's topics, ordered by most recent activity and
/// annotated with reply counts.
///
/// `page_param` is the untrusted page request, straight from the query
/// string; see [`crate::pagination`] for the fallback policy.
pub fn list_topics<S: Store>(
    store: &S,
    board_id: BoardId,
    page_param: Option<&str>,
) -> Result<Page<TopicSummary>> {
    let board = store.board(board_id)?;

    let summaries = store.topic_summaries(board.id)?;

    Ok(Paginator::new(summaries, TOPIC_PAGE_WIDTH)
        .page(page_number(page_param)))
}

/// Rewrite the message of an existing post.
///
/// The edit is stamped with `editor` and the edit time. It does not advance
/// the parent topic's `last_updated`; only new posts count as activity.
pub fn edit_post<S: Store>(
    store: &S,
    post_id: PostId,
    editor: &Identity,
    message: &str,
) -> Result<Post> {
    let post = store.post(post_id)?;

    let mut errors = FieldErrors::default();
    require_non_empty(&mut errors, "message", message);

    if !errors.is_empty() {
        return Err(Error::Validation { errors });
    }

    let updated = store.update_post(post.id, message, editor.id, Utc::now())?;

    info!("user #{} edited post #{}", editor.id, post.id);

    Ok(updated)
}

/// Count a view of a topic, at most once per viewer token.
///
/// The token is opaque to the core; callers derive it from whatever session
/// notion they have. Returns whether the view was counted.
pub fn record_view<S: Store>(
    store: &S,
    topic_id: TopicId,
    viewer: &str,
) -> Result<bool> {
    let topic = store.topic(topic_id)?;

    store.record_view(topic.id, viewer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemoryStore, NewBoard};

    fn store_with_board() -> (MemoryStore, BoardId) {
        let store = MemoryStore::new();
        let board = store
            .insert_board(NewBoard {
                name: "general",
                description: "General discussion",
            })
            .unwrap();

        (store, board.id)
    }

    #[test]
    fn empty_fields_are_all_reported() {
        let (store, board_id) = store_with_board();
        let user = Identity::new(1, "ada");

        let err = create_topic(&store, board_id, &user, " ", "")
            .expect_err("blank input should be rejected");

        match err {
            Error::Validation { errors } => {
                assert!(errors.field("subject").is_some());
                assert!(errors.field("message").is_some());
            }
            other => panic!("expected a validation error, got {}", other),
        }
    }

    #[test]
    fn unknown_board_is_not_found() {
        let (store, _) = store_with_board();
        let user = Identity::new(1, "ada");

        assert!(matches!(
            create_topic(&store, 42, &user, "Hi", "Hello"),
            Err(Error::BoardNotFound { board_id: 42 })
        ));

        assert!(matches!(
            list_topics(&store, 42, None),
            Err(Error::BoardNotFound { board_id: 42 })
        ));
    }

    #[test]
    fn reply_to_unknown_topic_is_not_found() {
        let (store, _) = store_with_board();
        let user = Identity::new(1, "ada");

        assert!(matches!(
            reply_topic(&store, 7, &user, "hello"),
            Err(Error::TopicNotFound { topic_id: 7 })
        ));
    }

    #[test]
    fn blank_reply_is_rejected() {
        let (store, board_id) = store_with_board();
        let user = Identity::new(1, "ada");

        let topic =
            create_topic(&store, board_id, &user, "Hi", "Hello").unwrap();

        let err = reply_topic(&store, topic.id, &user, "   ")
            .expect_err("blank reply should be rejected");

        match err {
            Error::Validation { errors } => {
                assert!(errors.field("message").is_some());
            }
            other => panic!("expected a validation error, got {}", other),
        }

        assert_eq!(store.topic_post_count(topic.id).unwrap(), 1);
    }

    #[test]
    fn editing_does_not_count_as_activity() {
        let (store, board_id) = store_with_board();
        let ada = Identity::new(1, "ada");

        let topic =
            create_topic(&store, board_id, &ada, "Hi", "Hello").unwrap();
        let posts = store.posts_in_topic(topic.id).unwrap();
        let opening = &posts[0];

        let edited =
            edit_post(&store, opening.id, &ada, "Hello, edited").unwrap();

        assert_eq!(edited.message, "Hello, edited");
        assert_eq!(edited.updated_by, Some(ada.id));
        assert!(edited.updated_at.is_some());
        assert_eq!(edited.created_at, opening.created_at);

        // The edit must not reorder the board listing.
        assert_eq!(
            store.topic(topic.id).unwrap().last_updated,
            topic.last_updated
        );
    }
}
