//! End-to-end tests for the topic/reply lifecycle.
//!
//! These run against the in-memory store, which implements the same store
//! contract as the PostgreSQL one: atomic topic creation, atomic monotonic
//! activity updates, and derived reply counts.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};

use palaver::activity;
use palaver::auth::{Identity, IdentityProvider, StaticProvider};
use palaver::models::{
    BoardId, MemoryStore, NewBoard, NewPost, NewTopic, Post, PostId, Store,
    Topic, TopicId, TopicSummary, UserId,
};
use palaver::services;
use palaver::{Error, Result};

fn board_store() -> (MemoryStore, BoardId) {
    let store = MemoryStore::new();
    let board = store
        .insert_board(NewBoard {
            name: "general",
            description: "General discussion",
        })
        .expect("couldn't create board");

    (store, board.id)
}

fn ada() -> Identity {
    Identity::new(1, "ada")
}

fn grace() -> Identity {
    Identity::new(2, "grace")
}

#[test]
fn create_and_reply_workflow() {
    let (store, board_id) = board_store();

    // Starting a topic creates the topic and its opening post together.
    let topic =
        services::create_topic(&store, board_id, &ada(), "Hi", "Hello")
            .unwrap();

    assert_eq!(topic.subject, "Hi");
    assert_eq!(topic.starter, ada().id);
    assert_eq!(store.topic_post_count(topic.id).unwrap(), 1);
    assert_eq!(activity::reply_count(&store, topic.id).unwrap(), 0);

    // A reply from another user advances the topic's activity to the
    // reply's creation time.
    let reply =
        services::reply_topic(&store, topic.id, &grace(), "Welcome").unwrap();

    assert_eq!(reply.created_by, grace().id);
    assert_eq!(activity::reply_count(&store, topic.id).unwrap(), 1);
    assert_eq!(
        store.topic(topic.id).unwrap().last_updated,
        reply.created_at
    );

    let posts = store.posts_in_topic(topic.id).unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].message, "Hello");
    assert_eq!(posts[1].message, "Welcome");
}

#[test]
fn listing_is_ordered_by_latest_activity() {
    let (store, board_id) = board_store();

    let first =
        services::create_topic(&store, board_id, &ada(), "first", "1")
            .unwrap();
    let second =
        services::create_topic(&store, board_id, &ada(), "second", "2")
            .unwrap();
    let third =
        services::create_topic(&store, board_id, &ada(), "third", "3")
            .unwrap();

    // A reply to the oldest topic moves it to the front of the listing.
    services::reply_topic(&store, first.id, &grace(), "bump").unwrap();

    let page = services::list_topics(&store, board_id, None).unwrap();
    let order: Vec<TopicId> =
        page.items.iter().map(|s| s.topic.id).collect();

    assert_eq!(order, vec![first.id, third.id, second.id]);

    // Reply counts ride along with the listing.
    let replies: Vec<i64> = page.items.iter().map(|s| s.replies).collect();
    assert_eq!(replies, vec![1, 0, 0]);
}

#[test]
fn listing_pages_fall_back_gracefully() {
    let (store, board_id) = board_store();

    // Six topics at page width four make two pages.
    for n in 0..6 {
        services::create_topic(
            &store,
            board_id,
            &ada(),
            &format!("topic {}", n),
            "opening",
        )
        .unwrap();
    }

    let page = services::list_topics(&store, board_id, Some("abc")).unwrap();
    assert_eq!(page.num, 1);
    assert_eq!(page.items.len(), 4);
    assert!(page.has_next());

    let page = services::list_topics(&store, board_id, Some("999")).unwrap();
    assert_eq!(page.num, 2);
    assert_eq!(page.num_pages, 2);
    assert_eq!(page.items.len(), 2);
    assert!(!page.has_next());
    assert!(page.has_previous());

    // Numbers beyond u32 still land on the last page, not the first.
    let page = services::list_topics(&store, board_id, Some("99999999999999"))
        .unwrap();
    assert_eq!(page.num, 2);
}

#[test]
fn empty_board_lists_one_empty_page() {
    let (store, board_id) = board_store();

    let page = services::list_topics(&store, board_id, Some("1")).unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.num, 1);
    assert_eq!(page.num_pages, 1);
}

#[test]
fn rejected_input_persists_nothing() {
    let (store, board_id) = board_store();

    let err =
        services::create_topic(&store, board_id, &ada(), "", "x")
            .expect_err("empty subject should be rejected");

    match err {
        Error::Validation { errors } => {
            assert!(errors.field("subject").is_some());
            assert!(errors.field("message").is_none());
        }
        other => panic!("expected a validation error, got {}", other),
    }

    let page = services::list_topics(&store, board_id, None).unwrap();
    assert!(page.items.is_empty());
}

#[test]
fn reply_requires_an_authenticated_identity() {
    let (store, board_id) = board_store();

    let topic =
        services::create_topic(&store, board_id, &ada(), "Hi", "Hello")
            .unwrap();

    // The identity provider is where an unauthenticated reply gets
    // stopped; the lifecycle operation itself only ever sees identities.
    let provider = StaticProvider::anonymous();
    let attempt = provider
        .require_authenticated()
        .and_then(|author| {
            services::reply_topic(&store, topic.id, &author, "hi")
        });

    assert!(matches!(attempt, Err(Error::NotAuthenticated)));
    assert_eq!(activity::reply_count(&store, topic.id).unwrap(), 0);
}

#[test]
fn concurrent_replies_lose_nothing() {
    let (store, board_id) = board_store();
    let store = Arc::new(store);

    let topic =
        services::create_topic(&*store, board_id, &ada(), "Hi", "Hello")
            .unwrap();

    let mut handles = Vec::new();
    for n in 0..2 {
        let store = Arc::clone(&store);
        let topic_id = topic.id;

        handles.push(thread::spawn(move || {
            let author = Identity::new(10 + n, format!("user{}", n));
            services::reply_topic(&*store, topic_id, &author, "reply")
        }));
    }

    let posts: Vec<Post> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    // Both replies persisted, and the topic's activity timestamp is the
    // later of the two.
    assert_eq!(store.topic_post_count(topic.id).unwrap(), 3);

    let latest = posts.iter().map(|p| p.created_at).max().unwrap();
    assert_eq!(store.topic(topic.id).unwrap().last_updated, latest);
}

#[test]
fn views_are_deduplicated_per_viewer() {
    let (store, board_id) = board_store();

    let topic =
        services::create_topic(&store, board_id, &ada(), "Hi", "Hello")
            .unwrap();

    assert!(services::record_view(&store, topic.id, "session-a").unwrap());
    assert!(!services::record_view(&store, topic.id, "session-a").unwrap());
    assert!(services::record_view(&store, topic.id, "session-b").unwrap());

    assert_eq!(store.topic(topic.id).unwrap().views, 2);

    // Viewing is not activity; the listing order must not change.
    assert_eq!(
        store.topic(topic.id).unwrap().last_updated,
        topic.last_updated
    );
}

/// A store that accepts reads but fails every mutation, for checking that
/// the lifecycle operations never leave partial state behind on storage
/// failure.
struct RefusingStore {
    inner: MemoryStore,
}

fn refused<T>() -> Result<T> {
    Err(Error::DatabaseError(
        diesel::result::Error::RollbackTransaction,
    ))
}

impl Store for RefusingStore {
    fn all_boards(&self) -> Result<Vec<palaver::models::Board>> {
        self.inner.all_boards()
    }

    fn board(&self, board_id: BoardId) -> Result<palaver::models::Board> {
        self.inner.board(board_id)
    }

    fn insert_board(
        &self,
        _new_board: NewBoard,
    ) -> Result<palaver::models::Board> {
        refused()
    }

    fn topic(&self, topic_id: TopicId) -> Result<Topic> {
        self.inner.topic(topic_id)
    }

    fn create_topic(
        &self,
        _new_topic: NewTopic,
        _opening_message: &str,
    ) -> Result<Topic> {
        refused()
    }

    fn topic_summaries(
        &self,
        board_id: BoardId,
    ) -> Result<Vec<TopicSummary>> {
        self.inner.topic_summaries(board_id)
    }

    fn touch_topic(
        &self,
        _topic_id: TopicId,
        _at: DateTime<Utc>,
    ) -> Result<()> {
        refused()
    }

    fn record_view(&self, _topic_id: TopicId, _viewer: &str) -> Result<bool> {
        refused()
    }

    fn post(&self, post_id: PostId) -> Result<Post> {
        self.inner.post(post_id)
    }

    fn insert_post(&self, _new_post: NewPost) -> Result<Post> {
        refused()
    }

    fn posts_in_topic(&self, topic_id: TopicId) -> Result<Vec<Post>> {
        self.inner.posts_in_topic(topic_id)
    }

    fn topic_post_count(&self, topic_id: TopicId) -> Result<u32> {
        self.inner.topic_post_count(topic_id)
    }

    fn update_post(
        &self,
        _post_id: PostId,
        _message: &str,
        _editor: UserId,
        _at: DateTime<Utc>,
    ) -> Result<Post> {
        refused()
    }
}

#[test]
fn failed_topic_creation_leaves_no_orphan() {
    let inner = MemoryStore::new();
    let board = inner
        .insert_board(NewBoard {
            name: "general",
            description: "General discussion",
        })
        .unwrap();
    let store = RefusingStore { inner };

    let err = services::create_topic(&store, board.id, &ada(), "Hi", "Hello")
        .expect_err("the store refuses all writes");
    assert!(matches!(err, Error::DatabaseError(_)));

    // Creation is a single atomic store operation, so nothing is visible
    // afterwards.
    let page = services::list_topics(&store, board.id, None).unwrap();
    assert!(page.items.is_empty());
}
