//! End-to-end tests for the chat core: lifecycle state machine, assignment
//! race, transcript guarantees and router/broadcast behavior.

use std::sync::Arc;

use helpdesk_chats::{
    ClientEvent, LifecycleService, MessageRouter, RoomRegistry, ServerEvent, SessionId,
    SESSION_CHANNEL_CAPACITY,
};
use helpdesk_config::DatabaseConfig;
use helpdesk_database::{ChatError, ChatStatus, SenderType};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::sync::mpsc;

async fn create_test_pool() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("chats.db");

    let config = DatabaseConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections: 5,
    };

    let pool = helpdesk_database::initialize_database(&config)
        .await
        .unwrap();
    (pool, temp_dir)
}

struct RouterHarness {
    lifecycle: Arc<LifecycleService>,
    rooms: Arc<RoomRegistry>,
    router: MessageRouter,
    _temp_dir: TempDir,
}

impl RouterHarness {
    async fn new() -> Self {
        let (pool, temp_dir) = create_test_pool().await;
        let lifecycle = Arc::new(LifecycleService::new(pool));
        let rooms = Arc::new(RoomRegistry::new());
        let router = MessageRouter::new(lifecycle.clone(), rooms.clone());

        Self {
            lifecycle,
            rooms,
            router,
            _temp_dir: temp_dir,
        }
    }

    async fn connect(&self) -> (SessionId, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(SESSION_CHANNEL_CAPACITY);
        (self.rooms.register(tx).await, rx)
    }
}

#[tokio::test]
async fn create_chat_with_initial_message_scenario() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let chat = lifecycle.create_chat("Alice", Some("Hi")).await.unwrap();

    assert_eq!(chat.status, ChatStatus::Pending);
    assert_eq!(chat.agent_id, None);
    assert_eq!(chat.transcript, "Initial Message: Hi\n");

    let messages = lifecycle.list_messages(&chat.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_type, SenderType::Customer);
    assert_eq!(messages[0].sender_id, chat.id);
    assert_eq!(messages[0].content, "Hi");
}

#[tokio::test]
async fn create_chat_requires_customer_name() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let err = lifecycle.create_chat("", Some("Hi")).await.unwrap_err();
    assert!(matches!(err, ChatError::ValidationError(_)));

    let err = lifecycle.create_chat("   ", None).await.unwrap_err();
    assert!(matches!(err, ChatError::ValidationError(_)));
}

#[tokio::test]
async fn concurrent_assignment_has_exactly_one_winner() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = Arc::new(LifecycleService::new(pool));

    let chat = lifecycle.create_chat("Bob", None).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let lifecycle = lifecycle.clone();
        let chat_id = chat.id.clone();
        handles.push(tokio::spawn(async move {
            let agent_id = format!("agent-{i}");
            (agent_id.clone(), lifecycle.assign_agent(&chat_id, &agent_id).await)
        }));
    }

    let mut winners = Vec::new();
    let mut losers = 0;
    for handle in handles {
        let (agent_id, result) = handle.await.unwrap();
        match result {
            Ok(chat) => {
                assert_eq!(chat.status, ChatStatus::Active);
                assert_eq!(chat.agent_id.as_deref(), Some(agent_id.as_str()));
                winners.push(agent_id);
            }
            Err(ChatError::AlreadyAssigned) => losers += 1,
            Err(other) => panic!("unexpected assignment error: {other}"),
        }
    }

    assert_eq!(winners.len(), 1, "exactly one agent must win the claim");
    assert_eq!(losers, 7);

    let final_chat = lifecycle.get_chat(&chat.id).await.unwrap();
    assert_eq!(final_chat.status, ChatStatus::Active);
    assert_eq!(final_chat.agent_id.as_deref(), Some(winners[0].as_str()));
}

#[tokio::test]
async fn assignment_distinguishes_missing_from_taken() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let err = lifecycle
        .assign_agent("no-such-chat", "agent-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ChatNotFound));

    let chat = lifecycle.create_chat("Carol", None).await.unwrap();
    lifecycle.assign_agent(&chat.id, "agent-1").await.unwrap();

    let err = lifecycle
        .assign_agent(&chat.id, "agent-2")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::AlreadyAssigned));
}

#[tokio::test]
async fn transcript_is_the_ordered_concatenation_of_sends() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let chat = lifecycle.create_chat("Dora", None).await.unwrap();
    lifecycle.assign_agent(&chat.id, "agent-1").await.unwrap();

    let mut expected = String::new();
    for (sender_id, sender_type, content) in [
        (chat.id.as_str(), SenderType::Customer, "my printer is on fire"),
        ("agent-1", SenderType::Agent, "have you tried water?"),
        (chat.id.as_str(), SenderType::Customer, "it is an inkjet"),
    ] {
        let message = lifecycle
            .append_message(&chat.id, sender_id, sender_type, content)
            .await
            .unwrap();
        expected.push_str(&format!(
            "{} - {}: {}\n",
            message.timestamp,
            sender_type.label(),
            content
        ));
    }

    let stored = lifecycle.get_chat(&chat.id).await.unwrap();
    assert_eq!(stored.transcript, expected);

    let timestamps: Vec<String> = lifecycle
        .list_messages(&chat.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.timestamp)
        .collect();
    let mut sorted = timestamps.clone();
    sorted.sort();
    assert_eq!(timestamps, sorted, "timestamps must be non-decreasing");
}

#[tokio::test]
async fn no_message_lands_after_close() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let chat = lifecycle.create_chat("Eve", Some("hello?")).await.unwrap();
    lifecycle.close_chat(&chat.id, &chat.id).await.unwrap();

    let err = lifecycle
        .append_message(&chat.id, &chat.id, SenderType::Customer, "still there?")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ValidationError(_)));

    let after = lifecycle.get_chat(&chat.id).await.unwrap();
    assert_eq!(after.transcript, "Initial Message: hello?\n");
    assert_eq!(lifecycle.list_messages(&chat.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn close_is_idempotent() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let chat = lifecycle.create_chat("Finn", None).await.unwrap();

    let first = lifecycle.close_chat(&chat.id, "agent-1").await.unwrap();
    assert_eq!(first.status, ChatStatus::Closed);

    let second = lifecycle.close_chat(&chat.id, "agent-1").await.unwrap();
    assert_eq!(second.status, ChatStatus::Closed);
    assert_eq!(first.transcript, second.transcript);
}

#[tokio::test]
async fn close_works_from_pending_and_active() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let pending = lifecycle.create_chat("Gil", None).await.unwrap();
    let closed = lifecycle.close_chat(&pending.id, &pending.id).await.unwrap();
    assert_eq!(closed.status, ChatStatus::Closed);

    let active = lifecycle.create_chat("Hana", None).await.unwrap();
    lifecycle.assign_agent(&active.id, "agent-1").await.unwrap();
    let closed = lifecycle.close_chat(&active.id, "agent-1").await.unwrap();
    assert_eq!(closed.status, ChatStatus::Closed);
    assert_eq!(closed.agent_id.as_deref(), Some("agent-1"));
}

#[tokio::test]
async fn closed_chats_cannot_be_assigned() {
    let (pool, _temp_dir) = create_test_pool().await;
    let lifecycle = LifecycleService::new(pool);

    let chat = lifecycle.create_chat("Ida", None).await.unwrap();
    lifecycle.close_chat(&chat.id, &chat.id).await.unwrap();

    let err = lifecycle
        .assign_agent(&chat.id, "agent-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::AlreadyAssigned));

    let chat = lifecycle.get_chat(&chat.id).await.unwrap();
    assert_eq!(chat.status, ChatStatus::Closed);
    assert_eq!(chat.agent_id, None);
}

#[tokio::test]
async fn join_broadcasts_user_joined_to_the_room() {
    let harness = RouterHarness::new().await;
    let chat = harness.lifecycle.create_chat("Jo", None).await.unwrap();

    let (customer, mut customer_rx) = harness.connect().await;
    let (agent, mut agent_rx) = harness.connect().await;

    harness
        .router
        .handle_event(
            customer,
            ClientEvent::Join {
                chat_id: chat.id.clone(),
                user_id: chat.id.clone(),
                user_type: SenderType::Customer,
            },
        )
        .await;

    // The joiner hears about itself.
    assert_eq!(
        customer_rx.recv().await,
        Some(ServerEvent::UserJoined {
            user_id: chat.id.clone()
        })
    );

    harness
        .router
        .handle_event(
            agent,
            ClientEvent::Join {
                chat_id: chat.id.clone(),
                user_id: "agent-1".into(),
                user_type: SenderType::Agent,
            },
        )
        .await;

    let expected = ServerEvent::UserJoined {
        user_id: "agent-1".into(),
    };
    assert_eq!(customer_rx.recv().await, Some(expected.clone()));
    assert_eq!(agent_rx.recv().await, Some(expected));
}

#[tokio::test]
async fn send_message_persists_then_broadcasts() {
    let harness = RouterHarness::new().await;
    let chat = harness.lifecycle.create_chat("Kim", None).await.unwrap();

    let (customer, mut customer_rx) = harness.connect().await;
    let (agent, mut agent_rx) = harness.connect().await;
    for (session, user_id, user_type) in [
        (customer, chat.id.clone(), SenderType::Customer),
        (agent, "agent-1".to_string(), SenderType::Agent),
    ] {
        harness
            .router
            .handle_event(
                session,
                ClientEvent::Join {
                    chat_id: chat.id.clone(),
                    user_id,
                    user_type,
                },
            )
            .await;
    }
    // Drain the join notifications.
    customer_rx.recv().await;
    customer_rx.recv().await;
    agent_rx.recv().await;

    harness
        .router
        .handle_event(
            customer,
            ClientEvent::SendMessage {
                chat_id: chat.id.clone(),
                sender_id: chat.id.clone(),
                sender_type: SenderType::Customer,
                content: "hello".into(),
            },
        )
        .await;

    let stored = harness.lifecycle.list_messages(&chat.id).await.unwrap();
    assert_eq!(stored.len(), 1);

    for rx in [&mut customer_rx, &mut agent_rx] {
        match rx.recv().await {
            Some(ServerEvent::ReceiveMessage {
                message_id,
                sender_id,
                sender_type,
                content,
                timestamp,
            }) => {
                assert_eq!(message_id, stored[0].id);
                assert_eq!(sender_id, chat.id);
                assert_eq!(sender_type, SenderType::Customer);
                assert_eq!(content, "hello");
                assert_eq!(timestamp, stored[0].timestamp);
            }
            other => panic!("expected receive_message, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn send_to_closed_chat_errors_sender_only_and_stores_nothing() {
    let harness = RouterHarness::new().await;
    let chat = harness.lifecycle.create_chat("Lea", None).await.unwrap();

    let (customer, mut customer_rx) = harness.connect().await;
    let (agent, mut agent_rx) = harness.connect().await;
    for (session, user_id, user_type) in [
        (customer, chat.id.clone(), SenderType::Customer),
        (agent, "agent-1".to_string(), SenderType::Agent),
    ] {
        harness
            .router
            .handle_event(
                session,
                ClientEvent::Join {
                    chat_id: chat.id.clone(),
                    user_id,
                    user_type,
                },
            )
            .await;
    }
    customer_rx.recv().await;
    customer_rx.recv().await;
    agent_rx.recv().await;

    harness
        .lifecycle
        .close_chat(&chat.id, "agent-1")
        .await
        .unwrap();

    harness
        .router
        .handle_event(
            customer,
            ClientEvent::SendMessage {
                chat_id: chat.id.clone(),
                sender_id: chat.id.clone(),
                sender_type: SenderType::Customer,
                content: "too late".into(),
            },
        )
        .await;

    assert!(matches!(
        customer_rx.recv().await,
        Some(ServerEvent::Error { .. })
    ));
    assert!(
        agent_rx.try_recv().is_err(),
        "errors must not be broadcast to the room"
    );
    assert!(harness.lifecycle.list_messages(&chat.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_events_are_rejected_to_the_sender() {
    let harness = RouterHarness::new().await;
    let (session, mut rx) = harness.connect().await;

    harness
        .router
        .handle_event(
            session,
            ClientEvent::Join {
                chat_id: "".into(),
                user_id: "u1".into(),
                user_type: SenderType::Customer,
            },
        )
        .await;
    assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));

    harness
        .router
        .handle_event(
            session,
            ClientEvent::SendMessage {
                chat_id: "c1".into(),
                sender_id: "u1".into(),
                sender_type: SenderType::Customer,
                content: "".into(),
            },
        )
        .await;
    assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));

    harness
        .router
        .handle_event(
            session,
            ClientEvent::CloseChat {
                chat_id: "c1".into(),
                closer_id: "".into(),
            },
        )
        .await;
    assert!(matches!(rx.recv().await, Some(ServerEvent::Error { .. })));
}

#[tokio::test]
async fn close_chat_broadcasts_and_duplicate_close_repeats_same_content() {
    let harness = RouterHarness::new().await;
    let chat = harness.lifecycle.create_chat("Mia", None).await.unwrap();

    let (session, mut rx) = harness.connect().await;
    harness
        .router
        .handle_event(
            session,
            ClientEvent::Join {
                chat_id: chat.id.clone(),
                user_id: "agent-1".into(),
                user_type: SenderType::Agent,
            },
        )
        .await;
    rx.recv().await;

    let close = ClientEvent::CloseChat {
        chat_id: chat.id.clone(),
        closer_id: "agent-1".into(),
    };
    harness.router.handle_event(session, close.clone()).await;
    harness.router.handle_event(session, close).await;

    let expected = ServerEvent::ChatClosed {
        chat_id: chat.id.clone(),
        closer_id: "agent-1".into(),
    };
    assert_eq!(rx.recv().await, Some(expected.clone()));
    assert_eq!(rx.recv().await, Some(expected));
}

#[tokio::test]
async fn disconnect_removes_membership() {
    let harness = RouterHarness::new().await;
    let chat = harness.lifecycle.create_chat("Noa", None).await.unwrap();

    let (stayer, mut stayer_rx) = harness.connect().await;
    let (leaver, mut leaver_rx) = harness.connect().await;
    for session in [stayer, leaver] {
        harness
            .router
            .handle_event(
                session,
                ClientEvent::Join {
                    chat_id: chat.id.clone(),
                    user_id: format!("user-{session}"),
                    user_type: SenderType::Customer,
                },
            )
            .await;
    }
    stayer_rx.recv().await;
    stayer_rx.recv().await;
    leaver_rx.recv().await;

    harness.router.disconnect(leaver).await;

    harness
        .router
        .handle_event(
            stayer,
            ClientEvent::SendMessage {
                chat_id: chat.id.clone(),
                sender_id: chat.id.clone(),
                sender_type: SenderType::Customer,
                content: "anyone?".into(),
            },
        )
        .await;

    assert!(matches!(
        stayer_rx.recv().await,
        Some(ServerEvent::ReceiveMessage { .. })
    ));
    assert!(leaver_rx.try_recv().is_err());
}
