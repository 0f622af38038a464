//! Dispatcher behaviour against the sample command tree

mod helpers;

use std::sync::{Arc, Barrier};

use assert_matches::assert_matches;
use helpers::*;
use StackBot::engine::{
    Command, CommandSpec, CommandType, Dispatcher, DispatchOutcome, EventKind, FallbackPolicy, HandlerRegistry,
    InboundEvent, InboundSender, NavigationResult, OutboundEffect, Param, Reply, UnhandledReason,
};
use StackBot::utils::errors::{InvocationError, NavigationError};

fn stack_types(snapshot: &[StackBot::engine::EntrySnapshot]) -> Vec<CommandType> {
    snapshot.iter().map(|entry| entry.command_type).collect()
}

async fn types_of(dispatcher: &Dispatcher, conversation_id: i64) -> Vec<CommandType> {
    stack_types(&dispatcher.snapshot(chat(conversation_id)).await.unwrap())
}

#[tokio::test]
async fn test_text_on_root_without_text_handler_is_unhandled() {
    let dispatcher = sample_dispatcher();

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "hello")).await;
    assert_matches!(
        outcome,
        DispatchOutcome::Unhandled(UnhandledReason::NoHandler { command, kind: EventKind::Text })
            if command == CommandType::of::<RootCommand>()
    );
    let after_first = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert_eq!(stack_types(&after_first), vec![CommandType::of::<RootCommand>()]);

    dispatcher.dispatch(InboundEvent::text(CHAT, "again")).await;
    assert_eq!(dispatcher.snapshot(chat(CHAT)).await.unwrap(), after_first);
}

#[tokio::test]
async fn test_command_handler_pushes_sub_command() {
    let dispatcher = sample_dispatcher();

    let outcome = dispatcher.dispatch(command(CHAT, "/open")).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Pushed { current: CommandType::of::<ScreenCommand>() })
    );
    assert_eq!(
        types_of(&dispatcher, CHAT).await,
        vec![CommandType::of::<RootCommand>(), CommandType::of::<ScreenCommand>()]
    );
    assert_eq!(dispatcher.current_command(chat(CHAT)).await, Some(CommandType::of::<ScreenCommand>()));
}

#[tokio::test]
async fn test_pop_restores_the_same_root_instance() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/hello")).await;
    let root_before = dispatcher.snapshot(chat(CHAT)).await.unwrap()[0].instance_id;

    dispatcher.dispatch(command(CHAT, "/open")).await;
    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "back")).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Popped {
            removed: CommandType::of::<ScreenCommand>(),
            current: CommandType::of::<RootCommand>(),
        })
    );
    let snapshot = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].instance_id, root_before);
}

#[tokio::test]
async fn test_pop_on_root_is_rejected_and_stack_unchanged() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/hello")).await;
    let before = dispatcher.snapshot(chat(CHAT)).await.unwrap();

    let outcome = dispatcher.dispatch(command(CHAT, "/pop")).await;

    assert_eq!(outcome.navigation(), Some(&NavigationResult::Rejected(NavigationError::CannotPopRoot)));
    let after = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].instance_id, before[0].instance_id);
    assert_eq!(dispatcher.current_command(chat(CHAT)).await, Some(CommandType::of::<RootCommand>()));
}

#[tokio::test]
async fn test_replace_swaps_only_the_top() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/open")).await;
    let before = dispatcher.snapshot(chat(CHAT)).await.unwrap();

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "replace")).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Replaced {
            removed: CommandType::of::<ScreenCommand>(),
            current: CommandType::of::<OtherCommand>(),
        })
    );
    let after = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert_eq!(after.len(), 2);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1].command_type, CommandType::of::<OtherCommand>());
    assert_ne!(after[1].instance_id, before[1].instance_id);
}

#[tokio::test]
async fn test_reset_returns_to_root() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/open")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "deeper")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "deeper")).await;
    assert_eq!(types_of(&dispatcher, CHAT).await.len(), 4);

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "reset")).await;

    assert_eq!(outcome.navigation(), Some(&NavigationResult::Reset { removed: 3 }));
    assert_eq!(types_of(&dispatcher, CHAT).await, vec![CommandType::of::<RootCommand>()]);
}

#[tokio::test]
async fn test_failed_handler_leaves_stack_and_data_untouched() {
    let observer = Arc::new(CountingObserver::default());
    let dispatcher = Dispatcher::builder(sample_registry())
        .root(RootCommand::default)
        .observer(observer.clone())
        .build()
        .unwrap();

    dispatcher.dispatch(command(CHAT, "/open")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "hi")).await;
    let before = dispatcher.snapshot(chat(CHAT)).await.unwrap();

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "fail")).await;

    assert_matches!(
        &outcome,
        DispatchOutcome::Failed(InvocationError::Handler { command, kind: EventKind::Text, .. })
            if *command == CommandType::of::<ScreenCommand>()
    );
    assert!(outcome.effects().is_empty());
    assert_eq!(dispatcher.snapshot(chat(CHAT)).await.unwrap(), before);
    assert!(!dispatcher.conversation_data(chat(CHAT)).await.unwrap().contains(DATA_KEY));
    assert_eq!(observer.failures(), 1);
    assert!(observer.last_failure.lock().unwrap().as_deref().unwrap().contains("screen failed"));
}

#[tokio::test]
async fn test_failed_root_handler_drops_its_effects() {
    let dispatcher = sample_dispatcher();

    let outcome = dispatcher.dispatch(command(CHAT, "/fail")).await;

    assert!(outcome.is_failed());
    assert!(outcome.effects().is_empty());
    let snapshot = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert!(!snapshot[0].state.contains("fail"));
    assert!(dispatcher.conversation_data(chat(CHAT)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_panicking_handler_is_contained() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/open")).await;
    let before = dispatcher.snapshot(chat(CHAT)).await.unwrap();

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "panic")).await;

    assert_matches!(
        &outcome,
        DispatchOutcome::Failed(InvocationError::Panicked { message, .. }) if message.contains("screen panicked")
    );
    assert_eq!(dispatcher.snapshot(chat(CHAT)).await.unwrap(), before);

    // The conversation keeps working
    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "still here")).await;
    assert_eq!(outcome.effects()[0].text(), Some("screen got still here"));
}

#[tokio::test]
async fn test_declined_event_keeps_state_changes() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/open")).await;

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "decline")).await;

    assert_matches!(
        outcome,
        DispatchOutcome::Unhandled(UnhandledReason::Declined { command })
            if command == CommandType::of::<ScreenCommand>()
    );
    let snapshot = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert!(snapshot[1].state.contains("visits: 1"));
    let data = dispatcher.conversation_data(chat(CHAT)).await.unwrap();
    assert_eq!(data.get_string(DATA_KEY).as_deref(), Some("declined"));
}

#[tokio::test]
async fn test_unbindable_event_is_unhandled() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/menu")).await;

    let outcome = dispatcher.dispatch(InboundEvent::callback(CHAT, "PING", None)).await;
    assert_matches!(
        outcome,
        DispatchOutcome::Unhandled(UnhandledReason::Unbindable { cause, .. }) if cause.param == Param::MessageId
    );

    let outcome = dispatcher.dispatch(InboundEvent::callback(CHAT, "PING", Some(42))).await;
    assert_matches!(
        outcome.effects(),
        [OutboundEffect::EditMessage { message_id: 42, text, .. }] if text == "pressed PING"
    );
}

#[tokio::test]
async fn test_effects_are_returned_in_order() {
    let dispatcher = sample_dispatcher();

    let outcome = dispatcher.dispatch(command(CHAT, "/hello")).await;

    let report = outcome.report().unwrap();
    assert_eq!(report.command, CommandType::of::<RootCommand>());
    assert_eq!(report.kind, EventKind::Command);
    assert!(!report.fallback);
    assert_eq!(report.navigation, NavigationResult::Unchanged);
    assert_eq!(outcome.effects().len(), 1);
    assert_eq!(outcome.effects()[0].conversation_id(), chat(CHAT));
    assert_eq!(outcome.effects()[0].text(), Some("hello from root"));
}

#[tokio::test]
async fn test_push_of_unregistered_command_is_rejected() {
    let dispatcher = sample_dispatcher();

    let outcome = dispatcher.dispatch(command(CHAT, "/orphan")).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Rejected(NavigationError::UnregisteredCommand {
            command: CommandType::of::<OrphanCommand>()
        }))
    );
    assert_eq!(types_of(&dispatcher, CHAT).await, vec![CommandType::of::<RootCommand>()]);
}

#[tokio::test]
async fn test_depth_limit_rejects_push() {
    let dispatcher = Dispatcher::builder(sample_registry())
        .root(RootCommand::default)
        .max_depth(2)
        .build()
        .unwrap();
    dispatcher.dispatch(command(CHAT, "/open")).await;

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "deeper")).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Rejected(NavigationError::DepthExceeded { limit: 2 }))
    );
    assert_eq!(types_of(&dispatcher, CHAT).await.len(), 2);
}

#[tokio::test]
async fn test_fallback_ignore_reports_unhandled() {
    let dispatcher = sample_dispatcher_with(FallbackPolicy::Ignore);
    dispatcher.dispatch(command(CHAT, "/open")).await;

    let outcome = dispatcher.dispatch(command(CHAT, "/hello")).await;

    assert_matches!(
        outcome,
        DispatchOutcome::Unhandled(UnhandledReason::NoHandler { command, kind: EventKind::Command })
            if command == CommandType::of::<ScreenCommand>()
    );
}

#[tokio::test]
async fn test_fallback_root_offers_event_to_root() {
    let dispatcher = sample_dispatcher_with(FallbackPolicy::Root);
    dispatcher.dispatch(command(CHAT, "/open")).await;

    let outcome = dispatcher.dispatch(command(CHAT, "/hello")).await;

    let report = outcome.report().unwrap();
    assert!(report.fallback);
    assert_eq!(report.command, CommandType::of::<RootCommand>());
    assert_eq!(outcome.effects()[0].text(), Some("hello from root"));
    assert_eq!(dispatcher.current_command(chat(CHAT)).await, Some(CommandType::of::<ScreenCommand>()));

    // The root declines unknown commands, so the original reason is reported
    let outcome = dispatcher.dispatch(command(CHAT, "/unknown")).await;
    assert_matches!(
        outcome,
        DispatchOutcome::Unhandled(UnhandledReason::NoHandler { command, .. })
            if command == CommandType::of::<ScreenCommand>()
    );
}

#[tokio::test]
async fn test_back_input_pops_and_refreshes_previous() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/open")).await;

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "_BACK")).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Popped {
            removed: CommandType::of::<ScreenCommand>(),
            current: CommandType::of::<RootCommand>(),
        })
    );
    assert_eq!(outcome.effects()[0].text(), Some("root refreshed"));
    let snapshot = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].state.contains("refreshes: 1"));
}

#[tokio::test]
async fn test_back_input_on_root_only_refreshes() {
    let dispatcher = sample_dispatcher();

    let outcome = dispatcher.dispatch(InboundEvent::callback(CHAT, "_BACK", Some(1))).await;

    assert_eq!(outcome.navigation(), Some(&NavigationResult::Unchanged));
    assert_eq!(outcome.effects()[0].text(), Some("root refreshed"));
    assert_eq!(types_of(&dispatcher, CHAT).await.len(), 1);
}

#[tokio::test]
async fn test_refresh_input_refreshes_current() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/open")).await;

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "_REFRESH")).await;

    assert_eq!(outcome.navigation(), Some(&NavigationResult::Unchanged));
    assert_eq!(outcome.effects()[0].text(), Some("screen shown"));
    assert_eq!(outcome.report().unwrap().kind, EventKind::Refresh);
}

#[tokio::test]
async fn test_menu_entry_pushes_target_and_refreshes_it() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/menu")).await;
    let shown = dispatcher.dispatch(InboundEvent::text(CHAT, "_REFRESH")).await;
    assert_matches!(
        shown.effects(),
        [OutboundEffect::SendMessage { buttons, .. }] if buttons.len() == 3 && buttons[0][0].data == "SCREEN"
    );

    let outcome = dispatcher.dispatch(InboundEvent::callback(CHAT, "SCREEN", Some(3))).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Pushed { current: CommandType::of::<ScreenCommand>() })
    );
    assert_eq!(outcome.effects()[0].text(), Some("screen shown"));
    assert_eq!(
        types_of(&dispatcher, CHAT).await,
        vec![
            CommandType::of::<RootCommand>(),
            CommandType::of::<MenuCommand>(),
            CommandType::of::<ScreenCommand>(),
        ]
    );
}

#[tokio::test]
async fn test_menu_entry_matches_visible_title_in_text() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/menu")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "_REFRESH")).await;

    dispatcher.dispatch(InboundEvent::text(CHAT, "Screen")).await;

    assert_eq!(dispatcher.current_command(chat(CHAT)).await, Some(CommandType::of::<ScreenCommand>()));
}

#[tokio::test]
async fn test_admin_only_menu_entry() {
    let dispatcher = sample_dispatcher();
    for id in [1, 2] {
        dispatcher.dispatch(command(id, "/menu")).await;
        dispatcher.dispatch(InboundEvent::text(id, "_REFRESH")).await;
    }

    let denied = dispatcher.dispatch(InboundEvent::callback(1, "SECRET", None)).await;
    assert_matches!(denied, DispatchOutcome::Denied { command } if command == CommandType::of::<SecretCommand>());
    assert_eq!(types_of(&dispatcher, 1).await.len(), 2);

    let admin = InboundSender {
        user_id: 9,
        username: None,
        is_admin: true,
    };
    let allowed = dispatcher
        .dispatch(InboundEvent::callback(2, "SECRET", None).with_sender(admin))
        .await;
    assert_eq!(allowed.effects()[0].text(), Some("secret shown"));
    assert_eq!(dispatcher.current_command(chat(2)).await, Some(CommandType::of::<SecretCommand>()));

    // Once inside, non-admin events are still denied
    let outcome = dispatcher.dispatch(InboundEvent::text(2, "peek")).await;
    assert_matches!(outcome, DispatchOutcome::Denied { .. });
    let outcome = dispatcher.dispatch(admin_text(2, "peek")).await;
    assert_eq!(outcome.effects()[0].text(), Some("secret"));
}

#[tokio::test]
async fn test_menu_entry_without_factory_is_rejected() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/menu")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "_REFRESH")).await;

    let outcome = dispatcher.dispatch(InboundEvent::callback(CHAT, "OTHER", None)).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Rejected(NavigationError::NoFactory {
            command: CommandType::of::<OtherCommand>()
        }))
    );
    assert_eq!(types_of(&dispatcher, CHAT).await.len(), 2);
}

#[tokio::test]
async fn test_custom_event_kind() {
    #[derive(Debug, Clone, Default)]
    struct Webhook {
        received: Vec<serde_json::Value>,
    }
    impl Command for Webhook {}

    let mut registry = HandlerRegistry::new();
    registry
        .register(CommandSpec::<Webhook>::new().on(
            EventKind::Custom("payment".to_string()),
            [Param::Json],
            |hook, args, ctx| {
                hook.received.push(args.json().cloned().unwrap_or_default());
                ctx.send_text("paid");
                Ok(Reply::done())
            },
        ))
        .unwrap();
    let dispatcher = Dispatcher::builder(registry).root(Webhook::default).build().unwrap();

    let outcome = dispatcher
        .dispatch(InboundEvent::custom(CHAT, "payment", serde_json::json!({ "amount": 5 })))
        .await;

    assert_eq!(outcome.effects()[0].text(), Some("paid"));
    let snapshot = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert!(snapshot[0].state.contains("amount"));
}

#[derive(Debug, Clone)]
struct BlockingRoot {
    entered: Arc<Barrier>,
    release: Arc<Barrier>,
}

impl Command for BlockingRoot {}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ending_conversation_discards_in_flight_directive() {
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));

    let mut registry = sample_registry();
    registry
        .register(CommandSpec::<BlockingRoot>::new().on_text(|root, _, ctx| {
            root.entered.wait();
            root.release.wait();
            ctx.send_text("finished");
            Ok(Reply::push(ScreenCommand::default()))
        }))
        .unwrap();

    let root = BlockingRoot {
        entered: entered.clone(),
        release: release.clone(),
    };
    let dispatcher = Arc::new(
        Dispatcher::builder(registry)
            .root(move || root.clone())
            .build()
            .unwrap(),
    );

    let task = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.dispatch(InboundEvent::text(7, "go")).await }
    });

    entered.wait();
    assert!(dispatcher.end_conversation(chat(7)));
    release.wait();

    let outcome = task.await.unwrap();
    assert_eq!(outcome.navigation(), Some(&NavigationResult::Discarded));
    assert_eq!(outcome.effects()[0].text(), Some("finished"));
    assert!(!dispatcher.has_conversation(chat(7)));
}

#[tokio::test]
async fn test_observer_sees_every_outcome() {
    let observer = Arc::new(CountingObserver::default());
    let dispatcher = Dispatcher::builder(sample_registry())
        .root(RootCommand::default)
        .observer(observer.clone())
        .build()
        .unwrap();

    dispatcher.dispatch(command(CHAT, "/hello")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "nobody listens")).await;
    dispatcher.dispatch(command(CHAT, "/panic")).await;

    assert_eq!(observer.executed(), 1);
    assert_eq!(observer.unhandled(), 1);
    assert_eq!(observer.failures(), 1);
}

#[tokio::test]
async fn test_declined_event_is_not_reported_as_executed() {
    let observer = Arc::new(CountingObserver::default());
    let dispatcher = Dispatcher::builder(sample_registry())
        .root(RootCommand::default)
        .observer(observer.clone())
        .build()
        .unwrap();

    dispatcher.dispatch(command(CHAT, "/open")).await;
    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "decline")).await;

    assert_matches!(outcome, DispatchOutcome::Unhandled(UnhandledReason::Declined { .. }));
    assert_eq!(observer.executed(), 1);
    assert_eq!(observer.unhandled(), 1);
}

#[tokio::test]
async fn test_panicking_leave_hook_rolls_back_navigation() {
    let observer = Arc::new(CountingObserver::default());
    let dispatcher = Dispatcher::builder(sample_registry())
        .root(RootCommand::default)
        .observer(observer.clone())
        .build()
        .unwrap();
    dispatcher.dispatch(command(CHAT, "/leaky")).await;
    let before = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert_eq!(before.len(), 2);

    for text in ["pop", "replace", "reset", "_BACK"] {
        let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, text)).await;

        assert_matches!(
            outcome,
            DispatchOutcome::Failed(InvocationError::LeaveFailed { command, .. })
                if command == CommandType::of::<LeakyCommand>(),
            "{}",
            text
        );
        assert_eq!(dispatcher.snapshot(chat(CHAT)).await.unwrap(), before, "{}", text);
    }

    let data = dispatcher.conversation_data(chat(CHAT)).await.unwrap();
    assert_eq!(data.get_string(DATA_KEY), None);
    assert_eq!(observer.failures(), 4);
    assert_eq!(observer.executed(), 1);
}

#[tokio::test]
async fn test_menu_entry_state_reaches_the_entered_command() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/picker")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "_REFRESH")).await;

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "Colors")).await;
    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Pushed {
            current: CommandType::of::<TaggedCommand>()
        })
    );
    assert_eq!(outcome.effects()[0].text(), Some("tags: red,blue"));
    let snapshot = dispatcher.snapshot(chat(CHAT)).await.unwrap();
    assert!(snapshot[2].state.contains(r#"tags: ["red", "blue"]"#));

    // An entry without state gets the factory's default
    dispatcher.dispatch(InboundEvent::text(CHAT, "_BACK")).await;
    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "Plain")).await;
    assert_eq!(outcome.effects()[0].text(), Some("tags: "));

    dispatcher.dispatch(InboundEvent::text(CHAT, "_BACK")).await;
    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "Broken")).await;
    assert_matches!(
        outcome.navigation(),
        Some(NavigationResult::Rejected(NavigationError::InvalidState { command, .. }))
            if *command == CommandType::of::<TaggedCommand>()
    );
    assert_eq!(
        types_of(&dispatcher, CHAT).await,
        vec![CommandType::of::<RootCommand>(), CommandType::of::<PickerCommand>()]
    );
}

#[tokio::test]
async fn test_back_entry_title_acts_as_back() {
    let dispatcher = sample_dispatcher();
    dispatcher.dispatch(command(CHAT, "/picker")).await;
    dispatcher.dispatch(InboundEvent::text(CHAT, "_REFRESH")).await;

    let outcome = dispatcher.dispatch(InboundEvent::text(CHAT, "Back")).await;

    assert_eq!(
        outcome.navigation(),
        Some(&NavigationResult::Popped {
            removed: CommandType::of::<PickerCommand>(),
            current: CommandType::of::<RootCommand>(),
        })
    );
    assert_eq!(outcome.effects()[0].text(), Some("root refreshed"));
    assert_eq!(types_of(&dispatcher, CHAT).await, vec![CommandType::of::<RootCommand>()]);
}
