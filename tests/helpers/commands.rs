//! Sample commands
//!
//! `RootCommand` has no text handler on purpose; `/open` pushes a
//! `ScreenCommand`, whose text handler drives the remaining navigation.

use StackBot::engine::{
    Command, CommandSpec, Dispatcher, EventKind, FallbackPolicy, HandlerRegistry, Param, Reply,
    SubCommand,
};
use StackBot::utils::errors::HandlerError;

#[derive(Debug, Clone, Default)]
pub struct RootCommand {
    pub refreshes: u32,
    pub commands: Vec<String>,
}

impl Command for RootCommand {}

#[derive(Debug, Clone, Default)]
pub struct ScreenCommand {
    pub visits: u32,
}

impl Command for ScreenCommand {}

#[derive(Debug, Clone, Default)]
pub struct OtherCommand;

impl Command for OtherCommand {}

/// Shows a menu whose entries push other commands
#[derive(Debug, Clone, Default)]
pub struct MenuCommand;

impl Command for MenuCommand {}

/// Only admins may enter
#[derive(Debug, Clone, Default)]
pub struct SecretCommand;

impl Command for SecretCommand {}

/// Never registered
#[derive(Debug, Clone, Default)]
pub struct OrphanCommand;

impl Command for OrphanCommand {}

/// Its leave hook always panics, so it can never be removed
#[derive(Debug, Clone, Default)]
pub struct LeakyCommand {
    pub notes: u32,
}

impl Command for LeakyCommand {
    fn on_leave(&mut self) {
        panic!("leaky leave hook");
    }
}

/// Built from the state carried by the menu entry that opened it
#[derive(Debug, Clone, Default)]
pub struct TaggedCommand {
    pub tags: Vec<String>,
}

impl Command for TaggedCommand {}

/// Menu with stateful entries and a titled back button
#[derive(Debug, Clone, Default)]
pub struct PickerCommand;

impl Command for PickerCommand {}

pub const DATA_KEY: &str = "touched";

pub fn root_spec() -> CommandSpec<RootCommand> {
    CommandSpec::<RootCommand>::new()
        .on_command(|root, args, ctx| {
            let name = args.command_name().unwrap_or_default().to_string();
            root.commands.push(name.clone());
            match name.as_str() {
                "open" => Ok(Reply::push(ScreenCommand::default())),
                "menu" => Ok(Reply::push(MenuCommand)),
                "orphan" => Ok(Reply::push(OrphanCommand)),
                "leaky" => Ok(Reply::push(LeakyCommand::default())),
                "picker" => Ok(Reply::push(PickerCommand)),
                "pop" => Ok(Reply::pop()),
                "fail" => {
                    ctx.data_mut().set(DATA_KEY, true)?;
                    ctx.send_text("about to fail");
                    Err(HandlerError::msg("root failed"))
                }
                "panic" => panic!("root panicked"),
                "hello" => {
                    ctx.send_text("hello from root");
                    Ok(Reply::done())
                }
                _ => Ok(Reply::unhandled()),
            }
        })
        .on_refresh(|root, _, ctx| {
            root.refreshes += 1;
            ctx.send_text("root refreshed");
            Ok(Reply::done())
        })
        .default_factory()
}

pub fn screen_spec() -> CommandSpec<ScreenCommand> {
    CommandSpec::<ScreenCommand>::new()
        .on_text(|screen, args, ctx| {
            screen.visits += 1;
            match args.text().unwrap_or_default() {
                "back" => Ok(Reply::pop()),
                "replace" => Ok(Reply::replace(OtherCommand)),
                "deeper" => Ok(Reply::push(ScreenCommand::default())),
                "reset" => Ok(Reply::reset()),
                "decline" => {
                    ctx.data_mut().set(DATA_KEY, "declined")?;
                    Ok(Reply::unhandled())
                }
                "fail" => {
                    ctx.data_mut().set(DATA_KEY, "failed")?;
                    Err(HandlerError::msg("screen failed"))
                }
                "panic" => panic!("screen panicked"),
                other => {
                    ctx.send_text(format!("screen got {}", other));
                    Ok(Reply::done())
                }
            }
        })
        .on_refresh(|_, _, ctx| {
            ctx.send_text("screen shown");
            Ok(Reply::done())
        })
        .default_factory()
}

pub fn menu_spec() -> CommandSpec<MenuCommand> {
    CommandSpec::<MenuCommand>::new()
        .on_refresh(|_, _, ctx| {
            ctx.send_menu(
                "menu",
                vec![
                    vec![SubCommand::of::<ScreenCommand>().with_title("Screen")],
                    vec![SubCommand::of::<SecretCommand>(), SubCommand::of::<OtherCommand>()],
                    vec![SubCommand::action("PING"), SubCommand::back()],
                ],
            );
            Ok(Reply::done())
        })
        .on(EventKind::Callback, [Param::CallbackData, Param::MessageId], |_, args, ctx| {
            let data = args.callback_data().unwrap_or_default().to_string();
            let message_id = args.message_id().unwrap_or_default();
            ctx.edit_text(message_id, format!("pressed {}", data));
            Ok(Reply::done())
        })
}

pub fn secret_spec() -> CommandSpec<SecretCommand> {
    CommandSpec::<SecretCommand>::new()
        .on_text(|_, _, ctx| {
            ctx.send_text("secret");
            Ok(Reply::done())
        })
        .on_refresh(|_, _, ctx| {
            ctx.send_text("secret shown");
            Ok(Reply::done())
        })
        .admin_only()
        .default_factory()
}

pub fn other_spec() -> CommandSpec<OtherCommand> {
    CommandSpec::<OtherCommand>::new().on_text(|_, _, ctx| {
        ctx.send_text("other");
        Ok(Reply::done())
    })
}

pub fn leaky_spec() -> CommandSpec<LeakyCommand> {
    CommandSpec::<LeakyCommand>::new()
        .on_text(|leaky, args, ctx| {
            leaky.notes += 1;
            ctx.data_mut().set(DATA_KEY, "leaving")?;
            match args.text().unwrap_or_default() {
                "replace" => Ok(Reply::replace(OtherCommand)),
                "reset" => Ok(Reply::reset()),
                _ => Ok(Reply::pop()),
            }
        })
        .default_factory()
}

pub fn tagged_spec() -> CommandSpec<TaggedCommand> {
    CommandSpec::<TaggedCommand>::new()
        .on_refresh(|tagged, _, ctx| {
            ctx.send_text(format!("tags: {}", tagged.tags.join(",")));
            Ok(Reply::done())
        })
        .state_factory(|tags: Option<Vec<String>>| TaggedCommand {
            tags: tags.unwrap_or_default(),
        })
}

pub fn picker_spec() -> CommandSpec<PickerCommand> {
    CommandSpec::<PickerCommand>::new()
        .on_refresh(|_, _, ctx| {
            ctx.send_menu(
                "pick one",
                vec![
                    vec![
                        SubCommand::of::<TaggedCommand>()
                            .with_title("Colors")
                            .with_state(serde_json::json!(["red", "blue"])),
                        SubCommand::of::<TaggedCommand>().with_title("Plain"),
                        SubCommand::of::<TaggedCommand>()
                            .with_title("Broken")
                            .with_state(serde_json::json!(42)),
                    ],
                    vec![SubCommand::back().with_title("Back")],
                ],
            );
            Ok(Reply::done())
        })
        .default_factory()
}

/// Registry with every sample command except `OrphanCommand`
pub fn sample_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(root_spec()).expect("root registers");
    registry.register(screen_spec()).expect("screen registers");
    registry.register(menu_spec()).expect("menu registers");
    registry.register(secret_spec()).expect("secret registers");
    registry.register(other_spec()).expect("other registers");
    registry.register(leaky_spec()).expect("leaky registers");
    registry.register(tagged_spec()).expect("tagged registers");
    registry.register(picker_spec()).expect("picker registers");
    registry
}

pub fn sample_dispatcher() -> Dispatcher {
    sample_dispatcher_with(FallbackPolicy::Ignore)
}

pub fn sample_dispatcher_with(fallback: FallbackPolicy) -> Dispatcher {
    Dispatcher::builder(sample_registry())
        .root(RootCommand::default)
        .fallback(fallback)
        .build()
        .expect("sample dispatcher builds")
}
