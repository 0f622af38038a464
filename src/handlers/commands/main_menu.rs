//! Root command: main menu, /start and /help

use tracing::info;

use crate::engine::command::Command;
use crate::engine::context::CommandContext;
use crate::engine::navigation::Reply;
use crate::engine::registry::CommandSpec;
use crate::engine::system::SubCommand;
use crate::utils::errors::HandlerResult;

use super::{AdminCommand, CounterCommand, EchoCommand};

const HELP_TEXT: &str = "StackBot demo\n\n\
    /start - Show the main menu\n\
    /help - Show this help message\n\n\
    Pick an entry from the menu to open it, press Back to return.";

#[derive(Debug, Clone, Default)]
pub struct MainMenuCommand;

impl Command for MainMenuCommand {}

fn menu(ctx: &CommandContext) -> Vec<Vec<SubCommand>> {
    let mut rows = vec![
        vec![
            SubCommand::of::<CounterCommand>().with_title("Counter"),
            SubCommand::of::<EchoCommand>().with_title("Echo"),
        ],
    ];
    if ctx.is_admin() {
        rows.push(vec![SubCommand::of::<AdminCommand>().with_title("Admin")]);
    }
    rows
}

fn show_menu(ctx: &mut CommandContext, greeting: &str) {
    let rows = menu(ctx);
    ctx.send_menu(greeting, rows);
}

fn handle_command(ctx: &mut CommandContext, name: &str) -> HandlerResult<Reply> {
    match name {
        "start" => {
            info!(user_id = ctx.sender().user_id, "Conversation started");
            show_menu(ctx, "Welcome! Choose what to open:");
            Ok(Reply::reset())
        }
        "help" => {
            ctx.send_text(HELP_TEXT);
            Ok(Reply::done())
        }
        _ => Ok(Reply::unhandled()),
    }
}

pub fn spec() -> CommandSpec<MainMenuCommand> {
    CommandSpec::<MainMenuCommand>::new()
        .on_command(|_, args, ctx| handle_command(ctx, args.command_name().unwrap_or_default()))
        .on_text(|_, _, ctx| {
            show_menu(ctx, "Please use the menu:");
            Ok(Reply::done())
        })
        .on_refresh(|_, _, ctx| {
            show_menu(ctx, "Main menu");
            Ok(Reply::done())
        })
        .default_factory()
}
