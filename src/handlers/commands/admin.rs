//! Admin-only status screen

use crate::engine::command::Command;
use crate::engine::navigation::Reply;
use crate::engine::registry::CommandSpec;
use crate::engine::system::SubCommand;

#[derive(Debug, Clone, Default)]
pub struct AdminCommand;

impl Command for AdminCommand {}

pub fn spec() -> CommandSpec<AdminCommand> {
    CommandSpec::<AdminCommand>::new()
        .on_refresh(|_, _, ctx| {
            let stack = ctx
                .stack()
                .iter()
                .map(|command| command.name())
                .collect::<Vec<_>>()
                .join(" > ");
            let keys = ctx.data().len();
            ctx.send_menu(
                format!("Admin panel\nStack: {}\nStored values: {}", stack, keys),
                vec![vec![SubCommand::refresh().with_title("Refresh"), SubCommand::back().with_title("Back")]],
            );
            Ok(Reply::done())
        })
        .admin_only()
        .default_factory()
}
