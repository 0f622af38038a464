//! Echo screen: repeats every message until /done

use tracing::debug;

use crate::engine::command::Command;
use crate::engine::navigation::Reply;
use crate::engine::registry::CommandSpec;
use crate::engine::system::SubCommand;

#[derive(Debug, Clone, Default)]
pub struct EchoCommand {
    pub history: Vec<String>,
}

impl Command for EchoCommand {
    fn on_leave(&mut self) {
        debug!(messages = self.history.len(), "Leaving echo screen");
    }
}

pub fn spec() -> CommandSpec<EchoCommand> {
    CommandSpec::<EchoCommand>::new()
        .on_refresh(|_, _, ctx| {
            ctx.send_menu(
                "Send me anything, /done to go back",
                vec![vec![SubCommand::back().with_title("Back")]],
            );
            Ok(Reply::done())
        })
        .on_text(|echo, args, ctx| {
            let text = args.text().unwrap_or_default().to_string();
            ctx.send_text(format!("#{}: {}", echo.history.len() + 1, text));
            echo.history.push(text);
            Ok(Reply::done())
        })
        .on_command(|echo, args, ctx| match args.command_name() {
            Some("done") => {
                ctx.send_text(format!("Echoed {} messages", echo.history.len()));
                Ok(Reply::pop())
            }
            _ => Ok(Reply::unhandled()),
        })
        .default_factory()
}
