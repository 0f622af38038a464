//! Counter screen
//!
//! Keeps a per-instance count and a conversation-wide total in the data bag.

use crate::engine::command::Command;
use crate::engine::context::CommandContext;
use crate::engine::navigation::Reply;
use crate::engine::registry::CommandSpec;
use crate::engine::system::SubCommand;
use crate::utils::errors::HandlerResult;

/// Data bag key of the conversation-wide total
pub const TOTAL_KEY: &str = "counter.total";

const INCREMENT: &str = "INCREMENT";
const RESET: &str = "RESET";

#[derive(Debug, Clone, Default)]
pub struct CounterCommand {
    pub count: i64,
}

impl Command for CounterCommand {}

impl CounterCommand {
    fn show(&self, ctx: &mut CommandContext) {
        let total = ctx.data().get_i64(TOTAL_KEY).unwrap_or(0);
        ctx.send_menu(
            format!("Count: {}\nTotal in this chat: {}", self.count, total),
            vec![
                vec![
                    SubCommand::action(INCREMENT).with_title("+1"),
                    SubCommand::action(RESET).with_title("Reset"),
                ],
                vec![SubCommand::back().with_title("Back")],
            ],
        );
    }

    fn add(&mut self, ctx: &mut CommandContext, amount: i64) -> HandlerResult<()> {
        self.count += amount;
        let total = ctx.data().get_i64(TOTAL_KEY).unwrap_or(0) + amount;
        ctx.data_mut().set(TOTAL_KEY, total)
    }
}

pub fn spec() -> CommandSpec<CounterCommand> {
    CommandSpec::<CounterCommand>::new()
        .on_refresh(|counter, _, ctx| {
            counter.show(ctx);
            Ok(Reply::done())
        })
        .on_callback(|counter, args, ctx| {
            match args.callback_data() {
                Some(INCREMENT) => counter.add(ctx, 1)?,
                Some(RESET) => counter.count = 0,
                _ => return Ok(Reply::unhandled()),
            }
            ctx.answer_callback(None);
            counter.show(ctx);
            Ok(Reply::done())
        })
        .on_text(|counter, args, ctx| {
            let text = args.text().unwrap_or_default().trim();
            match text.parse::<i64>() {
                Ok(amount) => {
                    counter.add(ctx, amount)?;
                    counter.show(ctx);
                }
                Err(_) => ctx.send_text("Send a number to add it, or press +1"),
            }
            Ok(Reply::done())
        })
        .default_factory()
}
