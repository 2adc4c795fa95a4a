use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(context: &Context) -> Result<CommandResult, CliError> {
    let days = context.store.list_days()?;
    let lines = if days.is_empty() {
        vec![String::from("No days recorded.")]
    } else {
        days.iter().map(ToString::to_string).collect()
    };
    CommandResult::new(&days, lines)
}
