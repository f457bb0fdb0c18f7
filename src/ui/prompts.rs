use super::{ModalAction, ModalId};
use anyhow::Result;
use dialoguer::Select;

/// Arrow-key selection over the actions a finished modal offers
pub fn prompt_modal_action(id: ModalId, actions: &[ModalAction]) -> Result<ModalAction> {
    let items: Vec<&str> = actions.iter().map(|action| action.label()).collect();

    let selection = Select::new()
        .with_prompt(format!("{} {}: what next?", id.category, id.subject))
        .items(&items)
        .default(0)
        .interact()?;

    Ok(actions[selection])
}

/// Interactive yes/no selection
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_restart_banner() -> Result<bool> {
    prompt_confirmation("Restart Steam now?", false)
}
