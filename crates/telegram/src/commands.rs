use std::collections::BTreeMap;

use brewbot_core::CatalogItem;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BotCommand {
    Start,
    Menu,
    Help,
}

/// Parse a leading bot command from message text.
///
/// Accepts the `/command@BotName args` form; unknown commands return `None`
/// and are ignored upstream rather than routed to the sales pipeline.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    let first_token = text.trim().split_whitespace().next()?;
    let command = first_token.strip_prefix('/')?;
    let bare = command.split('@').next().unwrap_or(command);

    match bare.to_ascii_lowercase().as_str() {
        "start" => Some(BotCommand::Start),
        "menu" => Some(BotCommand::Menu),
        "help" => Some(BotCommand::Help),
        _ => None,
    }
}

pub fn is_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

pub fn welcome_message(first_name: Option<&str>) -> String {
    let name = first_name.unwrap_or("Customer");
    format!(
        "Welcome to our Coffee Shop, {name}! ☕\n\n\
         I'm here to help you find coffee drinks, pastries, and everything that goes with them.\n\n\
         Type /menu to see our catalog or just tell me what you're in the mood for."
    )
}

pub fn help_message() -> String {
    "*Available Commands:*\n\
     /start - Welcome message\n\
     /menu - View our catalog\n\
     /help - This help message\n\n\
     *What you can ask for:*\n\
     • Coffee drinks: \"I want a latte\", \"strongest coffee\"\n\
     • Pastries: \"something sweet\", \"fresh croissant\"\n\
     • Combinations: \"breakfast combo\", \"coffee and a snack\"\n\n\
     Just tell me what you're looking for and I'll help you find it."
        .to_owned()
}

/// Render the catalog grouped by category, unavailable items flagged as
/// special order. Input order is preserved inside each category group.
pub fn render_menu(items: &[CatalogItem]) -> String {
    if items.is_empty() {
        return "We have coffee drinks and fresh pastries available. \
                What are you looking for today? ☕"
            .to_owned();
    }

    let mut categories: BTreeMap<&str, Vec<&CatalogItem>> = BTreeMap::new();
    for item in items {
        categories.entry(item.category.as_str()).or_default().push(item);
    }

    let mut menu = String::from("📋 *OUR MENU* 📋\n\n");
    for (category, entries) in categories {
        menu.push_str(&format!("🌟 *{}* 🌟\n", category.to_uppercase()));
        for item in entries {
            let marker = if item.available { "✅" } else { "⚠️ (Special Order)" };
            menu.push_str(&format!("{marker} {} - ${}\n", item.name, item.price));
            if !item.description.is_empty() {
                menu.push_str(&format!("   _{}_\n", item.description));
            }
        }
        menu.push('\n');
    }

    menu.push_str("What would you like to order?");
    menu
}
