use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use brewbot_core::catalog::CatalogItem;
use brewbot_core::config::PromptConfig;

/// Grounding text used when retrieval produced nothing at all.
pub const EMPTY_CATALOG_GROUNDING: &str =
    "We have an amazing selection of premium coffee and pastries!";

const GROUNDING_SLOT: &str = "{{grounding}}";

const SALES_V1_INSTRUCTIONS: &str = "You are a Coffee Shop sales agent. Your goal is to SELL while ensuring an honest and sustainable sales approach that prioritizes customer satisfaction.

IMPORTANT SALES RULES:
1. Always try to upsell and cross-sell multiple items while recognizing and addressing genuine customer needs and preferences.
2. Start with the most expensive options but maintain enthusiasm about product features in a truthful manner to build credibility.
3. Never say no to a customer - always find realistic alternatives to sell, even if the requested item is unavailable.
4. Ensure that all suggested items are plausible and align with the actual offerings to avoid customer disappointment.
5. Balance enthusiasm with honesty; all claims must be truthful and reflect actual inventory status.
6. Acknowledge stock limitations while promoting available items, and creatively manage inquiries about out-of-stock products.
7. Suggest similar alternatives when a requested item is not in stock to enhance customer satisfaction and provide relevant options.
8. Empathize with customers to create a personalized experience while maintaining a sales focus.
9. Prohibit exaggerated claims about products and emphasize honesty about their features to foster trust and credibility.

CURRENT INVENTORY:
{{grounding}}

Only recommend items from the current inventory above. Items tagged SPECIAL ORDER are not immediately available; offer an in-stock alternative first.";

/// Render one grounding line per retrieved item, preserving retrieval order.
///
/// Format: `- {name}: ${price} ({category}) - {description} [{IN STOCK|SPECIAL ORDER}]`.
pub fn grounding_text(items: &[CatalogItem]) -> String {
    if items.is_empty() {
        return EMPTY_CATALOG_GROUNDING.to_owned();
    }

    items
        .iter()
        .map(|item| {
            let status = if item.available { "IN STOCK" } else { "SPECIAL ORDER" };
            format!(
                "- {}: ${} ({}) - {} [{}]",
                item.name, item.price, item.category, item.description, status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("unknown prompt template version `{0}`")]
    UnknownVersion(String),
    #[error("could not read prompt instructions from `{path}`: {source}")]
    ReadInstructions { path: PathBuf, source: std::io::Error },
    #[error("prompt instructions are missing the `{{{{grounding}}}}` slot")]
    MissingGroundingSlot,
}

/// Versioned instruction template with a single grounding slot.
///
/// Policy text is configuration, not logic: built-in versions live here, and
/// operators can point `prompt.instructions_path` at their own file as long
/// as it keeps the slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    version: String,
    instructions: String,
}

impl PromptTemplate {
    pub fn builtin(version: &str) -> Result<Self, PromptError> {
        match version {
            "sales-v1" => Ok(Self {
                version: version.to_owned(),
                instructions: SALES_V1_INSTRUCTIONS.to_owned(),
            }),
            other => Err(PromptError::UnknownVersion(other.to_owned())),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Result<Self, PromptError> {
        let Some(path) = &config.instructions_path else {
            return Self::builtin(&config.version);
        };

        let instructions = fs::read_to_string(path)
            .map_err(|source| PromptError::ReadInstructions { path: path.clone(), source })?;
        if !instructions.contains(GROUNDING_SLOT) {
            return Err(PromptError::MissingGroundingSlot);
        }

        Ok(Self { version: config.version.clone(), instructions })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Substitute the grounding block verbatim into the instructions.
    pub fn render(&self, grounding: &str) -> String {
        self.instructions.replace(GROUNDING_SLOT, grounding)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use brewbot_core::catalog::{demo_catalog, CatalogItem};
    use brewbot_core::config::PromptConfig;

    use super::{grounding_text, PromptError, PromptTemplate, EMPTY_CATALOG_GROUNDING};

    fn item(name: &str, price: Decimal, category: &str, available: bool) -> CatalogItem {
        CatalogItem {
            id: format!("{}-001", name.to_lowercase().replace(' ', "-")),
            name: name.to_owned(),
            price,
            category: category.to_owned(),
            description: "test item".to_owned(),
            available,
            stock: if available { 10 } else { 0 },
            relevance: Some(0.9),
        }
    }

    #[test]
    fn empty_retrieval_still_produces_non_empty_grounding() {
        assert_eq!(grounding_text(&[]), EMPTY_CATALOG_GROUNDING);
        assert!(!grounding_text(&[]).is_empty());
    }

    #[test]
    fn grounding_lines_follow_the_documented_format() {
        let items =
            vec![item("Creamy Latte", Decimal::new(425, 2), "Coffee", true)];

        assert_eq!(
            grounding_text(&items),
            "- Creamy Latte: $4.25 (Coffee) - test item [IN STOCK]"
        );
    }

    #[test]
    fn unavailable_items_always_render_special_order() {
        let items = vec![
            item("Creamy Latte", Decimal::new(425, 2), "Coffee", true),
            item("Blueberry Muffin", Decimal::new(275, 2), "Pastries", false),
        ];

        let grounding = grounding_text(&items);
        let lines: Vec<_> = grounding.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[IN STOCK]"));
        assert!(lines[1].ends_with("[SPECIAL ORDER]"));
        assert!(!lines[1].contains("IN STOCK"));
    }

    #[test]
    fn grounding_preserves_retrieval_order() {
        let items = demo_catalog();
        let grounding = grounding_text(&items);
        let first = grounding.lines().next().expect("line");
        assert!(first.contains("Classic Espresso"));
    }

    #[test]
    fn sales_v1_template_embeds_the_grounding_verbatim() {
        let template = PromptTemplate::builtin("sales-v1").expect("builtin");
        let rendered = template.render("- Creamy Latte: $4.25 (Coffee) - x [IN STOCK]");

        assert!(rendered.contains("- Creamy Latte: $4.25 (Coffee) - x [IN STOCK]"));
        assert!(!rendered.contains("{{grounding}}"));
        assert!(rendered.contains("Coffee Shop sales agent"));
    }

    #[test]
    fn unknown_template_version_is_rejected() {
        let config =
            PromptConfig { version: "sales-v9".to_owned(), instructions_path: None };
        assert!(matches!(
            PromptTemplate::from_config(&config),
            Err(PromptError::UnknownVersion(version)) if version == "sales-v9"
        ));
    }

    #[test]
    fn override_file_must_keep_the_grounding_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Sell coffee.").expect("write");

        let config =
            PromptConfig { version: "custom".to_owned(), instructions_path: Some(path.clone()) };
        assert!(matches!(
            PromptTemplate::from_config(&config),
            Err(PromptError::MissingGroundingSlot)
        ));

        std::fs::write(&path, "Sell coffee.\n{{grounding}}").expect("write");
        let template = PromptTemplate::from_config(&config).expect("template");
        assert_eq!(template.version(), "custom");
        assert!(template.render("LINE").contains("LINE"));
    }
}
