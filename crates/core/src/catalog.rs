use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One sellable entity, fully populated.
///
/// Past the retriever boundary no field is ever missing: defaults are applied
/// exactly once, in [`ItemMetadata::into_item`]. `relevance` carries the
/// similarity score a retrieval attached and is `None` for records that never
/// went through a query (ingestion-origin data).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub available: bool,
    pub stock: u32,
    pub relevance: Option<f32>,
}

/// Index match metadata as it actually arrives: every field optional.
///
/// The persisted schema is `name, price, category, description, stock,
/// available, searchableText`, but nothing guarantees a given record carries
/// all of them, so this type makes the partiality explicit instead of assuming
/// field presence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searchable_text: Option<String>,
}

impl ItemMetadata {
    /// Normalize partial metadata into a fully populated item.
    ///
    /// Defaults: name "Unknown Item", price 0, category "Beverages",
    /// description empty, available true unless explicitly false, stock 0.
    pub fn into_item(self, id: impl Into<String>, relevance: Option<f32>) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            name: self.name.unwrap_or_else(|| "Unknown Item".to_owned()),
            price: self.price.unwrap_or(Decimal::ZERO),
            category: self.category.unwrap_or_else(|| "Beverages".to_owned()),
            description: self.description.unwrap_or_default(),
            available: self.available.unwrap_or(true),
            stock: self.stock.unwrap_or(0),
            relevance,
        }
    }
}

/// One row of the ingestion CSV, fully typed.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub stock: u32,
    pub available: bool,
}

impl CatalogRecord {
    /// The text that gets embedded for similarity search.
    pub fn searchable_text(&self) -> String {
        format!("{} {} {}", self.name, self.category, self.description).to_lowercase()
    }

    pub fn metadata(&self) -> ItemMetadata {
        ItemMetadata {
            name: Some(self.name.clone()),
            price: Some(self.price),
            category: Some(self.category.clone()),
            description: Some(self.description.clone()),
            available: Some(self.available),
            stock: Some(self.stock),
            searchable_text: Some(self.searchable_text()),
        }
    }
}

/// Static demo catalog used whenever live retrieval is unavailable.
pub fn demo_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem {
            id: "espresso-001".to_owned(),
            name: "Classic Espresso".to_owned(),
            price: Decimal::new(250, 2),
            category: "Coffee".to_owned(),
            description: "Rich and bold espresso shot".to_owned(),
            available: true,
            stock: 50,
            relevance: Some(0.95),
        },
        CatalogItem {
            id: "latte-001".to_owned(),
            name: "Creamy Latte".to_owned(),
            price: Decimal::new(425, 2),
            category: "Coffee".to_owned(),
            description: "Smooth espresso with steamed milk".to_owned(),
            available: true,
            stock: 30,
            relevance: Some(0.92),
        },
        CatalogItem {
            id: "cappuccino-001".to_owned(),
            name: "Cappuccino".to_owned(),
            price: Decimal::new(375, 2),
            category: "Coffee".to_owned(),
            description: "Perfect blend of espresso, steamed milk, and foam".to_owned(),
            available: true,
            stock: 25,
            relevance: Some(0.90),
        },
        CatalogItem {
            id: "croissant-001".to_owned(),
            name: "Butter Croissant".to_owned(),
            price: Decimal::new(350, 2),
            category: "Pastries".to_owned(),
            description: "Flaky, buttery croissant".to_owned(),
            available: true,
            stock: 15,
            relevance: Some(0.88),
        },
        CatalogItem {
            id: "muffin-001".to_owned(),
            name: "Blueberry Muffin".to_owned(),
            price: Decimal::new(275, 2),
            category: "Pastries".to_owned(),
            description: "Fresh blueberry muffin".to_owned(),
            available: false,
            stock: 0,
            relevance: Some(0.85),
        },
    ]
}
