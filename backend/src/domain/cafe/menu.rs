//! Menu items owned by a cafe.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{CafeValidationError, MenuCategory, MenuItemId};

/// Input payload for [`MenuItem::new`].
#[derive(Debug, Clone)]
pub struct MenuItemDraft {
    pub id: MenuItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: MenuCategory,
    pub image: Option<String>,
}

/// One entry on a cafe menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    id: MenuItemId,
    name: String,
    description: Option<String>,
    price: Decimal,
    category: MenuCategory,
    image: Option<String>,
}

impl MenuItem {
    /// Validate and construct a menu item.
    ///
    /// # Errors
    ///
    /// Returns [`CafeValidationError::EmptyMenuItemName`] or
    /// [`CafeValidationError::NegativePrice`].
    pub fn new(draft: MenuItemDraft) -> Result<Self, CafeValidationError> {
        Self::try_from(draft)
    }

    /// Item identifier.
    pub fn id(&self) -> MenuItemId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Optional description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Non-negative price.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Menu section.
    pub fn category(&self) -> MenuCategory {
        self.category
    }

    /// Optional image reference.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }
}

impl TryFrom<MenuItemDraft> for MenuItem {
    type Error = CafeValidationError;

    fn try_from(draft: MenuItemDraft) -> Result<Self, Self::Error> {
        let MenuItemDraft {
            id,
            name,
            description,
            price,
            category,
            image,
        } = draft;
        if name.trim().is_empty() {
            return Err(CafeValidationError::EmptyMenuItemName);
        }
        if price < Decimal::ZERO {
            return Err(CafeValidationError::NegativePrice { price });
        }
        Ok(Self {
            id,
            name,
            description,
            price,
            category,
            image,
        })
    }
}
