use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::{Category, Ledger};

use super::ServiceResult;

pub struct CategoryService;

impl CategoryService {
    pub fn add(ledger: &mut Ledger, category: Category) -> ServiceResult<Uuid> {
        Self::validate_name(ledger, None, &category.name)?;
        Ok(ledger.add_category(category))
    }

    pub fn edit(ledger: &mut Ledger, id: Uuid, changes: Category) -> ServiceResult<()> {
        Self::validate_name(ledger, Some(id), &changes.name)?;
        let category = ledger
            .category_mut(id)
            .ok_or_else(|| LedgerError::NotFound("Category".into()))?;
        category.name = changes.name;
        category.kind = changes.kind;
        category.color = changes.color;
        category.icon = changes.icon;
        ledger.touch();
        Ok(())
    }

    /// Deleting is blocked while any transaction still uses the category.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<()> {
        if ledger.transactions.iter().any(|txn| txn.category_id == id) {
            return Err(LedgerError::StillReferenced("Category".into()));
        }
        ledger
            .remove_category(id)
            .ok_or_else(|| LedgerError::NotFound("Category".into()))?;
        Ok(())
    }

    pub fn list(ledger: &Ledger) -> Vec<&Category> {
        ledger.categories.iter().collect()
    }

    fn validate_name(ledger: &Ledger, exclude: Option<Uuid>, candidate: &str) -> ServiceResult<()> {
        if candidate.trim().is_empty() {
            return Err(LedgerError::Validation("Category name is required".into()));
        }
        let normalized = candidate.trim().to_ascii_lowercase();
        let duplicate = ledger.categories.iter().any(|category| {
            let name = category.name.trim().to_ascii_lowercase();
            name == normalized && exclude.map_or(true, |id| category.id != id)
        });
        if duplicate {
            return Err(LedgerError::Validation(format!(
                "Category `{}` already exists",
                candidate
            )));
        }
        Ok(())
    }
}
