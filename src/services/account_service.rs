use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::{Account, Ledger};

use super::{refresh_net_worth, ServiceResult};

pub struct AccountService;

impl AccountService {
    pub fn add(ledger: &mut Ledger, account: Account) -> ServiceResult<Uuid> {
        Self::validate(ledger, None, &account)?;
        let id = ledger.add_account(account);
        refresh_net_worth(ledger);
        Ok(id)
    }

    pub fn edit(ledger: &mut Ledger, id: Uuid, changes: Account) -> ServiceResult<()> {
        Self::validate(ledger, Some(id), &changes)?;
        let account = ledger
            .account_mut(id)
            .ok_or_else(|| LedgerError::NotFound("Account".into()))?;
        account.name = changes.name;
        account.kind = changes.kind;
        account.initial_balance = changes.initial_balance;
        account.credit_limit = changes.credit_limit;
        account.cut_off_day = changes.cut_off_day;
        account.payment_day = changes.payment_day;
        account.color = changes.color;
        ledger.touch();
        refresh_net_worth(ledger);
        Ok(())
    }

    /// Deleting is blocked while any transaction still references the
    /// account, either as its source or as a transfer target.
    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<()> {
        if ledger
            .transactions
            .iter()
            .any(|txn| txn.account_id == id || txn.target_account_id == Some(id))
        {
            return Err(LedgerError::StillReferenced("Account".into()));
        }
        ledger
            .remove_account(id)
            .ok_or_else(|| LedgerError::NotFound("Account".into()))?;
        refresh_net_worth(ledger);
        Ok(())
    }

    pub fn list(ledger: &Ledger) -> Vec<&Account> {
        ledger.accounts.iter().collect()
    }

    fn validate(ledger: &Ledger, exclude: Option<Uuid>, account: &Account) -> ServiceResult<()> {
        if account.name.trim().is_empty() {
            return Err(LedgerError::Validation("Account name is required".into()));
        }
        let normalized = account.name.trim().to_ascii_lowercase();
        let duplicate = ledger.accounts.iter().any(|existing| {
            let name = existing.name.trim().to_ascii_lowercase();
            name == normalized && exclude.map_or(true, |id| existing.id != id)
        });
        if duplicate {
            return Err(LedgerError::Validation(format!(
                "Account `{}` already exists",
                account.name
            )));
        }
        if !account.initial_balance.is_finite() {
            return Err(LedgerError::Validation(
                "Account initial balance must be a number".into(),
            ));
        }

        let has_credit_terms = account.credit_limit.is_some()
            || account.cut_off_day.is_some()
            || account.payment_day.is_some();
        if has_credit_terms && !account.is_credit() {
            return Err(LedgerError::Validation(
                "Credit terms are only valid on credit accounts".into(),
            ));
        }
        if let Some(limit) = account.credit_limit {
            if !limit.is_finite() || limit < 0.0 {
                return Err(LedgerError::Validation(
                    "Credit limit must be zero or positive".into(),
                ));
            }
        }
        for (label, day) in [
            ("cut-off day", account.cut_off_day),
            ("payment day", account.payment_day),
        ] {
            if let Some(day) = day {
                if !(1..=31).contains(&day) {
                    return Err(LedgerError::Validation(format!(
                        "Account {} must be between 1 and 31",
                        label
                    )));
                }
            }
        }
        Ok(())
    }
}
