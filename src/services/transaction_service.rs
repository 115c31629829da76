//! Validated CRUD for transactions, plus the installment-purchase flow that
//! splits one price tag into a schedule of future payments.

use chrono::Utc;
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::ledger::{
    Frequency, InstallmentPlan, Ledger, MonthKey, ScheduledPayment, Transaction, TransactionDraft,
    TransactionKind,
};
use crate::utils::round2;

use super::{ensure_amount, refresh_net_worth, ServiceResult};

/// How an installment purchase is split: how many payments, how far apart.
#[derive(Debug, Clone, Copy)]
pub struct InstallmentTerms {
    pub count: u32,
    pub frequency: Frequency,
}

/// Ids created by [`TransactionService::post_installment_purchase`].
#[derive(Debug, Clone, Copy)]
pub struct InstallmentPurchase {
    pub transaction_id: Uuid,
    pub schedule_id: Uuid,
}

pub struct TransactionService;

impl TransactionService {
    pub fn add(ledger: &mut Ledger, draft: TransactionDraft) -> ServiceResult<Uuid> {
        Self::validate(ledger, &draft)?;
        let id = ledger.add_transaction(Transaction::from_draft(draft, Utc::now()));
        refresh_net_worth(ledger);
        Ok(id)
    }

    /// Rewrites the caller-editable fields of an existing transaction.
    /// Bookkeeping fields (creation time, scheduling provenance, the
    /// installment-total marker) are preserved.
    pub fn edit(ledger: &mut Ledger, id: Uuid, changes: TransactionDraft) -> ServiceResult<()> {
        Self::validate(ledger, &changes)?;
        let txn = ledger
            .transaction_mut(id)
            .ok_or_else(|| LedgerError::NotFound("Transaction".into()))?;
        txn.amount = changes.amount;
        txn.kind = changes.kind;
        txn.category_id = changes.category_id;
        txn.account_id = changes.account_id;
        txn.target_account_id = changes.target_account_id;
        txn.date = changes.date;
        txn.note = changes.note;
        ledger.touch();
        refresh_net_worth(ledger);
        Ok(())
    }

    pub fn remove(ledger: &mut Ledger, id: Uuid) -> ServiceResult<Transaction> {
        let removed = ledger
            .remove_transaction(id)
            .ok_or_else(|| LedgerError::NotFound("Transaction".into()))?;
        refresh_net_worth(ledger);
        Ok(removed)
    }

    pub fn list(ledger: &Ledger) -> Vec<&Transaction> {
        ledger.transactions.iter().collect()
    }

    /// Posts an installment purchase: one informational transaction carrying
    /// the full price (excluded from balance math) and one installment-master
    /// schedule whose occurrences carry `round(total/count, 2)` each. The
    /// actual cash flow happens occurrence by occurrence as they are paid.
    pub fn post_installment_purchase(
        ledger: &mut Ledger,
        draft: TransactionDraft,
        terms: InstallmentTerms,
    ) -> ServiceResult<InstallmentPurchase> {
        Self::validate(ledger, &draft)?;
        if terms.count < 1 {
            return Err(LedgerError::Validation(
                "Installment count must be at least 1".into(),
            ));
        }
        if terms.frequency == Frequency::OneTime {
            return Err(LedgerError::Validation(
                "Installment frequency must repeat".into(),
            ));
        }
        if draft.kind == TransactionKind::Transfer {
            return Err(LedgerError::Validation(
                "Installment purchases must be income or expense".into(),
            ));
        }

        let per_amount = round2(draft.amount / terms.count as f64);
        let name = draft
            .note
            .clone()
            .or_else(|| {
                ledger
                    .category(draft.category_id)
                    .map(|category| category.name.clone())
            })
            .unwrap_or_else(|| "Installments".into());
        let start_month = MonthKey::from_date(draft.date);
        let plan = InstallmentPlan {
            total: terms.count,
            start_date: draft.date,
        };
        let master = ScheduledPayment::new(
            name,
            per_amount,
            draft.kind,
            draft.category_id,
            draft.account_id,
            terms.frequency,
            start_month,
        )
        .with_installments(plan);

        let mut total = Transaction::from_draft(draft, Utc::now());
        total.is_installment_total = true;
        let transaction_id = ledger.add_transaction(total);
        let schedule_id = ledger.add_scheduled_payment(master);
        refresh_net_worth(ledger);

        Ok(InstallmentPurchase {
            transaction_id,
            schedule_id,
        })
    }

    fn validate(ledger: &Ledger, draft: &TransactionDraft) -> ServiceResult<()> {
        ensure_amount(draft.amount, "Transaction")?;
        if ledger.category(draft.category_id).is_none() {
            return Err(LedgerError::NotFound("Category".into()));
        }
        if ledger.account(draft.account_id).is_none() {
            return Err(LedgerError::NotFound("Account".into()));
        }
        match draft.kind {
            TransactionKind::Transfer => {
                let target = draft.target_account_id.ok_or_else(|| {
                    LedgerError::Validation("Transfers need a target account".into())
                })?;
                if target == draft.account_id {
                    return Err(LedgerError::Validation(
                        "Transfers need two distinct accounts".into(),
                    ));
                }
                if ledger.account(target).is_none() {
                    return Err(LedgerError::NotFound("Target account".into()));
                }
            }
            _ => {
                if draft.target_account_id.is_some() {
                    return Err(LedgerError::Validation(
                        "Only transfers take a target account".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::engine::balance_of;
    use crate::ledger::{Account, AccountKind, Category, CategoryKind};

    fn fixture() -> (Ledger, Uuid, Uuid) {
        let mut ledger = Ledger::new("Test");
        let account = ledger.add_account(Account::new("Checking", AccountKind::Debit, 1000.0));
        let category = ledger.add_category(Category::new("Shopping", CategoryKind::Expense));
        (ledger, account, category)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_rejects_non_positive_amounts() {
        let (mut ledger, account, category) = fixture();
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let draft = TransactionDraft::new(
                bad,
                TransactionKind::Expense,
                category,
                account,
                date(2025, 4, 1),
            );
            let err = TransactionService::add(&mut ledger, draft).unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
        assert_eq!(ledger.transaction_count(), 0);
    }

    #[test]
    fn transfers_require_a_distinct_existing_target() {
        let (mut ledger, account, category) = fixture();

        let missing_target =
            TransactionDraft::new(10.0, TransactionKind::Transfer, category, account, date(2025, 4, 1));
        assert!(matches!(
            TransactionService::add(&mut ledger, missing_target),
            Err(LedgerError::Validation(_))
        ));

        let self_target =
            TransactionDraft::new(10.0, TransactionKind::Transfer, category, account, date(2025, 4, 1))
                .transfer_to(account);
        assert!(matches!(
            TransactionService::add(&mut ledger, self_target),
            Err(LedgerError::Validation(_))
        ));

        let ghost_target =
            TransactionDraft::new(10.0, TransactionKind::Transfer, category, account, date(2025, 4, 1))
                .transfer_to(Uuid::new_v4());
        assert!(matches!(
            TransactionService::add(&mut ledger, ghost_target),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn edit_preserves_bookkeeping_fields() {
        let (mut ledger, account, category) = fixture();
        let draft = TransactionDraft::new(
            20.0,
            TransactionKind::Expense,
            category,
            account,
            date(2025, 4, 1),
        );
        let id = TransactionService::add(&mut ledger, draft).unwrap();
        let created_at = ledger.transaction(id).unwrap().created_at;

        let changes = TransactionDraft::new(
            25.0,
            TransactionKind::Expense,
            category,
            account,
            date(2025, 4, 2),
        )
        .with_note("groceries");
        TransactionService::edit(&mut ledger, id, changes).unwrap();

        let txn = ledger.transaction(id).unwrap();
        assert_eq!(txn.amount, 25.0);
        assert_eq!(txn.note.as_deref(), Some("groceries"));
        assert_eq!(txn.created_at, created_at);
        assert!(!txn.is_scheduled);
    }

    #[test]
    fn installment_purchase_posts_marker_and_master() {
        let (mut ledger, account, category) = fixture();
        let draft = TransactionDraft::new(
            300.0,
            TransactionKind::Expense,
            category,
            account,
            date(2025, 1, 15),
        )
        .with_note("Laptop");

        let posted = TransactionService::post_installment_purchase(
            &mut ledger,
            draft,
            InstallmentTerms {
                count: 3,
                frequency: Frequency::Monthly,
            },
        )
        .unwrap();

        // The lump sum never moves money.
        assert_eq!(balance_of(&ledger, account), Some(1000.0));

        let total = ledger.transaction(posted.transaction_id).unwrap();
        assert!(total.is_installment_total);
        assert_eq!(total.amount, 300.0);

        let master = ledger.scheduled_payment(posted.schedule_id).unwrap();
        assert!(master.is_installment_master());
        assert_eq!(master.name, "Laptop");
        assert_eq!(master.amount, 100.0);
        assert_eq!(master.installments.unwrap().total, 3);
        assert_eq!(master.start_month, MonthKey::new(2025, 1).unwrap());
    }

    #[test]
    fn installment_purchase_rounds_split_to_cents() {
        let (mut ledger, account, category) = fixture();
        let draft = TransactionDraft::new(
            100.0,
            TransactionKind::Expense,
            category,
            account,
            date(2025, 1, 15),
        );
        let posted = TransactionService::post_installment_purchase(
            &mut ledger,
            draft,
            InstallmentTerms {
                count: 3,
                frequency: Frequency::Monthly,
            },
        )
        .unwrap();
        let master = ledger.scheduled_payment(posted.schedule_id).unwrap();
        assert_eq!(master.amount, 33.33);
    }

    #[test]
    fn installment_purchase_rejects_one_time_frequency() {
        let (mut ledger, account, category) = fixture();
        let draft = TransactionDraft::new(
            90.0,
            TransactionKind::Expense,
            category,
            account,
            date(2025, 1, 15),
        );
        let err = TransactionService::post_installment_purchase(
            &mut ledger,
            draft,
            InstallmentTerms {
                count: 3,
                frequency: Frequency::OneTime,
            },
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(ledger.transaction_count(), 0);
        assert!(ledger.scheduled_payments.is_empty());
    }
}
