use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, TimeZone, Utc};
use tempfile::tempdir;

use vantt_core::engine::{balances, forecast, occurrences_for, score, ResolveAction};
use vantt_core::ledger::{
    Account, AccountKind, Category, CategoryKind, Frequency, Ledger, MonthKey, ScheduledPayment,
    Transaction, TransactionDraft, TransactionKind,
};
use vantt_core::services::{
    AccountService, BudgetService, CategoryService, GoalService, ScheduleService,
    TransactionService,
};
use vantt_core::storage::{JsonStorage, StorageBackend};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(year: i32, m: u32) -> MonthKey {
    MonthKey::new(year, m).unwrap()
}

fn store_in(dir: &Path, retention: usize) -> JsonStorage {
    JsonStorage::new(Some(dir.to_path_buf()), Some(retention)).expect("storage")
}

/// Mirrors the store's temp-file naming so a test can stage a collision.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.tmp", existing),
        None => String::from("tmp"),
    };
    tmp.set_extension(ext);
    tmp
}

/// A small but fully wired ledger: flows, a paid schedule, a budget, a goal.
fn working_ledger() -> Ledger {
    let mut ledger = Ledger::new("Household");
    let checking =
        AccountService::add(&mut ledger, Account::new("Checking", AccountKind::Debit, 1200.0))
            .unwrap();
    let salary =
        CategoryService::add(&mut ledger, Category::new("Salary", CategoryKind::Income)).unwrap();
    let food =
        CategoryService::add(&mut ledger, Category::new("Food", CategoryKind::Expense)).unwrap();
    let housing =
        CategoryService::add(&mut ledger, Category::new("Housing", CategoryKind::Expense))
            .unwrap();

    TransactionService::add(
        &mut ledger,
        TransactionDraft::new(2500.0, TransactionKind::Income, salary, checking, date(2025, 4, 1)),
    )
    .unwrap();
    TransactionService::add(
        &mut ledger,
        TransactionDraft::new(150.0, TransactionKind::Expense, food, checking, date(2025, 4, 3)),
    )
    .unwrap();

    let rent_id = ScheduleService::add(
        &mut ledger,
        ScheduledPayment::new(
            "Rent",
            900.0,
            TransactionKind::Expense,
            housing,
            checking,
            Frequency::Monthly,
            month(2025, 1),
        )
        .with_day_of_month(5),
    )
    .unwrap();
    let rent = ScheduleService::occurrences(&ledger, month(2025, 4))
        .into_iter()
        .find(|occurrence| occurrence.scheduled_payment_id == rent_id)
        .unwrap();
    ScheduleService::resolve(&mut ledger, &rent, ResolveAction::Pay, None).unwrap();

    BudgetService::upsert(&mut ledger, month(2025, 4), food, 400.0).unwrap();
    let goal = GoalService::add(&mut ledger, "Vacation", 3000.0).unwrap();
    GoalService::contribute(&mut ledger, goal, 250.0).unwrap();

    ledger
}

#[test]
fn a_working_ledger_survives_the_round_trip() {
    let temp = tempdir().unwrap();
    let storage = store_in(temp.path(), 3);
    let ledger = working_ledger();
    let now = Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap();
    let today = now.date_naive();

    let balances_before = balances(&ledger);
    let occurrences_before = occurrences_for(&ledger, month(2025, 4));
    let forecast_before = forecast(&ledger, today);
    let score_before = score(&ledger, now);

    storage.save(&ledger, "household").expect("save");
    let report = storage.load("household").expect("load");
    assert!(report.warnings.is_empty(), "clean ledger loads clean");
    let loaded = report.ledger;

    assert_eq!(loaded.transaction_count(), ledger.transaction_count());
    assert_eq!(loaded.payment_instances.len(), 1);
    let paid = occurrences_before
        .iter()
        .find(|occurrence| occurrence.instance_id.is_some())
        .expect("the rent occurrence was resolved");
    assert!(
        loaded.instance(&paid.key()).is_some(),
        "the resolution record is reachable by its key after reload"
    );

    assert_eq!(balances(&loaded), balances_before);
    assert_eq!(occurrences_for(&loaded, month(2025, 4)), occurrences_before);
    assert_eq!(forecast(&loaded, today), forecast_before);
    assert_eq!(score(&loaded, now), score_before);
}

#[test]
fn interrupted_writes_leave_the_previous_file_intact() {
    let temp = tempdir().unwrap();
    let storage = store_in(temp.path(), 3);
    let mut ledger = working_ledger();

    storage.save(&ledger, "reliable").expect("initial save");
    let path = storage.ledger_path("reliable");
    let original = fs::read_to_string(&path).expect("read original");

    // A directory squatting on the temp path makes the staged write fail.
    let tmp = tmp_path_for(&path);
    fs::create_dir_all(&tmp).unwrap();

    ledger.name = "Renamed".into();
    let result = storage.save(&ledger, "reliable");
    assert!(result.is_err(), "the staged write cannot be created");

    let current = fs::read_to_string(&path).expect("read after failure");
    assert_eq!(current, original, "a failed save never corrupts the file");

    let backups = storage.list_backups("reliable").expect("list backups");
    assert!(
        !backups.is_empty(),
        "the pre-write backup is taken before the staged write"
    );

    let _ = fs::remove_dir_all(&tmp);
}

#[test]
fn restore_rewinds_to_the_backed_up_state() {
    let temp = tempdir().unwrap();
    let storage = store_in(temp.path(), 5);

    let mut ledger = Ledger::new("Family");
    let account = ledger.add_account(Account::new("Checking", AccountKind::Debit, 100.0));
    let category = ledger.add_category(Category::new("Misc", CategoryKind::Expense));
    let draft =
        TransactionDraft::new(40.0, TransactionKind::Expense, category, account, date(2025, 4, 2));
    ledger.add_transaction(Transaction::from_draft(draft, Utc::now()));

    storage.save(&ledger, "family").expect("first save");

    let draft =
        TransactionDraft::new(60.0, TransactionKind::Expense, category, account, date(2025, 4, 4));
    ledger.add_transaction(Transaction::from_draft(draft, Utc::now()));
    storage.save(&ledger, "family").expect("second save");

    let backups = storage.list_backups("family").expect("list backups");
    assert!(!backups.is_empty(), "the second save snapshots the first");

    let oldest = backups.last().unwrap().clone();
    let restored = storage.restore("family", &oldest).expect("restore");
    assert_eq!(restored.ledger.transaction_count(), 1);

    // The live file was rewound as well.
    let reloaded = storage.load("family").expect("reload");
    assert_eq!(reloaded.ledger.transaction_count(), 1);
}

#[test]
fn backups_carry_notes_and_respect_retention() {
    let temp = tempdir().unwrap();
    let storage = store_in(temp.path(), 2);
    let ledger = working_ledger();
    storage.save(&ledger, "household").expect("save");

    storage
        .backup(&ledger, "household", Some("before import"))
        .expect("noted backup");
    let backups = storage.list_backups("household").expect("list");
    assert!(
        backups.iter().any(|name| name.contains("before-import")),
        "the note is slugged into the file name: {backups:?}"
    );

    storage.backup(&ledger, "household", Some("two")).expect("backup");
    storage.backup(&ledger, "household", Some("three")).expect("backup");
    let backups = storage.list_backups("household").expect("list");
    assert_eq!(backups.len(), 2, "pruning holds the list at the retention cap");
}

#[test]
fn the_store_remembers_the_last_opened_ledger() {
    let temp = tempdir().unwrap();
    let storage = store_in(temp.path(), 3);

    assert_eq!(storage.last_ledger().unwrap(), None);
    storage.record_last_ledger(Some("Family Budget")).unwrap();
    assert_eq!(
        storage.last_ledger().unwrap().as_deref(),
        Some("family_budget"),
        "names are canonicalized before being remembered"
    );
    storage.record_last_ledger(None).unwrap();
    assert_eq!(storage.last_ledger().unwrap(), None);
}

#[test]
fn dangling_references_surface_as_load_warnings() {
    let temp = tempdir().unwrap();
    let storage = store_in(temp.path(), 3);

    let mut ledger = Ledger::new("Messy");
    let account = ledger.add_account(Account::new("Checking", AccountKind::Debit, 100.0));
    let category = ledger.add_category(Category::new("Misc", CategoryKind::Expense));
    let draft =
        TransactionDraft::new(10.0, TransactionKind::Expense, category, account, date(2025, 4, 2));
    ledger.add_transaction(Transaction::from_draft(draft, Utc::now()));
    // Drop the category out from under the transaction.
    ledger.remove_category(category);

    storage.save(&ledger, "messy").expect("save");
    let report = storage.load("messy").expect("load");
    assert_eq!(report.warnings.len(), 1);
    assert!(
        report.warnings[0].contains("missing category"),
        "unexpected warning: {}",
        report.warnings[0]
    );
}
