use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use rust_decimal::Decimal;
use ytledger_catalog::{CatalogOp, MemoryCatalog};
use ytledger_core::{Category, CostRule, CostSchedule, JobConfig, SheetNames, VideoRecord};
use ytledger_sheet::{CellRef, CellValue, GridRange, MemoryWorkbook, Sheet, SheetStore, StoreOp};
use ytledger_sync::{
    reconcile_costs, run_sync, setup_workbook, upsert_ledger, LedgerLayout, LedgerStatus, MonthKey,
    SkipReason, SyncOptions, SyncOutcome, SyncReport, SyncStage,
};

const CHANNEL: &str = "UCledger";
const LONG: &str = "Videos_Longos";
const SHORT: &str = "Shorts";
const DASHBOARD: &str = "Dashboard";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
}

fn sao_paulo() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

fn options() -> SyncOptions {
    SyncOptions {
        now: now(),
        utc_offset: sao_paulo(),
    }
}

fn rule(role: &str, value: i64) -> CostRule {
    CostRule::new(role, Decimal::from(value))
}

fn money(value: i64) -> CellValue {
    CellValue::Number(Decimal::from(value))
}

fn job(long_form: Vec<CostRule>, short_form: Vec<CostRule>) -> JobConfig {
    JobConfig {
        channel: CHANNEL.to_string(),
        costs: CostSchedule {
            long_form,
            short_form,
        },
        sheets: SheetNames::default(),
    }
}

fn default_job() -> JobConfig {
    job(
        vec![rule("Editor", 100), rule("Thumbnail", 50)],
        vec![rule("Editor", 150)],
    )
}

fn video(id: &str, month: u32, day: u32, duration_seconds: u64, view_count: u64) -> VideoRecord {
    VideoRecord {
        id: id.to_string(),
        published_at: Utc.with_ymd_and_hms(2025, month, day, 15, 0, 0).unwrap(),
        title: format!("Video {id}"),
        duration_seconds,
        view_count,
    }
}

/// Uploads listed newest first, like the uploads playlist.
fn catalog(mut videos: Vec<VideoRecord>) -> MemoryCatalog {
    videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    MemoryCatalog::default().with_channel_uploads(CHANNEL, videos)
}

async fn prepared(job: &JobConfig) -> MemoryWorkbook {
    let mut workbook = MemoryWorkbook::new();
    setup_workbook(&mut workbook, job, now(), sao_paulo())
        .await
        .unwrap();
    workbook
}

async fn sync(catalog: &MemoryCatalog, workbook: &mut MemoryWorkbook, job: &JobConfig) -> SyncReport {
    match run_sync(catalog, workbook, job, options()).await {
        SyncOutcome::Completed(report) => report,
        other => panic!("expected a completed run, got {other:?}"),
    }
}

fn sheet<'a>(workbook: &'a MemoryWorkbook, name: &str) -> &'a Sheet {
    workbook.sheet(name).unwrap()
}

fn link(id: &str) -> CellValue {
    CellValue::from(format!("https://www.youtube.com/watch?v={id}"))
}

#[tokio::test]
async fn first_sync_files_videos_by_duration() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    let catalog = catalog(vec![
        video("limit", 3, 1, 65, 10),
        video("long", 3, 2, 66, 20),
        video("zero", 3, 3, 0, 30),
    ]);

    let report = sync(&catalog, &mut workbook, &job).await;

    assert_eq!(report.videos_fetched, 3);
    assert_eq!(report.appended(), 3);
    assert_eq!(report.updated(), 0);
    assert!(!report.is_partial());

    let long = sheet(&workbook, LONG);
    assert_eq!(long.last_row(), 5);
    assert_eq!(long.value(5, 3), link("long"));
    assert_eq!(long.value(5, 4), CellValue::from(20u64));
    assert_eq!(long.value(5, 5), money(100));
    assert_eq!(long.value(5, 6), money(50));
    assert_eq!(long.formula(5, 7), Some("=SUM(E5:F5)"));
    assert_eq!(long.value(5, 7), money(150));

    let short = sheet(&workbook, SHORT);
    assert_eq!(short.last_row(), 6);
    assert_eq!(short.value(5, 3), link("limit"));
    assert_eq!(short.value(6, 3), link("zero"));
}

#[tokio::test]
async fn rows_are_sorted_oldest_first_with_totals_following_their_row() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    let catalog = catalog(vec![
        video("c", 5, 20, 600, 1),
        video("a", 1, 10, 600, 1),
        video("b", 3, 5, 600, 1),
    ]);

    sync(&catalog, &mut workbook, &job).await;

    let long = sheet(&workbook, LONG);
    let links: Vec<CellValue> = (5..=7).map(|row| long.value(row, 3)).collect();
    assert_eq!(links, vec![link("a"), link("b"), link("c")]);
    for row in 5..=7 {
        assert_eq!(long.formula(row, 7), Some(format!("=SUM(E{row}:F{row})").as_str()));
    }
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    let catalog = catalog(vec![
        video("a", 2, 1, 600, 5),
        video("b", 3, 1, 30, 7),
        video("c", 4, 1, 900, 9),
    ]);

    sync(&catalog, &mut workbook, &job).await;
    let before: Vec<Sheet> = [DASHBOARD, LONG, SHORT]
        .iter()
        .map(|name| sheet(&workbook, name).clone())
        .collect();

    let report = sync(&catalog, &mut workbook, &job).await;

    assert_eq!(report.appended(), 0);
    assert_eq!(report.updated(), 3);
    for original in before {
        assert_eq!(sheet(&workbook, original.name()), &original);
    }
}

#[tokio::test]
async fn known_video_only_gets_fresh_view_count() {
    let job = default_job();
    let mut workbook = prepared(&job).await;

    sync(&catalog(vec![video("a", 2, 1, 600, 5)]), &mut workbook, &job).await;
    let report = sync(&catalog(vec![video("a", 2, 1, 600, 5000)]), &mut workbook, &job).await;

    assert_eq!(report.ledger(Category::LongForm).unwrap().updated, 1);
    let long = sheet(&workbook, LONG);
    assert_eq!(long.last_row(), 5);
    assert_eq!(long.value(5, 4), CellValue::from(5000u64));
    assert_eq!(long.value(5, 5), money(100));
    assert_eq!(long.value(5, 7), money(150));
}

#[tokio::test]
async fn duplicate_ids_in_one_batch_collapse_to_one_row() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    let earlier = video("dup", 2, 1, 600, 10);
    let later = video("dup", 2, 1, 600, 99);
    let rules = job.costs.rules(Category::LongForm);

    let counts = upsert_ledger(&mut workbook, LONG, rules, &[&earlier, &later])
        .await
        .unwrap();

    assert_eq!((counts.appended, counts.updated), (1, 1));
    let long = sheet(&workbook, LONG);
    assert_eq!(long.last_row(), 5);
    assert_eq!(long.value(5, 4), CellValue::from(99u64));
    assert_eq!(long.value(5, 5), money(100));
}

#[tokio::test]
async fn appended_rows_snapshot_costs_until_reconciled() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    let first = video("first", 2, 1, 600, 1);
    let second = video("second", 3, 1, 600, 1);

    upsert_ledger(&mut workbook, LONG, &[rule("Editor", 100)], &[&first])
        .await
        .unwrap();
    let raised = [rule("Editor", 120)];
    upsert_ledger(&mut workbook, LONG, &raised, &[&second])
        .await
        .unwrap();

    let long = sheet(&workbook, LONG);
    assert_eq!(long.value(5, 5), money(100));
    assert_eq!(long.value(6, 5), money(120));

    let counts = reconcile_costs(&mut workbook, LONG, &raised).await.unwrap();
    assert_eq!(counts.rows, 2);

    let long = sheet(&workbook, LONG);
    assert_eq!(long.value(5, 5), money(120));
    assert_eq!(long.value(5, 6), money(120));
    assert_eq!(long.formula(5, 6), Some("=SUM(E5:E5)"));
}

#[tokio::test]
async fn reconcile_twice_yields_identical_cells() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    sync(
        &catalog(vec![video("a", 2, 1, 600, 1), video("b", 2, 9, 600, 1)]),
        &mut workbook,
        &job,
    )
    .await;

    let rules = [rule("Editor", 80), rule("Audio", 20), rule("Thumbnail", 5)];
    let region = GridRange::open(1, 1, 10);
    reconcile_costs(&mut workbook, LONG, &rules).await.unwrap();
    let values = workbook.read_range(LONG, region).await.unwrap();
    let formulas = workbook.read_formulas(LONG, region).await.unwrap();

    reconcile_costs(&mut workbook, LONG, &rules).await.unwrap();

    assert_eq!(workbook.read_range(LONG, region).await.unwrap(), values);
    assert_eq!(workbook.read_formulas(LONG, region).await.unwrap(), formulas);
    assert_eq!(values[4][7], money(105));
}

#[tokio::test]
async fn shrinking_schedule_clears_stale_columns() {
    let wide = job(
        vec![rule("Editor", 100), rule("Audio", 30), rule("Thumbnail", 50)],
        vec![],
    );
    let mut workbook = prepared(&wide).await;
    let catalog = catalog(vec![video("a", 2, 1, 600, 1)]);
    sync(&catalog, &mut workbook, &wide).await;
    assert_eq!(sheet(&workbook, LONG).last_column(), 8);

    let narrow = job(vec![rule("Editor", 100)], vec![]);
    let report = sync(&catalog, &mut workbook, &narrow).await;

    assert_eq!(report.ledger(Category::LongForm).unwrap().cleared_columns, 2);
    let long = sheet(&workbook, LONG);
    assert_eq!(long.last_column(), 6);
    assert_eq!(long.value(4, 6), CellValue::from("Custo Total Vídeo"));
    assert_eq!(long.formula(5, 6), Some("=SUM(E5:E5)"));
    for col in 7..=8 {
        assert!(long.value(4, col).is_empty());
        assert!(long.value(5, col).is_empty());
        assert!(long.formula(5, col).is_none());
    }
    assert_eq!(long.formula(2, 1), Some("=SUM(F5:F)"));
    assert!(long.merges().contains(&GridRange::block(1, 1, 1, 6)));
}

#[tokio::test]
async fn empty_schedule_uses_literal_zero_total() {
    let job = job(vec![rule("Editor", 100)], vec![]);
    let mut workbook = prepared(&job).await;
    sync(&catalog(vec![video("s", 4, 1, 20, 1)]), &mut workbook, &job).await;

    let short = sheet(&workbook, SHORT);
    assert_eq!(short.value(4, 5), CellValue::from("Custo Total Vídeo"));
    assert_eq!(short.value(5, 5), money(0));
    assert!(short.formula(5, 5).is_none());
    assert_eq!(short.formula(2, 1), Some("=SUM(E5:E)"));
    assert_eq!(short.value(2, 1), money(0));
}

#[tokio::test]
async fn banner_carries_title_and_running_total() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    sync(
        &catalog(vec![video("a", 2, 1, 600, 1), video("b", 3, 1, 600, 1)]),
        &mut workbook,
        &job,
    )
    .await;

    let long = sheet(&workbook, LONG);
    let width = LedgerLayout::new(job.costs.rules(Category::LongForm)).total_col();
    assert_eq!(long.value(1, 1), CellValue::from("ACUMULADO TOTAL (VIDEOS_LONGOS)"));
    assert_eq!(long.value(2, 1), money(300));
    assert_eq!(
        long.merges(),
        &[GridRange::block(1, 1, 1, width), GridRange::block(2, 1, 1, width)]
    );
    assert_eq!(
        long.effective_format(2, 1).background.as_deref(),
        Some("#166534")
    );
    assert_eq!(
        sheet(&workbook, SHORT).effective_format(2, 1).background.as_deref(),
        Some("#991b1b")
    );
}

#[tokio::test]
async fn dashboard_rolls_up_costs_per_month() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    workbook
        .write_values(
            DASHBOARD,
            CellRef::new(3, 1),
            vec![
                vec![CellValue::from(3u64), CellValue::from(2025u64), money(1000)],
                vec![CellValue::from("4"), CellValue::from("2025"), money(200)],
                vec![CellValue::from(13u64), CellValue::from(2025u64), money(0)],
            ],
        )
        .await
        .unwrap();
    let catalog = catalog(vec![
        video("l1", 3, 2, 600, 1),
        video("l2", 3, 28, 600, 1),
        video("s1", 3, 15, 40, 1),
    ]);

    let report = sync(&catalog, &mut workbook, &job).await;

    assert_eq!(report.dashboard_rows, 4);
    let dashboard = sheet(&workbook, DASHBOARD);
    // Seeded current month, no videos.
    assert_eq!(dashboard.value(2, 4), money(0));
    assert_eq!(dashboard.value(2, 5), money(0));
    // March: two long-form at 150 and one short at 150.
    assert_eq!(dashboard.value(3, 4), money(300));
    assert_eq!(dashboard.value(3, 5), money(150));
    assert_eq!(dashboard.formula(3, 6), Some("=C3 - D3 - E3"));
    assert_eq!(dashboard.value(3, 6), money(550));
    // April exists but had no uploads.
    assert_eq!(dashboard.value(4, 4), money(0));
    assert_eq!(dashboard.value(4, 6), money(200));
    // An unreadable month gets zeros.
    assert_eq!(dashboard.value(5, 4), money(0));
    // Revenue is never written.
    assert_eq!(dashboard.value(3, 3), money(1000));
    assert_eq!(dashboard.last_row(), 5);
}

#[tokio::test]
async fn unresolvable_handle_skips_without_writes() {
    let mut job = default_job();
    job.channel = "@nobody".to_string();
    let mut workbook = prepared(&job).await;
    let before: Vec<Sheet> = [DASHBOARD, LONG, SHORT]
        .iter()
        .map(|name| sheet(&workbook, name).clone())
        .collect();

    let outcome = run_sync(&MemoryCatalog::default(), &mut workbook, &job, options()).await;

    assert!(matches!(
        outcome,
        SyncOutcome::Skipped(SkipReason::ChannelNotFound { ref channel }) if channel == "@nobody"
    ));
    for original in before {
        assert_eq!(sheet(&workbook, original.name()), &original);
    }
}

#[tokio::test]
async fn handle_resolves_before_fetching() {
    let mut job = default_job();
    job.channel = "@ledger".to_string();
    let mut workbook = prepared(&job).await;
    let catalog = catalog(vec![video("a", 2, 1, 600, 1)]).with_handle("@ledger", CHANNEL);

    let report = sync(&catalog, &mut workbook, &job).await;

    assert_eq!(report.channel_id.as_deref(), Some(CHANNEL));
    assert_eq!(report.appended(), 1);
}

#[tokio::test]
async fn catalog_failure_aborts_before_any_ledger_write() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    let before = sheet(&workbook, LONG).clone();
    let catalog = catalog(vec![video("a", 2, 1, 600, 1)]).failing(CatalogOp::Videos);

    let outcome = run_sync(&catalog, &mut workbook, &job, options()).await;

    let SyncOutcome::Aborted { stage, report, .. } = outcome else {
        panic!("expected an aborted run");
    };
    assert_eq!(stage, SyncStage::Fetch);
    assert_eq!(report.channel_id.as_deref(), Some(CHANNEL));
    assert!(report.ledgers.is_empty());
    assert_eq!(sheet(&workbook, LONG), &before);
}

#[tokio::test]
async fn missing_ledger_is_skipped_and_the_rest_synced() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    workbook.delete_sheet(SHORT).await.unwrap();
    let catalog = catalog(vec![video("l", 3, 1, 600, 1), video("s", 3, 2, 30, 1)]);

    let report = sync(&catalog, &mut workbook, &job).await;

    assert!(report.is_partial());
    let short = report.ledger(Category::ShortForm).unwrap();
    assert_eq!(short.status, LedgerStatus::MissingSheet);
    assert_eq!(short.appended, 0);
    assert_eq!(report.ledger(Category::LongForm).unwrap().appended, 1);
    assert!(!workbook.has_sheet(SHORT).await.unwrap());
}

#[tokio::test]
async fn setup_is_repeatable_and_drops_default_sheet() {
    let job = default_job();
    let mut workbook = MemoryWorkbook::new();

    let first = setup_workbook(&mut workbook, &job, now(), sao_paulo())
        .await
        .unwrap();
    assert_eq!(first.created, vec![DASHBOARD, LONG, SHORT]);
    assert_eq!(first.removed, vec!["Sheet1"]);
    assert_eq!(first.seeded, Some(MonthKey::new(6, 2025)));
    assert_eq!(
        workbook.sheet_names().await.unwrap(),
        vec![DASHBOARD, LONG, SHORT]
    );

    let long = sheet(&workbook, LONG);
    assert_eq!(long.value(4, 1), CellValue::from("Data"));
    assert_eq!(long.value(4, 5), CellValue::from("Editor"));
    assert_eq!(long.frozen_rows(), 4);
    let dashboard = sheet(&workbook, DASHBOARD);
    assert_eq!(dashboard.value(2, 1), CellValue::from(6u64));
    assert_eq!(dashboard.value(2, 2), CellValue::from(2025u64));
    assert_eq!(dashboard.formula(2, 6), Some("=C2 - D2 - E2"));

    let second = setup_workbook(&mut workbook, &job, now(), sao_paulo())
        .await
        .unwrap();
    assert!(second.created.is_empty());
    assert!(second.removed.is_empty());
    assert_eq!(second.seeded, None);
    assert_eq!(sheet(&workbook, DASHBOARD).last_row(), 2);
}

#[tokio::test]
async fn setup_keeps_default_sheet_with_content() {
    let job = default_job();
    let mut workbook = MemoryWorkbook::new();
    workbook
        .write_values("Sheet1", CellRef::new(1, 1), vec![vec![CellValue::from("notes")]])
        .await
        .unwrap();

    let report = setup_workbook(&mut workbook, &job, now(), sao_paulo())
        .await
        .unwrap();

    assert!(report.removed.is_empty());
    assert!(workbook.has_sheet("Sheet1").await.unwrap());
}

#[tokio::test]
async fn setup_with_fewer_roles_clears_stale_header_cells() {
    let wide = job(
        vec![rule("Editor", 100), rule("Audio", 30), rule("Thumbnail", 50)],
        vec![],
    );
    let mut workbook = prepared(&wide).await;
    sync(&catalog(vec![video("a", 2, 1, 600, 1)]), &mut workbook, &wide).await;

    let narrow = job(vec![rule("Editor", 100)], vec![]);
    setup_workbook(&mut workbook, &narrow, now(), sao_paulo())
        .await
        .unwrap();

    let long = sheet(&workbook, LONG);
    assert_eq!(long.value(4, 5), CellValue::from("Editor"));
    assert_eq!(long.value(4, 6), CellValue::from("Custo Total Vídeo"));
    for col in 7..=8 {
        assert!(long.value(4, col).is_empty());
    }
    // Data rows are left for the next sync to reconcile.
    assert_eq!(long.value(5, 7), money(50));
    assert_eq!(long.formula(5, 8), Some("=SUM(E5:G5)"));
}

#[tokio::test]
async fn run_interrupted_during_reconcile_heals_on_the_next_run() {
    let job = default_job();
    let catalog = catalog(vec![
        video("a", 6, 1, 600, 5),
        video("b", 6, 2, 30, 7),
        video("c", 5, 3, 900, 9),
    ]);

    let mut clean = prepared(&job).await;
    sync(&catalog, &mut clean, &job).await;

    let mut interrupted = prepared(&job).await;
    interrupted.fail(StoreOp::FreezeRows);
    let outcome = run_sync(&catalog, &mut interrupted, &job, options()).await;
    let SyncOutcome::Aborted { stage, report, .. } = outcome else {
        panic!("expected an aborted run");
    };
    assert_eq!(stage, SyncStage::Reconcile);
    assert_eq!(report.appended(), 3);
    assert_eq!(report.dashboard_rows, 0);
    assert_ne!(sheet(&interrupted, DASHBOARD), sheet(&clean, DASHBOARD));

    interrupted.recover();
    let report = sync(&catalog, &mut interrupted, &job).await;

    assert_eq!(report.appended(), 0);
    assert_eq!(report.updated(), 3);
    for name in [DASHBOARD, LONG, SHORT] {
        assert_eq!(sheet(&interrupted, name), sheet(&clean, name));
    }
}

#[tokio::test]
async fn banner_failure_aborts_after_reconcile() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    workbook.fail(StoreOp::MergeRange);

    let outcome = run_sync(&catalog(vec![video("a", 3, 1, 600, 1)]), &mut workbook, &job, options()).await;

    let SyncOutcome::Aborted { stage, report, .. } = outcome else {
        panic!("expected an aborted run");
    };
    assert_eq!(stage, SyncStage::Banner);
    assert_eq!(report.ledger(Category::LongForm).unwrap().reconciled_rows, 1);
}

#[tokio::test]
async fn missing_dashboard_still_completes_the_ledgers() {
    let job = default_job();
    let mut workbook = prepared(&job).await;
    workbook.delete_sheet(DASHBOARD).await.unwrap();
    let catalog = catalog(vec![video("a", 3, 1, 600, 1), video("b", 3, 2, 30, 1)]);

    let report = sync(&catalog, &mut workbook, &job).await;

    assert_eq!(report.dashboard_rows, 0);
    assert_eq!(report.appended(), 2);
    assert!(!report.is_partial());
    assert!(!workbook.has_sheet(DASHBOARD).await.unwrap());
    assert_eq!(sheet(&workbook, LONG).value(5, 3), link("a"));
}
