use chrono::NaiveDate;
use std::collections::BTreeMap;
use sync_core::{date_to_ts, CellValue, ColumnAccessor, ColumnSpec, ColumnType, Error, Record};
use table_store::{Filters, MemoryTableStore, StoreCall};
use table_sync::{
    add_records, delete_records, fetch_table, sync_table, update_records, RecordDict, SyncOptions,
};

type Row = BTreeMap<String, CellValue>;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn datets(y: i32, m: u32, d: u32) -> i64 {
    date_to_ts(date(y, m, d)) as i64
}

fn seeded_row(text: &str, num: CellValue, ts: i64, color: i64) -> [(&str, CellValue); 4] {
    [
        ("Text_Field", CellValue::from(text)),
        ("Num", num),
        ("Date", CellValue::Int(ts)),
        ("ColorRef", CellValue::Int(color)),
    ]
}

/// Table1: Apple, Orange, Melon, Strawberry with ids 1..=4.
fn table1() -> MemoryTableStore {
    MemoryTableStore::new()
        .with_table("Table1", ["Text_Field", "Num", "Date", "ColorRef"])
        .with_row("Table1", seeded_row("Apple", 5.into(), datets(2019, 6, 26), 1))
        .with_row("Table1", seeded_row("Orange", 8.into(), datets(2019, 5, 1), 2))
        .with_row("Table1", seeded_row("Melon", 12.into(), datets(2019, 4, 2), 3))
        .with_row("Table1", seeded_row("Strawberry", 1.5.into(), datets(2019, 3, 3), 1))
}

/// `(id, Text_Field, Num, Date, ColorRef)` per row.
type Snapshot = Vec<(i64, CellValue, CellValue, CellValue, CellValue)>;

fn snap(
    id: i64,
    text: Option<&str>,
    num: impl Into<CellValue>,
    ts: Option<i64>,
    color: Option<i64>,
) -> (i64, CellValue, CellValue, CellValue, CellValue) {
    (id, text.into(), num.into(), ts.into(), color.into())
}

fn initial() -> Snapshot {
    vec![
        snap(1, Some("Apple"), 5, Some(datets(2019, 6, 26)), Some(1)),
        snap(2, Some("Orange"), 8, Some(datets(2019, 5, 1)), Some(2)),
        snap(3, Some("Melon"), 12, Some(datets(2019, 4, 2)), Some(3)),
        snap(4, Some("Strawberry"), 1.5, Some(datets(2019, 3, 3)), Some(1)),
    ]
}

async fn snapshot(store: &MemoryTableStore) -> Snapshot {
    let field = |rec: &Record, name: &str| rec.get(name).cloned().unwrap_or(CellValue::Null);
    store
        .rows("Table1")
        .await
        .unwrap()
        .iter()
        .map(|rec| {
            (
                rec.id,
                field(rec, "Text_Field"),
                field(rec, "Num"),
                field(rec, "Date"),
                field(rec, "ColorRef"),
            )
        })
        .collect()
}

fn rec(fields: &[(&str, CellValue)]) -> RecordDict {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn fruit(name: &str, num: impl Into<CellValue>, day: Option<NaiveDate>) -> Row {
    Row::from([
        ("name".to_string(), CellValue::from(name)),
        ("num".to_string(), num.into()),
        ("date".to_string(), day.into()),
    ])
}

fn fruit_key_cols() -> Vec<ColumnSpec<Row>> {
    vec![ColumnSpec::typed("Text_Field", "name", ColumnType::Text)]
}

fn fruit_other_cols() -> Vec<ColumnSpec<Row>> {
    vec![
        ColumnSpec::typed("Num", "num", ColumnType::Numeric),
        ColumnSpec::typed("Date", "date", ColumnType::Date),
    ]
}

fn batch_sizes(calls: &[StoreCall]) -> Vec<usize> {
    calls
        .iter()
        .map(|call| match call {
            StoreCall::BulkAdd { data, .. } | StoreCall::BulkUpdate { data, .. } => {
                data.row_count()
            }
            StoreCall::BulkDelete { row_ids, .. } => row_ids.len(),
            StoreCall::Fetch { .. } => 0,
        })
        .collect()
}

// ── fetch / add / update / delete ───────────────────────────────

#[tokio::test]
async fn fetch_table_with_filters() {
    let store = table1();
    let rows = fetch_table(&store, "Table1", None).await.unwrap();
    assert_eq!(rows.len(), 4);

    let filters = Filters::from([("ColorRef".to_string(), CellValue::Int(1))]);
    let rows = fetch_table(&store, "Table1", Some(&filters)).await.unwrap();
    assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 4]);
}

#[tokio::test]
async fn add_and_delete_records() {
    let store = table1();
    let ids = add_records(
        &store,
        "Table1",
        &[
            rec(&[
                ("Text_Field", "Eggs".into()),
                ("Num", 2.into()),
                ("ColorRef", 3.into()),
                ("Date", date(2019, 1, 17).into()),
            ]),
            rec(&[("Text_Field", "Beets".into()), ("Num", 2.into())]),
        ],
        None,
    )
    .await
    .unwrap();
    assert_eq!(ids, vec![5, 6]);

    let filters = Filters::from([("Num".to_string(), CellValue::Int(2))]);
    let rows = fetch_table(&store, "Table1", Some(&filters)).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Date"), Some(&CellValue::Int(datets(2019, 1, 17))));
    assert_eq!(rows[1].get("Date"), Some(&CellValue::Null));

    delete_records(&store, "Table1", &[5, 6], None).await.unwrap();
    let rows = fetch_table(&store, "Table1", Some(&filters)).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(snapshot(&store).await, initial());
}

#[tokio::test]
async fn empty_inputs_send_nothing() {
    let store = table1();
    assert!(add_records(&store, "Table1", &[], None).await.unwrap().is_empty());
    update_records(&store, "Table1", &[], false, None).await.unwrap();
    delete_records(&store, "Table1", &[], Some(10)).await.unwrap();
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn update_records_same_columns() {
    let store = table1();
    update_records(
        &store,
        "Table1",
        &[
            rec(&[
                ("id", 1.into()),
                ("Num", (-5).into()),
                ("Text_Field", "snapple".into()),
                ("ColorRef", 2.into()),
            ]),
            rec(&[
                ("id", 4.into()),
                ("Num", (-1.5).into()),
                ("Text_Field", CellValue::Null),
                ("ColorRef", 2.into()),
            ]),
        ],
        false,
        None,
    )
    .await
    .unwrap();

    assert_eq!(store.write_calls().await.len(), 1);
    let mut expected = initial();
    expected[0] = snap(1, Some("snapple"), -5, Some(datets(2019, 6, 26)), Some(2));
    expected[3] = snap(4, None, -1.5, Some(datets(2019, 3, 3)), Some(2));
    assert_eq!(snapshot(&store).await, expected);
}

#[tokio::test]
async fn update_records_varied_columns() {
    let store = table1();
    let records = vec![
        rec(&[("id", 1.into()), ("Num", (-5).into()), ("Text_Field", "snapple".into())]),
        rec(&[("id", 4.into()), ("Num", (-1.5).into()), ("ColorRef", 2.into())]),
    ];

    let err = update_records(&store, "Table1", &records, false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m.contains("needs group_if_needed")));
    assert!(store.calls().await.is_empty());
    assert_eq!(snapshot(&store).await, initial());

    update_records(&store, "Table1", &records, true, None)
        .await
        .unwrap();
    let calls = store.write_calls().await;
    assert_eq!(calls.len(), 2);
    // groups go out sorted by column set: (ColorRef, Num, id) before (Num, Text_Field, id)
    match &calls[0] {
        StoreCall::BulkUpdate { data, .. } => {
            assert_eq!(data.column("id"), Some(&[serde_json::json!(4)][..]))
        }
        other => panic!("unexpected call: {other:?}"),
    }

    let mut expected = initial();
    expected[0] = snap(1, Some("snapple"), -5, Some(datets(2019, 6, 26)), Some(1));
    expected[3] = snap(4, Some("Strawberry"), -1.5, Some(datets(2019, 3, 3)), Some(2));
    assert_eq!(snapshot(&store).await, expected);
}

#[tokio::test]
async fn update_records_without_id_sends_nothing() {
    let store = table1();
    let err = update_records(&store, "Table1", &[rec(&[("Num", 1.into())])], false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(store.calls().await.is_empty());
}

#[tokio::test]
async fn chunked_add_update_delete() {
    let store = table1();
    let records: Vec<RecordDict> = (0..50i64)
        .map(|n| rec(&[("Text_Field", "Chunk".into()), ("Num", n.into())]))
        .collect();
    let ids = add_records(&store, "Table1", &records, Some(12)).await.unwrap();
    assert_eq!(ids, (5..55).collect::<Vec<i64>>());
    assert_eq!(batch_sizes(&store.write_calls().await), vec![12, 12, 12, 12, 2]);

    store.clear_calls().await;
    let updates: Vec<RecordDict> = ids
        .iter()
        .map(|id| {
            rec(&[
                ("id", (*id).into()),
                ("Text_Field", "Peanut Butter".into()),
                ("ColorRef", 2.into()),
            ])
        })
        .collect();
    update_records(&store, "Table1", &updates, false, Some(12))
        .await
        .unwrap();
    assert_eq!(batch_sizes(&store.write_calls().await), vec![12, 12, 12, 12, 2]);
    let rows = store.rows("Table1").await.unwrap();
    assert!(rows[4..]
        .iter()
        .all(|r| r.get("Text_Field") == Some(&CellValue::from("Peanut Butter"))));

    store.clear_calls().await;
    delete_records(&store, "Table1", &ids, Some(12)).await.unwrap();
    assert_eq!(batch_sizes(&store.write_calls().await), vec![12, 12, 12, 12, 2]);
    assert_eq!(snapshot(&store).await, initial());
}

#[tokio::test]
async fn remote_errors_carry_server_message() {
    let store = table1();
    let err = fetch_table(&store, "Unicorn", None).await.unwrap_err();
    assert!(err.to_string().contains("Table not found \"Unicorn\""));

    let filters = Filters::from([
        ("ColorRef".to_string(), CellValue::Int(1)),
        ("ColorBoom".to_string(), CellValue::Int(2)),
    ]);
    let err = fetch_table(&store, "Table1", Some(&filters))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ColorBoom"));

    let err = add_records(
        &store,
        "Table1",
        &[rec(&[("Text_Field", "Beets".into()), ("NumX", 2.into())])],
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Error::RemoteRequest { status: 400, ref message } if message == "Invalid column \"NumX\""
    ));
}

// ── sync_table ──────────────────────────────────────────────────

#[tokio::test]
async fn sync_table_updates_and_adds() {
    let store = table1();
    let summary = sync_table(
        &store,
        "Table1",
        &[
            fruit("Apple", 17, Some(date(2020, 5, 1))),
            fruit("Banana", 33, Some(date(2020, 5, 2))),
            fruit("Melon", 28, None),
        ],
        &fruit_key_cols(),
        &fruit_other_cols(),
        SyncOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.baseline_rows, 4);
    assert_eq!(summary.data_count, 3);
    assert_eq!(summary.filtered_out, 0);
    assert_eq!(summary.updates, 2);
    assert_eq!(summary.adds, 1);
    assert_eq!(summary.added_ids, vec![5]);

    // updates always go out before adds
    let calls = store.write_calls().await;
    assert!(matches!(calls[0], StoreCall::BulkUpdate { .. }));
    assert!(matches!(calls[1], StoreCall::BulkAdd { .. }));
    assert_eq!(calls.len(), 2);

    let mut expected = initial();
    expected[0] = snap(1, Some("Apple"), 17, Some(datets(2020, 5, 1)), Some(1));
    expected[2] = snap(3, Some("Melon"), 28, None, Some(3));
    expected.push(snap(5, Some("Banana"), 33, Some(datets(2020, 5, 2)), None));
    assert_eq!(snapshot(&store).await, expected);

    // revert, then drop the added row
    sync_table(
        &store,
        "Table1",
        &[
            fruit("Apple", 5, Some(date(2019, 6, 26))),
            fruit("Melon", 12, Some(date(2019, 4, 2))),
        ],
        &fruit_key_cols(),
        &fruit_other_cols(),
        SyncOptions::default(),
    )
    .await
    .unwrap();
    delete_records(&store, "Table1", &[5], None).await.unwrap();
    assert_eq!(snapshot(&store).await, initial());
}

#[tokio::test]
async fn sync_table_with_function_accessors() {
    type Tuple = Vec<CellValue>;
    let at = |i: usize| ColumnAccessor::function(move |r: &Tuple| r[i].clone());
    let key_cols = vec![ColumnSpec::new("Text_Field", at(0))];
    let other_cols = vec![ColumnSpec::new("Num", at(1)), ColumnSpec::new("Date", at(2))];

    let store = table1();
    let summary = sync_table(
        &store,
        "Table1",
        &[
            vec!["Apple".into(), 17.into(), date(2020, 5, 1).into()],
            vec!["Banana".into(), 33.into(), date(2020, 5, 2).into()],
            vec!["Melon".into(), 28.into(), CellValue::Null],
        ],
        &key_cols,
        &other_cols,
        SyncOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!((summary.updates, summary.adds), (2, 1));

    let mut expected = initial();
    expected[0] = snap(1, Some("Apple"), 17, Some(datets(2020, 5, 1)), Some(1));
    expected[2] = snap(3, Some("Melon"), 28, None, Some(3));
    expected.push(snap(5, Some("Banana"), 33, Some(datets(2020, 5, 2)), None));
    assert_eq!(snapshot(&store).await, expected);
}

#[tokio::test]
async fn sync_table_with_positional_fields() {
    let key_cols: Vec<ColumnSpec<Vec<CellValue>>> =
        vec![ColumnSpec::typed("Text_Field", "0", ColumnType::Text)];
    let other_cols = vec![ColumnSpec::typed("Num", "1", ColumnType::Numeric)];

    let store = table1();
    let summary = sync_table(
        &store,
        "Table1",
        &[vec!["Orange".into(), 9.into()]],
        &key_cols,
        &other_cols,
        SyncOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!((summary.updates, summary.adds), (1, 0));
    assert_eq!(snapshot(&store).await[1].2, CellValue::Int(9));
}

#[tokio::test]
async fn sync_table_with_remote_filters() {
    let store = table1();
    let filters = Filters::from([("ColorRef".to_string(), CellValue::Int(1))]);
    let summary = sync_table(
        &store,
        "Table1",
        &[
            fruit("Melon", 100, Some(date(2020, 6, 1))),
            fruit("Strawberry", 200, Some(date(2020, 6, 2))),
        ],
        &fruit_key_cols(),
        &fruit_other_cols(),
        SyncOptions::default().with_filters(filters.clone()),
    )
    .await
    .unwrap();

    // the baseline only holds the filtered view, so Melon is new to it
    assert_eq!(summary.baseline_rows, 2);
    assert_eq!(summary.filtered_out, 0);
    assert_eq!((summary.updates, summary.adds), (1, 1));
    assert_eq!(
        store.calls().await[0],
        StoreCall::Fetch {
            table_id: "Table1".to_string(),
            filters: Some(filters),
        }
    );

    let mut expected = initial();
    expected[3] = snap(4, Some("Strawberry"), 200, Some(datets(2020, 6, 2)), Some(1));
    expected.push(snap(5, Some("Melon"), 100, Some(datets(2020, 6, 1)), None));
    assert_eq!(snapshot(&store).await, expected);
}

#[tokio::test]
async fn sync_table_filter_excludes_records_on_key_columns() {
    let store = table1();
    let key_cols: Vec<ColumnSpec<Row>> =
        vec![ColumnSpec::typed("Text_Field", "Text_Field", ColumnType::Text)];
    let other_cols = vec![ColumnSpec::typed("Num", "Num", ColumnType::Numeric)];
    let new_data = vec![
        Row::from([
            ("Text_Field".to_string(), CellValue::from("Apple")),
            ("Num".to_string(), CellValue::Int(99)),
        ]),
        Row::from([
            ("Text_Field".to_string(), CellValue::from("Banana")),
            ("Num".to_string(), CellValue::Int(1)),
        ]),
    ];
    let filters = Filters::from([("Text_Field".to_string(), CellValue::from("Apple"))]);

    let summary = sync_table(
        &store,
        "Table1",
        &new_data,
        &key_cols,
        &other_cols,
        SyncOptions::default().with_filters(filters),
    )
    .await
    .unwrap();
    assert_eq!(summary.filtered_out, 1);
    assert_eq!(summary.data_count, 1);
    assert_eq!((summary.updates, summary.adds), (1, 0));
    assert_eq!(store.rows("Table1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn sync_table_is_idempotent() {
    let store = table1();
    let new_data = vec![
        fruit("Apple", 17, Some(date(2020, 5, 1))),
        fruit("Kiwi", 3, None),
    ];
    for _ in 0..2 {
        store.clear_calls().await;
        sync_table(
            &store,
            "Table1",
            &new_data,
            &fruit_key_cols(),
            &fruit_other_cols(),
            SyncOptions::default(),
        )
        .await
        .unwrap();
    }

    // second round: only the fetch
    assert!(store.write_calls().await.is_empty());
    assert_eq!(store.calls().await.len(), 1);
}

#[tokio::test]
async fn sync_table_with_supplied_baseline_does_not_fetch() {
    let store = MemoryTableStore::new().with_table("T", ["key", "num"]);
    let baseline = vec![Record::new(1).with_field("key", "A").with_field("num", 5)];
    let new_data = vec![
        Row::from([
            ("key".to_string(), CellValue::from("A")),
            ("num".to_string(), CellValue::Int(5)),
        ]),
        Row::from([
            ("key".to_string(), CellValue::from("B")),
            ("num".to_string(), CellValue::Int(9)),
        ]),
    ];
    let summary = sync_table(
        &store,
        "T",
        &new_data,
        &[ColumnSpec::new("key", "key")],
        &[ColumnSpec::new("num", "num")],
        SyncOptions::default().with_baseline(baseline),
    )
    .await
    .unwrap();

    assert_eq!((summary.updates, summary.adds), (0, 1));
    let calls = store.calls().await;
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        StoreCall::BulkAdd { data, .. } => {
            assert_eq!(
                serde_json::to_value(data).unwrap(),
                serde_json::json!({"key": ["B"], "num": [9]})
            );
        }
        other => panic!("unexpected call: {other:?}"),
    }
}

#[tokio::test]
async fn sync_table_with_empty_baseline_fetches() {
    let store = table1();
    let summary = sync_table(
        &store,
        "Table1",
        &[fruit("Apple", 5, Some(date(2019, 6, 26)))],
        &fruit_key_cols(),
        &fruit_other_cols(),
        SyncOptions::default().with_baseline(Vec::new()),
    )
    .await
    .unwrap();
    assert_eq!(summary.baseline_rows, 4);
    assert_eq!((summary.updates, summary.adds), (0, 0));
    let calls = store.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], StoreCall::Fetch { .. }));
    assert_eq!(snapshot(&store).await, initial());
}

#[tokio::test]
async fn sync_table_failure_leaves_earlier_batches_applied() {
    // write #0 is the update batch, write #1 the add batch
    let store = table1().failing_on_write(1);
    let err = sync_table(
        &store,
        "Table1",
        &[
            fruit("Apple", 17, Some(date(2019, 6, 26))),
            fruit("Banana", 33, None),
        ],
        &fruit_key_cols(),
        &fruit_other_cols(),
        SyncOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::RemoteRequest { status: 500, .. }));

    let mut expected = initial();
    expected[0] = snap(1, Some("Apple"), 17, Some(datets(2019, 6, 26)), Some(1));
    assert_eq!(snapshot(&store).await, expected);
}

#[tokio::test]
async fn sync_table_chunked_adds_stop_at_failed_chunk() {
    let store = MemoryTableStore::new()
        .with_table("T", ["key"])
        .failing_on_write(1);
    let new_data: Vec<Row> = (0..5)
        .map(|n| Row::from([("key".to_string(), CellValue::from(format!("k{n}")))]))
        .collect();
    let result = sync_table(
        &store,
        "T",
        &new_data,
        &[ColumnSpec::new("key", "key")],
        &[],
        SyncOptions::default().with_chunk_size(2),
    )
    .await;
    assert!(result.is_err());
    assert_eq!(store.rows("T").await.unwrap().len(), 2);
}
