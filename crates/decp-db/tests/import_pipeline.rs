//! End-to-end import runs against an in-memory store.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;

use decp_core::enums::{IdentifierKind, PlaceKind, RecordKind};
use decp_db::DecpDb;
use decp_db::import::{ImportError, Importer, ItemStream};
use decp_schema::SchemaRegistry;

const SAMPLE: &str = include_str!("fixtures/decp_sample.json");

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/decp_sample.json")
}

fn sample_stream(kind: RecordKind) -> ItemStream {
    ItemStream::from_reader(SAMPLE.as_bytes(), kind.item_path(), 4)
}

fn sample_item(kind: RecordKind, index: usize) -> Value {
    let doc: Value = serde_json::from_str(SAMPLE).unwrap();
    let key = kind.item_path().rsplit('.').next().unwrap().to_string();
    doc["marches"][key][index].clone()
}

async fn memory_db() -> DecpDb {
    DecpDb::open_local(":memory:").await.unwrap()
}

#[tokio::test]
async fn contract_awards_end_to_end() {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();

    let stats = importer
        .import(sample_stream(RecordKind::Marche), RecordKind::Marche, 2)
        .await
        .unwrap();
    assert_eq!(stats.valid, 3);
    assert_eq!(stats.invalid, 2);
    assert!((stats.invalid_percent - 40.0).abs() < f64::EPSILON);

    assert_eq!(db.count_contracts().await.unwrap(), 3);
    assert_eq!(db.count_malformed().await.unwrap(), 2);
    assert_eq!(db.count_organizations().await.unwrap(), 5);
    assert_eq!(db.count_places().await.unwrap(), 2);

    let subsequent = db.find_contracts_by_id("MS-2024-07").await.unwrap().remove(0);
    assert_eq!(subsequent.duration_months, 10);
    assert!((subsequent.amount - 500.0).abs() < f64::EPSILON);
    assert_eq!(subsequent.initial_duration_months, 6);
    assert!((subsequent.initial_amount - 12000.0).abs() < f64::EPSILON);
    assert_eq!(subsequent.amendments.len(), 2);

    let act = &subsequent.subcontracting_acts[0];
    assert!((act.amount - 3500.0).abs() < f64::EPSILON);
    assert_eq!(act.duration_months, 2);

    let lenient = db.find_contracts_by_id("2019-117").await.unwrap().remove(0);
    assert_eq!(lenient.offers_received, None);
    assert!(!lenient.innovative);
    assert_eq!(lenient.procedure, None);
}

#[tokio::test]
async fn framework_reference_survives_storage() {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();
    importer
        .import(sample_stream(RecordKind::Marche), RecordKind::Marche, 1)
        .await
        .unwrap();

    let framework = db.find_contracts_by_id("AC-2024-01").await.unwrap().remove(0);
    let subsequent = db.find_contracts_by_id("MS-2024-07").await.unwrap().remove(0);
    assert_eq!(subsequent.framework_uid, Some(framework.uid));
    assert_eq!(framework.framework_uid, None);
}

#[tokio::test]
async fn rejected_items_keep_payload_and_errors() {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();
    importer
        .import(sample_stream(RecordKind::Marche), RecordKind::Marche, 10)
        .await
        .unwrap();

    let malformed = db.list_malformed(Some(RecordKind::Marche)).await.unwrap();
    assert_eq!(malformed.len(), 2);

    let missing = &malformed[0];
    let reparsed: Value = serde_json::from_str(&missing.payload).unwrap();
    assert_eq!(reparsed, sample_item(RecordKind::Marche, 2));
    assert!(missing.payload.contains('\n'), "payload should be the source text");
    assert_eq!(missing.errors[0].kind, "missing");
    assert_eq!(missing.errors[0].location, "procedure");
    assert_eq!(missing.created_on.map(|d| d.to_string()), Some("2024-06-01".into()));

    let buyer = db
        .find_organization("21690123100011", IdentifierKind::Siret)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(missing.organization_uid, Some(buyer.uid));

    let incoherent = &malformed[1];
    assert_eq!(incoherent.errors.len(), 1);
    assert_eq!(incoherent.errors[0].kind, "incoherence");
    assert_eq!(incoherent.errors[0].location, "modificationsActesSousTraitance");
    assert!(db.find_contracts_by_id("INC-2024-01").await.unwrap().is_empty());

    // The sibling sharing buyer and place with the incoherent award is intact.
    let sibling = db.find_contracts_by_id("2019-117").await.unwrap().remove(0);
    assert_eq!(sibling.buyer_uid, buyer.uid);
    assert!(buyer.is_buyer);
}

#[rstest]
#[case(1, 5)]
#[case(2, 3)]
#[case(5, 1)]
#[case(100, 1)]
#[tokio::test]
async fn one_commit_per_started_batch(#[case] batch_size: usize, #[case] commits: u64) {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();
    let stats = importer
        .import(sample_stream(RecordKind::Marche), RecordKind::Marche, batch_size)
        .await
        .unwrap();
    assert_eq!(stats.batches_committed, commits);
    assert_eq!(stats.total(), 5);
}

#[tokio::test]
async fn concessions_share_organizations_with_contracts() {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();
    importer
        .import(sample_stream(RecordKind::Marche), RecordKind::Marche, 3)
        .await
        .unwrap();
    let stats = importer
        .import(sample_stream(RecordKind::Concession), RecordKind::Concession, 3)
        .await
        .unwrap();
    assert_eq!(stats.kind, RecordKind::Concession);
    assert_eq!(stats.valid, 1);
    assert_eq!(stats.invalid, 1);

    let concessions = db.list_concessions().await.unwrap();
    assert_eq!(concessions.len(), 1);
    let dsp = &concessions[0];
    assert_eq!(dsp.duration_months, 156);
    assert!((dsp.global_value - 19_000_000.0).abs() < f64::EPSILON);
    assert_eq!(dsp.amendments.len(), 2);
    assert_eq!(dsp.execution_data[0].tariffs.len(), 2);
    assert_eq!(dsp.concessionaire_uids.len(), 2);

    // A buyer of contracts becomes a seller through a concession.
    let city = db
        .find_organization("21750001600019", IdentifierKind::Siret)
        .await
        .unwrap()
        .unwrap();
    assert!(city.is_buyer);
    assert!(city.is_seller);
    assert!(dsp.concessionaire_uids.contains(&city.uid));
    assert_eq!(db.count_organizations().await.unwrap(), 7);

    let rejected = db.list_malformed(Some(RecordKind::Concession)).await.unwrap();
    assert_eq!(rejected[0].errors[0].location, "nature");
}

#[tokio::test]
async fn rerun_after_partial_reset_reuses_reference_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("decp.db");
    let db = DecpDb::open_local(path.to_str().unwrap()).await.unwrap();
    let registry = SchemaRegistry::new().unwrap();

    let mut first = Importer::new(&db, &registry).await.unwrap();
    first
        .import_file(&sample_path(), RecordKind::Marche, 2, 16)
        .await
        .unwrap();
    let organizations = db.count_organizations().await.unwrap();
    let places = db.count_places().await.unwrap();
    let place_uid = db
        .find_contracts_by_id("2019-117")
        .await
        .unwrap()
        .remove(0)
        .place_uid
        .unwrap();

    db.reset(true).await.unwrap();
    assert_eq!(db.count_contracts().await.unwrap(), 0);
    assert_eq!(db.count_malformed().await.unwrap(), 0);

    let mut second = Importer::new(&db, &registry).await.unwrap();
    let stats = second
        .import_file(&sample_path(), RecordKind::Marche, 2, 16)
        .await
        .unwrap();
    assert_eq!(stats.valid, 3);
    assert_eq!(db.count_contracts().await.unwrap(), 3);
    assert_eq!(db.count_organizations().await.unwrap(), organizations);
    assert_eq!(db.count_places().await.unwrap(), places);

    let again = db.find_contracts_by_id("2019-117").await.unwrap().remove(0);
    assert_eq!(again.place_uid, Some(place_uid));
    let place = db.get_place(place_uid).await.unwrap();
    assert_eq!(place.kind, PlaceKind::Department);
}

#[tokio::test]
async fn truncated_document_is_fatal_but_keeps_commits() {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();

    let first = sample_item(RecordKind::Marche, 0);
    let second = sample_item(RecordKind::Marche, 4);
    let text = format!(r#"{{"marches": {{"marche": [{first}, {second}, {{"id": "#);
    let stream = ItemStream::from_reader(std::io::Cursor::new(text), "marches.marche", 4);

    let err = importer
        .import(stream, RecordKind::Marche, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::Stream(_)));
    assert_eq!(db.count_contracts().await.unwrap(), 2);
}

#[tokio::test]
async fn missing_array_is_an_empty_run() {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();
    let stream = ItemStream::from_reader(&br#"{"marches": {}}"#[..], "marches.marche", 4);

    let stats = importer.import(stream, RecordKind::Marche, 10).await.unwrap();
    assert_eq!(stats.total(), 0);
    assert_eq!(stats.batches_committed, 0);
}

#[tokio::test]
async fn stray_latin1_byte_does_not_stop_the_run() {
    let db = memory_db().await;
    let registry = SchemaRegistry::new().unwrap();
    let mut importer = Importer::new(&db, &registry).await.unwrap();

    let (head, tail) = SAMPLE.split_once("mobilier scolaire").unwrap();
    let mut bytes = head.as_bytes().to_vec();
    bytes.extend_from_slice(b"mobilier\xE9 scolaire");
    bytes.extend_from_slice(tail.as_bytes());
    let stream = ItemStream::from_reader(std::io::Cursor::new(bytes), "marches.marche", 4);

    let stats = importer.import(stream, RecordKind::Marche, 10).await.unwrap();
    assert_eq!(stats.valid, 3);
    assert_eq!(stats.invalid, 2);

    let lenient = db.find_contracts_by_id("2019-117").await.unwrap().remove(0);
    assert_eq!(lenient.object, "Fourniture de mobilier scolaire");
}
