use geomirror_storage::{
    AdminLogRecord, AttachmentColumns, FeatureColumns, LocalStore, MunicipalityDraft,
    OperationRecord, StorageError,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn columns(fio: &str, n_raion: Option<&str>) -> FeatureColumns {
    FeatureColumns {
        geom: "POINT (55.1 51.8)".into(),
        version: Some(1),
        description: Some("memorial".into()),
        fid_1: Some("F-1".into()),
        num: Some(12),
        n_raion: n_raion.map(Into::into),
        fio: Some(fio.into()),
        years: Some("1941-1945".into()),
        info: None,
        kontrakt: Some("K-7".into()),
        nagrads: None,
    }
}

fn attachment(name: &str) -> AttachmentColumns {
    AttachmentColumns {
        name: name.into(),
        keyname: None,
        size: 1024,
        mime_type: "image/jpeg".into(),
        description: None,
        is_image: true,
        file_meta: json!({"exif": {"w": 10}}),
    }
}

// ── Features ─────────────────────────────────────────────────────

#[test]
fn insert_and_find_by_external_id() {
    let store = LocalStore::open_in_memory().unwrap();
    let inserted = store.insert_feature(42, &columns("A", None)).unwrap();

    let found = store.find_feature_by_external_id(42).unwrap().unwrap();
    assert_eq!(found, inserted);
    assert_eq!(found.columns.fio.as_deref(), Some("A"));
    assert!(store.find_feature_by_external_id(43).unwrap().is_none());
}

#[test]
fn duplicate_external_id_is_conflict() {
    let store = LocalStore::open_in_memory().unwrap();
    store.insert_feature(42, &columns("A", None)).unwrap();

    let err = store.insert_feature(42, &columns("B", None)).unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");
    assert_eq!(store.count_features().unwrap(), 1);
}

#[test]
fn update_overwrites_all_columns() {
    let store = LocalStore::open_in_memory().unwrap();
    let row = store.insert_feature(42, &columns("A", Some("North"))).unwrap();

    let mut next = columns("B", None);
    next.description = None;
    let updated = store.update_feature(row.id, &next).unwrap();

    assert_eq!(updated.id, row.id);
    assert_eq!(updated.external_id, 42);
    assert_eq!(updated.columns, next);
    assert_eq!(updated.created_at, row.created_at);
}

#[test]
fn update_missing_feature_is_not_found() {
    let store = LocalStore::open_in_memory().unwrap();
    let err = store.update_feature(999, &columns("A", None)).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[test]
fn get_missing_feature_is_not_found() {
    let store = LocalStore::open_in_memory().unwrap();
    assert!(matches!(store.get_feature(5), Err(StorageError::NotFound(_))));
}

#[test]
fn list_features_pages_by_local_id() {
    let store = LocalStore::open_in_memory().unwrap();
    for ext in [30, 10, 20] {
        store.insert_feature(ext, &columns("X", None)).unwrap();
    }

    let all = store.list_features(0, 100).unwrap();
    let ids: Vec<i64> = all.iter().map(|f| f.external_id).collect();
    assert_eq!(ids, vec![30, 10, 20]);

    let page = store.list_features(1, 1).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].external_id, 10);

    assert!(store.list_features(5, 10).unwrap().is_empty());
}

#[test]
fn delete_by_external_ids_cascades_attachments() {
    let store = LocalStore::open_in_memory().unwrap();
    let keep = store.insert_feature(1, &columns("A", None)).unwrap();
    let gone = store.insert_feature(2, &columns("B", None)).unwrap();
    store.insert_attachment(keep.id, 7, &attachment("a.jpg")).unwrap();
    store.insert_attachment(gone.id, 8, &attachment("b.jpg")).unwrap();
    store.insert_attachment(gone.id, 9, &attachment("c.jpg")).unwrap();

    let deleted = store.delete_features_by_external_ids(&[2, 404]).unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.count_features().unwrap(), 1);
    assert_eq!(store.count_attachments().unwrap(), 1);
    assert!(store.list_attachments(gone.id).unwrap().is_empty());
}

#[test]
fn delete_with_no_ids_is_noop() {
    let store = LocalStore::open_in_memory().unwrap();
    store.insert_feature(1, &columns("A", None)).unwrap();
    assert_eq!(store.delete_features_by_external_ids(&[]).unwrap(), 0);
    assert_eq!(store.count_features().unwrap(), 1);
}

// ── Attachments ──────────────────────────────────────────────────

#[test]
fn attachment_pair_is_unique() {
    let store = LocalStore::open_in_memory().unwrap();
    let f = store.insert_feature(42, &columns("A", None)).unwrap();
    store.insert_attachment(f.id, 7, &attachment("a.jpg")).unwrap();

    let err = store.insert_attachment(f.id, 7, &attachment("b.jpg")).unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");
}

#[test]
fn same_attachment_id_under_different_features() {
    let store = LocalStore::open_in_memory().unwrap();
    let a = store.insert_feature(1, &columns("A", None)).unwrap();
    let b = store.insert_feature(2, &columns("B", None)).unwrap();

    store.insert_attachment(a.id, 7, &attachment("a.jpg")).unwrap();
    store.insert_attachment(b.id, 7, &attachment("a.jpg")).unwrap();
    assert_eq!(store.count_attachments().unwrap(), 2);
}

#[test]
fn attachment_for_missing_feature_is_not_found() {
    let store = LocalStore::open_in_memory().unwrap();
    let err = store.insert_attachment(999, 7, &attachment("a.jpg")).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)), "got {err:?}");
}

#[test]
fn negative_attachment_size_is_rejected() {
    let store = LocalStore::open_in_memory().unwrap();
    let f = store.insert_feature(1, &columns("A", None)).unwrap();
    let mut cols = attachment("a.jpg");
    cols.size = -1;

    let err = store.insert_attachment(f.id, 7, &cols).unwrap_err();
    assert!(matches!(err, StorageError::Constraint(_)), "got {err:?}");
}

#[test]
fn update_attachment_replaces_fields_and_meta() {
    let store = LocalStore::open_in_memory().unwrap();
    let f = store.insert_feature(1, &columns("A", None)).unwrap();
    let row = store.insert_attachment(f.id, 7, &attachment("a.jpg")).unwrap();

    let mut cols = attachment("renamed.png");
    cols.mime_type = "image/png".into();
    cols.file_meta = json!(null);
    let updated = store.update_attachment(row.id, &cols).unwrap();

    assert_eq!(updated.columns, cols);
    let found = store.find_attachment(f.id, 7).unwrap().unwrap();
    assert_eq!(found.columns.name, "renamed.png");
    assert_eq!(found.columns.file_meta, json!(null));
}

#[test]
fn file_meta_survives_storage() {
    let store = LocalStore::open_in_memory().unwrap();
    let f = store.insert_feature(1, &columns("A", None)).unwrap();
    store.insert_attachment(f.id, 7, &attachment("a.jpg")).unwrap();

    let listed = store.list_attachments(f.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].columns.file_meta, json!({"exif": {"w": 10}}));
}

#[test]
fn delete_single_attachment() {
    let store = LocalStore::open_in_memory().unwrap();
    let f = store.insert_feature(1, &columns("A", None)).unwrap();
    store.insert_attachment(f.id, 7, &attachment("a.jpg")).unwrap();

    assert!(store.delete_attachment(f.id, 7).unwrap());
    assert!(!store.delete_attachment(f.id, 7).unwrap());
    assert_eq!(store.count_features().unwrap(), 1);
}

// ── Transactions ─────────────────────────────────────────────────

#[test]
fn write_transaction_commits_feature_with_attachments() {
    let store = LocalStore::open_in_memory().unwrap();
    let feature = store
        .write_transaction(|writer| {
            let feature = writer.insert_feature(42, &columns("Ivanov", None))?;
            writer.insert_attachment(feature.id, 7, &attachment("a.jpg"))?;
            Ok::<_, StorageError>(feature)
        })
        .unwrap();

    assert_eq!(store.get_feature(feature.id).unwrap(), feature);
    assert_eq!(store.list_attachments(feature.id).unwrap().len(), 1);
}

#[test]
fn failed_write_transaction_leaves_nothing_behind() {
    let store = LocalStore::open_in_memory().unwrap();
    let mut bad = attachment("bad.jpg");
    bad.size = -1;

    let err = store
        .write_transaction(|writer| {
            let feature = writer.insert_feature(42, &columns("Ivanov", None))?;
            writer.insert_attachment(feature.id, 7, &bad)?;
            Ok::<_, StorageError>(feature)
        })
        .unwrap_err();

    assert!(matches!(err, StorageError::Constraint(_)), "got {err:?}");
    assert_eq!(store.count_features().unwrap(), 0);
    assert_eq!(store.count_attachments().unwrap(), 0);
}

// ── Municipalities ───────────────────────────────────────────────

fn draft(name: &str) -> MunicipalityDraft {
    MunicipalityDraft {
        name: name.into(),
        geom: "POLYGON ((0 0, 1 0, 1 1, 0 0))".into(),
    }
}

#[test]
fn municipality_crud() {
    let store = LocalStore::open_in_memory().unwrap();
    let created = store.create_municipality(&draft("Orsk")).unwrap();

    assert_eq!(store.get_municipality(created.id).unwrap(), created);
    assert_eq!(store.list_municipalities().unwrap(), vec![created.clone()]);

    let updated = store
        .update_municipality(created.id, &draft("Novotroitsk"))
        .unwrap();
    assert_eq!(updated.name, "Novotroitsk");
    assert!(store.find_municipality_by_name("Orsk").unwrap().is_none());

    store.delete_municipality(created.id).unwrap();
    assert!(matches!(
        store.get_municipality(created.id),
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        store.delete_municipality(created.id),
        Err(StorageError::NotFound(_))
    ));
}

#[test]
fn municipality_name_is_unique() {
    let store = LocalStore::open_in_memory().unwrap();
    store.create_municipality(&draft("Orsk")).unwrap();
    let other = store.create_municipality(&draft("Gai")).unwrap();

    assert!(store.create_municipality(&draft("Orsk")).unwrap_err().is_conflict());
    assert!(store
        .update_municipality(other.id, &draft("Orsk"))
        .unwrap_err()
        .is_conflict());
}

#[test]
fn municipality_lookup_is_exact() {
    let store = LocalStore::open_in_memory().unwrap();
    store.create_municipality(&draft("Orsk")).unwrap();

    assert!(store.find_municipality_by_name("Orsk").unwrap().is_some());
    assert!(store.find_municipality_by_name("orsk").unwrap().is_none());
    assert!(store.find_municipality_by_name("Orsk ").unwrap().is_none());
}

// ── Audit ────────────────────────────────────────────────────────

#[test]
fn audit_rows_append_and_list_newest_first() {
    let store = LocalStore::open_in_memory().unwrap();
    for status in [200, 403] {
        store
            .append_operation(&OperationRecord {
                actor: "key-1".into(),
                operation: "POST /features/".into(),
                endpoint: "/features/".into(),
                method: "POST".into(),
                params: json!({"layer_id": "8863"}),
                status_code: Some(status),
            })
            .unwrap();
    }
    store
        .append_admin_log(&AdminLogRecord {
            actor: "unknown".into(),
            action: "DELETE /features/".into(),
            endpoint: "/features/".into(),
            method: "DELETE".into(),
            details: Some("query params: {}".into()),
        })
        .unwrap();

    let ops = store.list_operations(10).unwrap();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0].record.status_code, Some(403));
    assert_eq!(ops[1].record.params, json!({"layer_id": "8863"}));

    let logs = store.list_admin_logs(10).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].record.details.as_deref(), Some("query params: {}"));
}

// ── Persistence ──────────────────────────────────────────────────

#[test]
fn file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirror.db");

    {
        let store = LocalStore::open(&path).unwrap();
        store.insert_feature(42, &columns("A", None)).unwrap();
    }

    let store = LocalStore::open(&path).unwrap();
    let found = store.find_feature_by_external_id(42).unwrap().unwrap();
    assert_eq!(found.columns.fio.as_deref(), Some("A"));
}
