//! Record store integration tests.
//!
//! Exercises the generic CRUD store against file-backed tenant databases.

mod common;

use campus_persistence::entities::{
    BookPatch, BookStore, CategoryHeadStore, CustomerStaffStore, ItemDraft, ItemPatch, ItemStore,
    SupplierPatch, SupplierStore,
};
use campus_persistence::error::{ErrorKind, ResourceError, StorageError};

use common::*;

// ============================================================================
// Create Tests
// ============================================================================

#[tokio::test]
async fn test_create_item_returns_generated_id() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());

    let item = items
        .create(&tenant("school7"), &period("2024-25"), &notebook())
        .await
        .unwrap();

    assert!(item.meta.id > 0);
    assert_eq!(item.item_code, "BK01");
    assert_eq!(item.item_name, "Notebook");
    assert_eq!(item.purchase_rate.as_deref(), Some("50"));
    assert_eq!(item.meta.tenant_key.as_str(), "school7");
    assert_eq!(item.meta.period_key.as_str(), "2024-25");
    assert!(item.meta.updated_at.is_none());
}

#[tokio::test]
async fn test_duplicate_item_scenario() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    items.create(&t, &p, &notebook()).await.unwrap();
    assert_eq!(items.list(&t, &p).await.unwrap().len(), 1);

    let err = items
        .create(&t, &p, &ItemDraft::new("BK01", "Another notebook"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateEntity);
    match err {
        StorageError::Resource(ResourceError::Duplicate { entity, key }) => {
            assert_eq!(entity, "Item");
            assert_eq!(key, "BK01");
        }
        other => panic!("expected duplicate error, got {:?}", other),
    }

    let listed = items.list(&t, &p).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].item_name, "Notebook");
}

#[tokio::test]
async fn test_same_natural_key_in_other_period_is_allowed() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let t = tenant("school7");

    items.create(&t, &period("2024-25"), &notebook()).await.unwrap();
    items.create(&t, &period("2025-26"), &notebook()).await.unwrap();

    assert_eq!(items.list(&t, &period("2024-25")).await.unwrap().len(), 1);
    assert_eq!(items.list(&t, &period("2025-26")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_rejects_blank_required_field() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    let err = items
        .create(&t, &p, &ItemDraft::new("BK02", " "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = items
        .create(&t, &p, &ItemDraft::new("", "Pencil"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    assert!(items.list(&t, &p).await.unwrap().is_empty());
}

// ============================================================================
// List Tests
// ============================================================================

#[tokio::test]
async fn test_list_is_most_recent_first() {
    let harness = TestHarness::new();
    let books = BookStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    for name in ["Maths", "Science", "English"] {
        books.create(&t, &p, &book(name, 120.0)).await.unwrap();
    }

    let names: Vec<_> = books
        .list(&t, &p)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.book_name)
        .collect();
    assert_eq!(names, vec!["English", "Science", "Maths"]);
}

#[tokio::test]
async fn test_list_is_scoped_to_tenant_and_period() {
    let harness = TestHarness::new();
    let categories = CategoryHeadStore::new(harness.registry());

    categories
        .create(&tenant("school7"), &period("2024-25"), &category("Uniform"))
        .await
        .unwrap();
    categories
        .create(&tenant("school8"), &period("2024-25"), &category("Shoes"))
        .await
        .unwrap();

    let listed = categories
        .list(&tenant("school7"), &period("2024-25"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].category_name, "Uniform");

    assert!(
        categories
            .list(&tenant("school7"), &period("2023-24"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_list_on_fresh_tenant_is_empty() {
    let harness = TestHarness::new();
    let suppliers = SupplierStore::new(harness.registry());

    let listed = suppliers
        .list(&tenant("school9"), &period("2024-25"))
        .await
        .unwrap();
    assert!(listed.is_empty());
}

// ============================================================================
// Update Tests
// ============================================================================

#[tokio::test]
async fn test_update_item() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    let created = items.create(&t, &p, &notebook()).await.unwrap();
    let patch = ItemPatch {
        item_name: "Long notebook".to_string(),
        purchase_rate: Some("65".to_string()),
        unit: Some("pcs".to_string()),
        ..Default::default()
    };

    let updated = items.update(&t, created.meta.id, &patch).await.unwrap();
    assert_eq!(updated.meta.id, created.meta.id);
    assert_eq!(updated.item_code, "BK01");
    assert_eq!(updated.item_name, "Long notebook");
    assert_eq!(updated.purchase_rate.as_deref(), Some("65"));
    assert_eq!(updated.unit.as_deref(), Some("pcs"));
    assert_eq!(updated.meta.created_at, created.meta.created_at);
}

#[tokio::test]
async fn test_update_missing_id_is_not_found() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    items.create(&t, &p, &notebook()).await.unwrap();

    let patch = ItemPatch {
        item_name: "Ghost".to_string(),
        ..Default::default()
    };
    let err = items.update(&t, 999, &patch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "Item not found with id 999");

    let listed = items.list(&t, &p).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].item_name, "Notebook");
}

#[tokio::test]
async fn test_update_stamps_updated_at_when_tracked() {
    let harness = TestHarness::new();
    let customers = CustomerStaffStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    let created = customers.create(&t, &p, &customer("Ravi")).await.unwrap();
    assert!(created.meta.updated_at.is_none());

    let mut patch = customer("Ravi");
    patch.phone_number = Some("9000000000".to_string());
    let updated = customers.update(&t, created.meta.id, &patch).await.unwrap();

    assert_eq!(updated.phone_number.as_deref(), Some("9000000000"));
    let updated_at = updated.meta.updated_at.expect("updated_at stamped");
    assert!(updated_at >= created.meta.created_at);
}

#[tokio::test]
async fn test_update_into_existing_natural_key_is_duplicate() {
    let harness = TestHarness::new();
    let books = BookStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    books.create(&t, &p, &book("Maths", 120.0)).await.unwrap();
    let science = books.create(&t, &p, &book("Science", 150.0)).await.unwrap();

    let patch = BookPatch {
        book_name: "Maths".to_string(),
        amount: 99.0,
        category: None,
    };
    let err = books.update(&t, science.meta.id, &patch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateEntity);

    let unchanged = books.get(&t, science.meta.id).await.unwrap().unwrap();
    assert_eq!(unchanged.book_name, "Science");
    assert_eq!(unchanged.amount, 150.0);
}

#[tokio::test]
async fn test_update_does_not_reach_other_tenant() {
    let harness = TestHarness::new();
    let suppliers = SupplierStore::new(harness.registry());
    let p = period("2024-25");

    let created = suppliers
        .create(&tenant("school7"), &p, &supplier("SUP1"))
        .await
        .unwrap();
    suppliers
        .create(&tenant("school8"), &p, &supplier("SUP1"))
        .await
        .unwrap();

    let patch = SupplierPatch {
        supplier_name: "Renamed".to_string(),
        ..Default::default()
    };
    // Ids are per tenant database; the same id in school8 is a different row.
    let other = suppliers
        .update(&tenant("school8"), created.meta.id, &patch)
        .await
        .unwrap();
    assert_eq!(other.meta.tenant_key.as_str(), "school8");

    let original = suppliers
        .get(&tenant("school7"), created.meta.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(original.supplier_name, "Supplier SUP1");
}

// ============================================================================
// Delete Tests
// ============================================================================

#[tokio::test]
async fn test_delete_removes_exactly_one_row() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    let first = items.create(&t, &p, &notebook()).await.unwrap();
    let second = items
        .create(&t, &p, &ItemDraft::new("PN01", "Pen"))
        .await
        .unwrap();

    items.delete(&t, first.meta.id).await.unwrap();

    let listed = items.list(&t, &p).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].meta.id, second.meta.id);
    assert!(items.get(&t, first.meta.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_missing_id_is_not_found() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let t = tenant("school7");

    let err = items.delete(&t, 42).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let created = items.create(&t, &period("2024-25"), &notebook()).await.unwrap();
    items.delete(&t, created.meta.id).await.unwrap();
    let err = items.delete(&t, created.meta.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleted_natural_key_can_be_reused() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));

    let created = items.create(&t, &p, &notebook()).await.unwrap();
    items.delete(&t, created.meta.id).await.unwrap();

    let again = items.create(&t, &p, &notebook()).await.unwrap();
    assert!(again.meta.id > created.meta.id);
}

// ============================================================================
// Lock Timeout Tests
// ============================================================================

#[tokio::test]
async fn test_write_against_locked_database_is_resource_unavailable() {
    let harness = TestHarness::with_busy_timeout(100);
    let items = ItemStore::new(harness.registry());
    let (t, p) = (tenant("school7"), period("2024-25"));
    assert!(items.list(&t, &p).await.unwrap().is_empty());

    let lock = harness.hold_write_lock("school7");
    let err = items.create(&t, &p, &notebook()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceUnavailable);
    assert_eq!(err.kind().status_code(), 503);
    drop(lock);

    assert!(items.list(&t, &p).await.unwrap().is_empty());
    assert!(items.create(&t, &p, &notebook()).await.is_ok());
}

// ============================================================================
// Tenant Key Tests
// ============================================================================

#[tokio::test]
async fn test_malformed_tenant_is_invalid_input() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());

    let err = items
        .list(&tenant("../school7"), &period("2024-25"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(harness.registry.is_empty());
}

#[tokio::test]
async fn test_json_shape_is_camel_case() {
    let harness = TestHarness::new();
    let items = ItemStore::new(harness.registry());

    let item = items
        .create(&tenant("school7"), &period("2024-25"), &notebook())
        .await
        .unwrap();
    let json = serde_json::to_value(&item).unwrap();

    assert_eq!(json["itemCode"], "BK01");
    assert_eq!(json["purchaseRate"], "50");
    assert_eq!(json["tenantKey"], "school7");
    assert_eq!(json["periodKey"], "2024-25");
    assert!(json["id"].as_i64().unwrap() > 0);
    assert!(json.get("updatedAt").is_none());
}
