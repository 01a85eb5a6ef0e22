//! Entity catalogue.
//!
//! | Entity | Table | Natural key |
//! |--------|-------|-------------|
//! | [`Book`] | `books` | `book_name` |
//! | [`Item`] | `items` | `item_code` |
//! | [`Supplier`] | `suppliers` | `supplier_code` |
//! | [`CategoryHead`] | `categories` | `category_name` |
//! | [`CustomerStaff`] | `customer_staff` | `customer_staff_name` |
//! | [`BookSetupClass`] | `book_setup_classes` | `standard`, `book_id` |
//!
//! Every natural key is unique per tenant and period. `BookSetupClass` rows
//! are written only through
//! [`CompositeAggregateStore`](crate::store::CompositeAggregateStore).

mod book;
mod book_setup_class;
mod category_head;
mod customer_staff;
mod item;
mod supplier;

use crate::schema::SchemaDefinition;
use crate::store::RecordStore;

pub use book::{Book, BookDraft, BookPatch};
pub use book_setup_class::BookSetupClass;
pub use category_head::{CategoryHead, CategoryHeadDraft, CategoryHeadPatch};
pub use customer_staff::{CustomerStaff, CustomerStaffDraft, CustomerStaffPatch};
pub use item::{Item, ItemDraft, ItemPatch};
pub use supplier::{Supplier, SupplierDraft, SupplierPatch};

/// Store for [`Book`] records.
pub type BookStore = RecordStore<Book>;
/// Store for [`Item`] records.
pub type ItemStore = RecordStore<Item>;
/// Store for [`Supplier`] records.
pub type SupplierStore = RecordStore<Supplier>;
/// Store for [`CategoryHead`] records.
pub type CategoryHeadStore = RecordStore<CategoryHead>;
/// Store for [`CustomerStaff`] records.
pub type CustomerStaffStore = RecordStore<CustomerStaff>;

static CATALOGUE: [&SchemaDefinition; 6] = [
    &book::SCHEMA,
    &item::SCHEMA,
    &supplier::SCHEMA,
    &category_head::SCHEMA,
    &customer_staff::SCHEMA,
    &book_setup_class::SCHEMA,
];

/// Returns the schema of every entity kind.
pub fn catalogue() -> &'static [&'static SchemaDefinition] {
    &CATALOGUE
}
