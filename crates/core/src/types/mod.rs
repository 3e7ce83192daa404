//! Domain types for the Shoplens ingestion and insights service.
//!
//! Every entity except [`Tenant`] is tenant-scoped and mirrored from a
//! Shopify store. The `(tenant_id, shopify_id)` pair is the natural key used
//! to detect "same record" across repeated syncs, independent of the locally
//! generated row id.

mod customer;
mod order;
mod product;
mod sync;
mod tenant;

pub use customer::{Customer, NewCustomer, display_name};
pub use order::{NewLineItem, NewOrder, Order, OrderLineItem};
pub use product::{NewProduct, Product};
pub use sync::{EntityOutcome, SyncOutcome, SyncReport};
pub use tenant::{DEMO_ACCESS_TOKEN, NewTenant, Tenant, TenantUpdate};
