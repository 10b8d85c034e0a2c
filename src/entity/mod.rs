pub mod addresses;
pub mod audit_logs;
pub mod cart_items;
pub mod categories;
pub mod order_items;
pub mod orders;
pub mod payment_transactions;
pub mod platform_settings;
pub mod products;
pub mod users;
pub mod vouchers;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_transactions::Entity as PaymentTransactions;
pub use platform_settings::Entity as PlatformSettingsRow;
pub use products::Entity as Products;
pub use users::Entity as Users;
pub use vouchers::Entity as Vouchers;
