pub use super::accounts::Entity as Accounts;
pub use super::categories::Entity as Categories;
pub use super::customers::Entity as Customers;
pub use super::expenses::Entity as Expenses;
pub use super::invoice_items::Entity as InvoiceItems;
pub use super::invoices::Entity as Invoices;
pub use super::parties::Entity as Parties;
pub use super::password_reset_otps::Entity as PasswordResetOtps;
pub use super::products::Entity as Products;
pub use super::profiles::Entity as Profiles;
pub use super::supplier_infos::Entity as SupplierInfos;
pub use super::suppliers::Entity as Suppliers;
