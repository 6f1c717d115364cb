pub mod prelude;

pub mod accounts;
pub mod categories;
pub mod customers;
pub mod expenses;
pub mod invoice_items;
pub mod invoices;
pub mod parties;
pub mod password_reset_otps;
pub mod products;
pub mod profiles;
pub mod supplier_infos;
pub mod suppliers;
