pub mod billing;
pub mod party;

pub use billing::{InvoiceTotals, compute_totals, line_total};
pub use party::{CustomerFields, PartyCategory, PartySpec, SupplierFields};
