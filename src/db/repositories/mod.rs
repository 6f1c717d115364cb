pub mod account;
pub mod expense;
pub mod invoice;
pub mod party;
pub mod product;
