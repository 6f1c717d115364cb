use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Counterparty kind. The string forms match what the API accepts and
/// what the `parties.category` column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyCategory {
    Customer,
    Supplier,
}

impl PartyCategory {
    /// Parse the wire form. Anything but the two exact tags is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Customer" => Some(Self::Customer),
            "Supplier" => Some(Self::Supplier),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Supplier => "Supplier",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerFields {
    pub name: String,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub customer_code: Option<String>,
    pub address: Option<String>,
    pub open_balance: Decimal,
    pub credit_limit: Decimal,
    pub preferred_payment_method: Option<String>,
    pub loyalty_points: i32,
    pub referred_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierFields {
    pub name: String,
    pub code: String,
}

/// A party's specialization: exactly one of customer or supplier.
///
/// The category tag is derived from the variant, so a specialization can never
/// disagree with the party row it is written alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PartySpec {
    Customer(CustomerFields),
    Supplier(SupplierFields),
}

impl PartySpec {
    #[must_use]
    pub const fn category(&self) -> PartyCategory {
        match self {
            Self::Customer(_) => PartyCategory::Customer,
            Self::Supplier(_) => PartyCategory::Supplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_accepts_exact_tags_only() {
        assert_eq!(PartyCategory::parse("Customer"), Some(PartyCategory::Customer));
        assert_eq!(PartyCategory::parse("Supplier"), Some(PartyCategory::Supplier));
        assert_eq!(PartyCategory::parse("customer"), None);
        assert_eq!(PartyCategory::parse("Vendor"), None);
        assert_eq!(PartyCategory::parse(""), None);
    }

    #[test]
    fn spec_category_matches_variant() {
        let spec = PartySpec::Supplier(SupplierFields {
            name: "Acme".to_string(),
            code: "SUP-1".to_string(),
        });
        assert_eq!(spec.category(), PartyCategory::Supplier);
        assert_eq!(spec.category().as_str(), "Supplier");
    }
}
