use super::ApiError;

/// The fixed set an expense category must come from.
pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Rent",
    "Utilities",
    "Salary",
    "Inventory",
    "Transport",
    "Food",
    "Office Supplies",
    "Phone",
    "Marketing",
    "Other",
];

pub fn validate_id(id: i32, resource: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, id
        )));
    }
    Ok(id)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ApiError::validation("Invalid email address"));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ApiError::validation("Invalid email address"));
    }
    Ok(trimmed)
}

/// OTP codes are exactly six digits; surrounding whitespace is forgiven.
pub fn validate_otp(otp: &str) -> Result<&str, ApiError> {
    let trimmed = otp.trim();
    if trimmed.len() != 6 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation("OTP must be a six-digit code"));
    }
    Ok(trimmed)
}

pub fn validate_expense_category(category: &str) -> Result<&str, ApiError> {
    if !EXPENSE_CATEGORIES.contains(&category) {
        return Err(ApiError::validation(format!(
            "Invalid expense category: {}. Must be one of: {}",
            category,
            EXPENSE_CATEGORIES.join(", ")
        )));
    }
    Ok(category)
}

pub fn validate_invoice_status(status: &str) -> Result<&str, ApiError> {
    const STATUSES: &[&str] = &["Paid", "Unpaid", "Pending", "Draft"];
    if !STATUSES.contains(&status) {
        return Err(ApiError::validation(format!(
            "Invalid invoice status: {}. Must be one of: {}",
            status,
            STATUSES.join(", ")
        )));
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_ids() {
        assert!(validate_id(0, "product").is_err());
        assert!(validate_id(-4, "party").is_err());
        assert_eq!(validate_id(12, "invoice").unwrap(), 12);
    }

    #[test]
    fn email_needs_local_domain_and_dot() {
        assert!(validate_email("nobody").is_err());
        assert!(validate_email("@x.com").is_err());
        assert!(validate_email("a@b").is_err());
        assert_eq!(validate_email(" a@b.co ").unwrap(), "a@b.co");
    }

    #[test]
    fn otp_is_trimmed_six_digits() {
        assert_eq!(validate_otp(" 000042 ").unwrap(), "000042");
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("12345a").is_err());
    }

    #[test]
    fn expense_category_comes_from_the_fixed_set() {
        assert!(validate_expense_category("Rent").is_ok());
        assert!(validate_expense_category("Gambling").is_err());
    }

    #[test]
    fn invoice_status_is_one_of_four() {
        assert!(validate_invoice_status("Draft").is_ok());
        assert!(validate_invoice_status("Overdue").is_err());
    }
}
