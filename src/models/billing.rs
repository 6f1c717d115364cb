use rust_decimal::Decimal;

/// Invoice-level totals derived from line totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub sub_total: Decimal,
    pub total_amount: Decimal,
}

/// Line total is a flat quantity × rate. The per-line discount and tax
/// percentages are recorded on the line but not folded in here.
#[must_use]
pub fn line_total(quantity: i32, rate: Decimal) -> Decimal {
    Decimal::from(quantity) * rate
}

/// Roll line totals up into the invoice summary: subtotal is the plain
/// sum, total subtracts the invoice-level discount and adds the
/// invoice-level tax. Pure, so recomputing is idempotent by
/// construction.
#[must_use]
pub fn compute_totals<I>(line_totals: I, discount: Decimal, tax: Decimal) -> InvoiceTotals
where
    I: IntoIterator<Item = Decimal>,
{
    let sub_total: Decimal = line_totals.into_iter().sum();
    InvoiceTotals {
        sub_total,
        total_amount: sub_total - discount + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn line_total_is_flat_quantity_times_rate() {
        assert_eq!(line_total(2, dec("100.00")), dec("200.00"));
        assert_eq!(line_total(1, dec("50.00")), dec("50.00"));
        assert_eq!(line_total(0, dec("99.99")), dec("0.00"));
    }

    #[test]
    fn totals_match_reference_scenario() {
        // Lines (qty=2, rate=100.00) and (qty=1, rate=50.00),
        // discount 10.00, tax 5.00.
        let lines = vec![line_total(2, dec("100.00")), line_total(1, dec("50.00"))];
        let totals = compute_totals(lines, dec("10.00"), dec("5.00"));

        assert_eq!(totals.sub_total, dec("250.00"));
        assert_eq!(totals.total_amount, dec("245.00"));
    }

    #[test]
    fn recompute_is_idempotent() {
        let lines = || vec![dec("200.00"), dec("50.00")];
        let first = compute_totals(lines(), dec("10.00"), dec("5.00"));
        let second = compute_totals(lines(), dec("10.00"), dec("5.00"));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_line_set_yields_zero_subtotal() {
        let totals = compute_totals(std::iter::empty(), dec("0.00"), dec("0.00"));
        assert_eq!(totals.sub_total, Decimal::ZERO);
        assert_eq!(totals.total_amount, Decimal::ZERO);
    }
}
