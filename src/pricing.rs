use rust_decimal::Decimal;

/// One cart line as seen by the pricing engine. Snapshots were captured when
/// the line was added to the cart; catalog changes after that point do not
/// leak into an order priced from this input.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub qty: i32,
    pub unit_price: Decimal,
    /// GST slab of the product's category; zero when the category is absent.
    pub gst_rate: Decimal,
    pub is_preorder: bool,
    pub deposit_snapshot: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub gst_amount: Decimal,
    pub full_gross: Decimal,
    pub discount_amount: Decimal,
    pub commission: Decimal,
    /// Amount charged now. Clamped at zero when the voucher exceeds the
    /// required payment; the excess voucher value is forfeited.
    pub deposit_amount: Decimal,
    /// Balance owed later, floored at zero.
    pub remaining_due: Decimal,
    pub is_preorder_order: bool,
}

// round_dp rounds half-to-even, the standard behaviour for currency fields.
fn round2(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

pub fn line_subtotal(qty: i32, unit_price: Decimal) -> Decimal {
    round2(Decimal::from(qty) * unit_price)
}

pub fn line_gst(subtotal: Decimal, gst_rate: Decimal) -> Decimal {
    round2(subtotal * gst_rate / Decimal::ONE_HUNDRED)
}

/// Amount payable now for a single line: the deposit for pre-order lines,
/// the full tax-inclusive price otherwise.
pub fn required_payment_for_line(line: &PricedLine) -> Decimal {
    if line.is_preorder {
        round2(line.deposit_snapshot * Decimal::from(line.qty))
    } else {
        let subtotal = line_subtotal(line.qty, line.unit_price);
        subtotal + line_gst(subtotal, line.gst_rate)
    }
}

/// Aggregate all monetary fields for an order. Pure; voucher redemption and
/// persistence are the orchestrator's concern.
pub fn order_totals(
    lines: &[PricedLine],
    voucher_value: Option<Decimal>,
    commission_rate: Decimal,
) -> OrderTotals {
    let mut subtotal = Decimal::ZERO;
    let mut gst_amount = Decimal::ZERO;
    let mut deposit_required = Decimal::ZERO;
    let mut is_preorder_order = false;

    for line in lines {
        let line_sub = line_subtotal(line.qty, line.unit_price);
        subtotal += line_sub;
        gst_amount += line_gst(line_sub, line.gst_rate);
        deposit_required += required_payment_for_line(line);
        is_preorder_order |= line.is_preorder;
    }

    let subtotal = round2(subtotal);
    let gst_amount = round2(gst_amount);
    let full_gross = subtotal + gst_amount;
    let discount_amount = round2(voucher_value.unwrap_or(Decimal::ZERO));

    let deposit_amount = round2((deposit_required - discount_amount).max(Decimal::ZERO));
    let remaining_due = round2((full_gross - deposit_amount).max(Decimal::ZERO));
    let commission = round2(subtotal * commission_rate / Decimal::ONE_HUNDRED);

    OrderTotals {
        subtotal,
        gst_amount,
        full_gross,
        discount_amount,
        commission,
        deposit_amount,
        remaining_due,
        is_preorder_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn standard_line(qty: i32, price: Decimal, gst: Decimal) -> PricedLine {
        PricedLine {
            qty,
            unit_price: price,
            gst_rate: gst,
            is_preorder: false,
            deposit_snapshot: price + line_gst(price, gst),
        }
    }

    fn preorder_line(qty: i32, price: Decimal, gst: Decimal, deposit: Decimal) -> PricedLine {
        PricedLine {
            qty,
            unit_price: price,
            gst_rate: gst,
            is_preorder: true,
            deposit_snapshot: deposit,
        }
    }

    #[test]
    fn line_math_handles_zero_rate_and_price() {
        assert_eq!(line_subtotal(3, Decimal::ZERO), dec!(0.00));
        assert_eq!(line_gst(dec!(100.00), Decimal::ZERO), dec!(0.00));
        assert_eq!(line_gst(dec!(100.00), dec!(18.00)), dec!(18.00));
    }

    #[test]
    fn standard_order_charges_full_gross_now() {
        // 2 x 100.00 at 18% GST: 200 / 36 / 236 due now, nothing later.
        let lines = vec![standard_line(2, dec!(100.00), dec!(18.00))];
        let totals = order_totals(&lines, None, dec!(5.00));

        assert_eq!(totals.subtotal, dec!(200.00));
        assert_eq!(totals.gst_amount, dec!(36.00));
        assert_eq!(totals.deposit_amount, dec!(236.00));
        assert_eq!(totals.remaining_due, dec!(0.00));
        assert_eq!(totals.commission, dec!(10.00));
        assert!(!totals.is_preorder_order);
    }

    #[test]
    fn no_voucher_invariant_holds_for_mixed_orders() {
        let lines = vec![
            standard_line(1, dec!(100.00), dec!(18.00)),
            preorder_line(1, dec!(400.00), dec!(12.00), dec!(50.00)),
        ];
        let totals = order_totals(&lines, None, dec!(5.00));

        assert_eq!(
            totals.deposit_amount + totals.remaining_due,
            totals.subtotal + totals.gst_amount
        );
    }

    #[test]
    fn preorder_split_charges_deposit_now() {
        // Standard line 100 @18% plus a pre-order line with deposit 50:
        // due now = 118 + 50, balance = full gross minus that.
        let lines = vec![
            standard_line(1, dec!(100.00), dec!(18.00)),
            preorder_line(1, dec!(400.00), dec!(12.00), dec!(50.00)),
        ];
        let totals = order_totals(&lines, None, dec!(5.00));

        assert_eq!(totals.deposit_amount, dec!(168.00));
        assert_eq!(totals.full_gross, dec!(566.00));
        assert_eq!(totals.remaining_due, dec!(398.00));
        assert!(totals.is_preorder_order);
    }

    #[test]
    fn voucher_reduces_amount_due_now() {
        let lines = vec![standard_line(2, dec!(100.00), dec!(18.00))];
        let totals = order_totals(&lines, Some(dec!(30.00)), dec!(5.00));

        assert_eq!(totals.discount_amount, dec!(30.00));
        assert_eq!(totals.deposit_amount, dec!(206.00));
    }

    #[test]
    fn oversized_voucher_clamps_deposit_to_zero() {
        // Adopted policy: a voucher larger than the amount due now clamps the
        // deposit at zero, it never produces a negative charge.
        let lines = vec![standard_line(2, dec!(100.00), dec!(18.00))];
        let totals = order_totals(&lines, Some(dec!(300.00)), dec!(5.00));

        assert_eq!(totals.discount_amount, dec!(300.00));
        assert_eq!(totals.deposit_amount, dec!(0.00));
        assert_eq!(totals.remaining_due, dec!(236.00));
    }

    #[test]
    fn rounding_is_half_even_per_field() {
        // 3 x 33.335 = 100.005, which banker's rounding takes down to 100.00.
        let lines = vec![standard_line(3, dec!(33.335), dec!(0.00))];
        let totals = order_totals(&lines, None, dec!(0.00));
        assert_eq!(totals.subtotal, dec!(100.00));
    }
}
