use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::trace;

use super::codes::TaxTypeCode;
use super::decimal::{checked_add, decimal, missing_field};
use super::element::Element;
use super::error::FacturaeError;

/// Parent elements whose `Tax` children can be aggregated.
pub const TAX_PARENTS: [&str; 2] = ["TaxesOutputs", "TaxesWithheld"];

/// Sum `Tax/TaxAmount/TotalAmount` below a `TaxesOutputs` or
/// `TaxesWithheld` element.
///
/// The sum is rounded half-to-even to the largest number of fractional
/// digits found among the amounts, so a three-decimal tax keeps the total
/// at three decimals. An empty collection, or one summing to zero, gives
/// exact zero.
///
/// ```
/// use facturae::core::*;
/// use rust_decimal_macros::dec;
///
/// let taxes = Element::new("TaxesOutputs").with_children(["12.21", "2.44", "3.233"].map(|a| {
///     Element::new("Tax").with_child(Element::new("TaxAmount").with_child(Element::leaf("TotalAmount", a)))
/// }));
/// let total = sum_tax_amount(&taxes).unwrap();
/// assert_eq!(total, dec!(17.883));
/// assert_eq!(total.scale(), 3);
/// ```
pub fn sum_tax_amount(parent: &Element) -> Result<Decimal, FacturaeError> {
    ensure_tax_parent(parent)?;

    let amounts = parent
        .find_all("Tax")
        .map(|tax| decimal(tax, "TaxAmount/TotalAmount"))
        .collect::<Result<Vec<_>, _>>()?;
    let total = sum_to_max_scale(amounts)?;

    trace!(parent = parent.tag(), %total, "summed tax amounts");
    Ok(total)
}

/// Exact sum of `amounts`, rounded half-to-even to the largest scale among
/// them. Zero comes back as `Decimal::ZERO` whatever the input scales.
pub fn sum_to_max_scale(
    amounts: impl IntoIterator<Item = Decimal>,
) -> Result<Decimal, FacturaeError> {
    let mut num_decimals = 0;
    let mut sum = Decimal::ZERO;
    for amount in amounts {
        num_decimals = num_decimals.max(amount.scale());
        sum = checked_add(sum, amount)?;
    }

    let rounded = sum.round_dp_with_strategy(num_decimals, RoundingStrategy::MidpointNearestEven);
    if rounded.is_zero() {
        Ok(Decimal::ZERO)
    } else {
        Ok(rounded)
    }
}

/// Check every `Tax` below a `TaxesOutputs` / `TaxesWithheld` element:
/// its `TaxTypeCode` must be `expected`, and
/// `TaxableBase/TotalAmount × TaxRate / 100` must equal
/// `TaxAmount/TotalAmount` exactly.
pub fn validate_taxes(parent: &Element, expected: TaxTypeCode) -> Result<(), FacturaeError> {
    ensure_tax_parent(parent)?;

    for (index, tax) in parent.find_all("Tax").enumerate() {
        let location = format!("{}/Tax[{}]", parent.tag(), index + 1);

        let code = tax
            .text_at("TaxTypeCode")
            .ok_or_else(|| missing_field(tax, "TaxTypeCode"))?
            .trim();
        if code != expected.code() {
            return Err(FacturaeError::Validation(format!(
                "{location}: tax type code {code} is not {} ({})",
                expected.code(),
                expected.name()
            )));
        }

        let base = decimal(tax, "TaxableBase/TotalAmount")?;
        let rate = decimal(tax, "TaxRate")?;
        let amount = decimal(tax, "TaxAmount/TotalAmount")?;

        let computed = rate
            .checked_div(dec!(100))
            .and_then(|r| base.checked_mul(r))
            .ok_or_else(|| {
                FacturaeError::Arithmetic(format!("{location}: overflow computing {base} × {rate}%"))
            })?;
        if computed != amount {
            return Err(FacturaeError::Validation(format!(
                "{location}: tax amount {amount} is not taxable base {base} × {rate}% = {computed}"
            )));
        }
    }

    Ok(())
}

/// Strict check of the invoice's `TaxesOutputs` (or `TaxesWithheld`)
/// entries. An absent collection has nothing to check.
pub fn validate_invoice_tax_entries(
    invoice: &Element,
    parent_tag: &str,
    expected: TaxTypeCode,
) -> Result<(), FacturaeError> {
    match invoice.find(parent_tag) {
        Some(parent) => validate_taxes(parent, expected),
        None => Ok(()),
    }
}

fn ensure_tax_parent(parent: &Element) -> Result<(), FacturaeError> {
    if TAX_PARENTS.contains(&parent.tag()) {
        Ok(())
    } else {
        Err(FacturaeError::InvalidArgument(format!(
            "parent element must be one of {TAX_PARENTS:?}, got \"{}\"",
            parent.tag()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tax(code: &str, rate: &str, base: &str, amount: &str) -> Element {
        Element::new("Tax")
            .with_child(Element::leaf("TaxTypeCode", code))
            .with_child(Element::leaf("TaxRate", rate))
            .with_child(Element::new("TaxableBase").with_child(Element::leaf("TotalAmount", base)))
            .with_child(Element::new("TaxAmount").with_child(Element::leaf("TotalAmount", amount)))
    }

    fn taxes(tag: &str, amounts: &[&str]) -> Element {
        Element::new(tag).with_children(amounts.iter().map(|a| tax("01", "21.00", "0", a)))
    }

    #[test]
    fn sums_at_two_decimals() {
        let total = sum_tax_amount(&taxes("TaxesOutputs", &["12.21", "2.44", "3.23"])).unwrap();
        assert_eq!(total, dec!(17.88));
        assert_eq!(total.scale(), 2);
    }

    #[test]
    fn finest_precision_wins() {
        let total = sum_tax_amount(&taxes("TaxesOutputs", &["12.21", "2.44", "3.233"])).unwrap();
        assert_eq!(total, dec!(17.883));
        assert_ne!(total, dec!(17.88));
    }

    #[test]
    fn withheld_parent_accepted() {
        let total = sum_tax_amount(&taxes("TaxesWithheld", &["12.21", "2.44", "3.23"])).unwrap();
        assert_eq!(total, dec!(17.88));
    }

    #[test]
    fn wrong_parent_rejected() {
        let err = sum_tax_amount(&taxes("Invoices", &["1.00"])).unwrap_err();
        assert!(matches!(err, FacturaeError::InvalidArgument(_)));
        assert!(err.to_string().contains("TaxesOutputs"));
        assert!(err.to_string().contains("TaxesWithheld"));
    }

    #[test]
    fn empty_collection_is_zero() {
        let total = sum_tax_amount(&Element::new("TaxesWithheld")).unwrap();
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(total.scale(), 0);
    }

    #[test]
    fn cancelling_amounts_are_exact_zero() {
        let total = sum_tax_amount(&taxes("TaxesOutputs", &["5.25", "-5.250"])).unwrap();
        assert_eq!(total.scale(), 0);
        assert!(total.is_zero());
    }

    #[test]
    fn missing_tax_amount() {
        let parent = Element::new("TaxesOutputs").with_child(Element::new("Tax"));
        assert!(matches!(
            sum_tax_amount(&parent),
            Err(FacturaeError::MissingField { .. })
        ));
    }

    #[test]
    fn sum_keeps_max_scale() {
        let total = sum_to_max_scale([dec!(0.125), dec!(0.0)]).unwrap();
        assert_eq!((total, total.scale()), (dec!(0.125), 3));
        let total = sum_to_max_scale([dec!(1.5), dec!(1.05)]).unwrap();
        assert_eq!((total, total.scale()), (dec!(2.55), 2));
    }

    #[test]
    fn strict_check_accepts_exact_tax() {
        let parent = Element::new("TaxesOutputs").with_child(tax("01", "21.00", "100.00", "21.00"));
        assert!(validate_taxes(&parent, TaxTypeCode::Iva).is_ok());
    }

    #[test]
    fn strict_check_rejects_wrong_amount() {
        let parent = Element::new("TaxesOutputs").with_child(tax("01", "21.00", "100.00", "21.01"));
        let err = validate_taxes(&parent, TaxTypeCode::Iva).unwrap_err();
        assert!(matches!(err, FacturaeError::Validation(_)));
        assert!(err.to_string().contains("TaxesOutputs/Tax[1]"));
    }

    #[test]
    fn strict_check_rejects_wrong_type_code() {
        let parent = Element::new("TaxesWithheld").with_child(tax("01", "15.00", "100.00", "15.00"));
        let err = validate_taxes(&parent, TaxTypeCode::Irpf).unwrap_err();
        assert!(err.to_string().contains("IRPF"));
    }

    #[test]
    fn strict_check_on_absent_collection() {
        let invoice = Element::new("Invoice");
        assert!(validate_invoice_tax_entries(&invoice, "TaxesWithheld", TaxTypeCode::Irpf).is_ok());
    }
}
