//! Facturae reader tests against realistic documents.
//!
//! Run with: `cargo test --features xml --test parser_tests`

#![cfg(feature = "xml")]

use std::path::Path;

use chrono::NaiveDate;
use facturae::core::*;
use facturae::xml::*;
use rust_decimal_macros::dec;

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

fn document() -> FacturaeDocument {
    FacturaeDocument::from_xml(&fixture("facturae_3_2_2.xml")).unwrap()
}

fn with_replaced(from: &str, to: &str) -> FacturaeDocument {
    let xml = fixture("facturae_3_2_2.xml");
    assert!(xml.contains(from), "fixture has no {from}");
    FacturaeDocument::from_xml(&xml.replacen(from, to, 1)).unwrap()
}

fn rule_of(result: Result<(), FacturaeError>) -> Rule {
    match result {
        Err(FacturaeError::Accountant(a)) => a.rule,
        other => panic!("expected accountant error, got {other:?}"),
    }
}

// --- Reading ---

#[test]
fn header_and_batch() {
    let summary = document().summary().unwrap();
    assert_eq!(summary.schema_version, SchemaVersion::V3_2_2);
    assert_eq!(summary.modality, Some(Modality::Single));
    assert_eq!(summary.issuer_type, Some(InvoiceIssuerType::Seller));

    let batch = summary.batch.unwrap();
    assert_eq!(batch.identifier.as_deref(), Some("B12345678F-2024-0042"));
    assert_eq!(batch.invoices_count, Some(1));
    assert_eq!(batch.total_invoices_amount, Some(dec!(675.20)));
    assert_eq!(batch.total_executable_amount, Some(dec!(675.20)));
    assert_eq!(batch.invoice_currency_code.as_deref(), Some("EUR"));
}

#[test]
fn parties() {
    let summary = document().summary().unwrap();
    let seller = summary.seller.unwrap();
    assert_eq!(seller.person_type, Some(PersonTypeCode::Juridical));
    assert_eq!(seller.residence_type, Some(ResidenceTypeCode::Resident));
    assert_eq!(seller.tax_identification_number.as_deref(), Some("B12345678"));
    assert_eq!(seller.name.as_deref(), Some("Desarrollos Mediterráneo S.L."));
    assert_eq!(seller.trade_name.as_deref(), Some("DesMed"));
    let address = seller.address.unwrap();
    assert_eq!(address.post_code.as_deref(), Some("08008"));
    assert_eq!(address.country_code.as_deref(), Some("ESP"));

    let buyer = summary.buyer.unwrap();
    assert_eq!(buyer.tax_identification_number.as_deref(), Some("P0801900B"));
    assert_eq!(buyer.trade_name, None);
}

#[test]
fn invoice_fields() {
    let summary = document().summary().unwrap();
    assert_eq!(summary.invoices.len(), 1);
    let invoice = &summary.invoices[0];

    assert_eq!(invoice.number.as_deref(), Some("2024-0042"));
    assert_eq!(invoice.series_code.as_deref(), Some("A"));
    assert_eq!(invoice.document_type, Some(InvoiceDocumentType::Complete));
    assert_eq!(invoice.class, Some(InvoiceClass::Original));
    assert_eq!(invoice.issue_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    assert_eq!(invoice.tax_currency_code.as_deref(), Some("EUR"));

    assert_eq!(invoice.taxes_outputs.len(), 1);
    assert_eq!(invoice.taxes_outputs[0].type_code, Some(TaxTypeCode::Iva));
    assert_eq!(invoice.taxes_outputs[0].amount, Some(dec!(130.20)));
    assert_eq!(invoice.taxes_withheld[0].type_code, Some(TaxTypeCode::Irpf));

    let totals = invoice.totals.as_ref().unwrap();
    assert_eq!(totals.gross_amount, Some(dec!(620.00)));
    assert_eq!(totals.invoice_total, Some(dec!(675.20)));

    assert_eq!(invoice.lines.len(), 2);
    assert_eq!(invoice.lines[0].quantity, Some(dec!(10.0)));
    assert_eq!(invoice.lines[0].taxes_outputs[0].amount, Some(dec!(105.00)));
    assert_eq!(invoice.lines[1].description.as_deref(), Some("Alojamiento web anual"));

    let installment = &invoice.installments[0];
    assert_eq!(installment.due_date, NaiveDate::from_ymd_opt(2024, 4, 14));
    assert_eq!(installment.payment_means, Some(PaymentMeans::CreditTransfer));
    assert_eq!(installment.iban.as_deref(), Some("ES9121000418450200051332"));
    assert_eq!(installment.bic.as_deref(), Some("CAIXESBBXXX"));

    assert_eq!(invoice.attachments[0].format.as_deref(), Some("pdf"));
    assert_eq!(
        invoice.additional_information.as_deref(),
        Some("Contrato 2024/017 & anexo I")
    );
}

#[test]
fn equivalence_surcharge_tax_is_read() {
    let doc = with_replaced(
        "<TaxesOutputs>",
        "<TaxesOutputs>\
         <Tax><TaxTypeCode>17</TaxTypeCode><TaxRate>5.20</TaxRate>\
         <TaxableBase><TotalAmount>100.00</TotalAmount></TaxableBase>\
         <TaxAmount><TotalAmount>5.20</TotalAmount></TaxAmount></Tax>",
    );
    let summary = doc.summary().unwrap();
    let taxes = &summary.invoices[0].taxes_outputs;
    assert_eq!(taxes.len(), 2);
    assert_eq!(taxes[0].type_code, Some(TaxTypeCode::ReIva));
    assert_eq!(taxes[0].amount, Some(dec!(5.20)));
    assert_eq!(taxes[1].type_code, Some(TaxTypeCode::Iva));
}

#[test]
fn scale_is_kept_through_parsing() {
    let doc = document();
    let line = doc.invoices().next().unwrap().find("Items").unwrap().find("InvoiceLine").unwrap();
    let cost = decimal(line, "TotalCost").unwrap();
    assert_eq!(cost, dec!(500));
    assert_eq!(decimal_places(&cost), 6);
}

#[test]
fn individual_and_overseas_parties() {
    let doc = FacturaeDocument::from_xml(&fixture("KO_tax_currency_3_2_1.xml")).unwrap();
    let summary = doc.summary().unwrap();
    assert_eq!(summary.schema_version, SchemaVersion::V3_2_1);
    assert_eq!(summary.modality, Some(Modality::Batch));
    let seller = summary.seller.unwrap();
    assert_eq!(seller.person_type, Some(PersonTypeCode::Physical));
    assert_eq!(seller.name.as_deref(), Some("Lucía Fernández Ruiz"));
    let buyer = summary.buyer.unwrap();
    assert_eq!(buyer.residence_type, Some(ResidenceTypeCode::EuResident));
    assert_eq!(buyer.address.unwrap().town.as_deref(), Some("75004 Paris"));
    assert_eq!(summary.invoices.len(), 2);
}

#[test]
fn summary_serializes() {
    let summary = document().summary().unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["batch"]["total_invoices_amount"], "675.20");
    assert_eq!(json["invoices"][0]["issue_date"], "2024-03-15");
}

#[test]
fn write_and_read_back() {
    let doc = document();
    let xml = doc.to_xml().unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<fe:Facturae xmlns:ds="));
    let again = FacturaeDocument::from_xml(&xml).unwrap();
    assert_eq!(again, doc);
}

// --- Validation of parsed documents ---

#[test]
fn reconciled_document_passes() {
    document().validate(&ValidationOptions::default()).unwrap();
}

#[test]
fn strict_taxes_pass_on_fixture() {
    document()
        .validate(&ValidationOptions::default().strict_taxes(true))
        .unwrap();
}

#[test]
fn gross_amount_mismatch() {
    let doc = with_replaced(
        "<TotalGrossAmount>620.00</TotalGrossAmount>",
        "<TotalGrossAmount>619.99</TotalGrossAmount>",
    );
    assert_eq!(rule_of(doc.validate(&ValidationOptions::default())), Rule::GrossAmount);
}

#[test]
fn tax_output_mismatch() {
    let doc = with_replaced(
        "<TotalTaxOutputs>130.20</TotalTaxOutputs>",
        "<TotalTaxOutputs>130.21</TotalTaxOutputs>",
    );
    assert_eq!(rule_of(doc.validate(&ValidationOptions::default())), Rule::TaxOutputs);
}

#[test]
fn tax_withheld_mismatch() {
    let doc = with_replaced(
        "<TotalTaxesWithheld>75.00</TotalTaxesWithheld>",
        "<TotalTaxesWithheld>75.01</TotalTaxesWithheld>",
    );
    assert_eq!(rule_of(doc.validate(&ValidationOptions::default())), Rule::TaxesWithheld);
}

#[test]
fn invoice_total_mismatch() {
    let doc = with_replaced(
        "<InvoiceTotal>675.20</InvoiceTotal>",
        "<InvoiceTotal>675.21</InvoiceTotal>",
    );
    let invoice = doc.invoices().next().unwrap();
    assert_eq!(rule_of(validate_invoice_total(invoice)), Rule::InvoiceTotal);
    assert_eq!(rule_of(validate_total_outstanding_amount(invoice)), Rule::OutstandingAmount);
    assert_eq!(rule_of(doc.validate(&ValidationOptions::default())), Rule::InvoiceTotal);
}

#[test]
fn executable_amount_mismatch_can_be_disabled() {
    let doc = with_replaced(
        "<TotalExecutableAmount>675.20</TotalExecutableAmount>\n      </InvoiceTotals>",
        "<TotalExecutableAmount>600.00</TotalExecutableAmount>\n      </InvoiceTotals>",
    );
    assert_eq!(
        rule_of(doc.validate(&ValidationOptions::default())),
        Rule::ExecutableAmount
    );
    doc.validate(&ValidationOptions::default().executable_amount(false))
        .unwrap();
}

#[test]
fn tax_currency_fails_on_second_invoice() {
    let doc = FacturaeDocument::from_xml(&fixture("KO_tax_currency_3_2_1.xml")).unwrap();
    let err = doc.validate(&ValidationOptions::default()).unwrap_err();
    let a = err.as_accountant().unwrap();
    assert_eq!(a.rule, Rule::TaxCurrency);
    assert_eq!(a.invoice_number.as_deref(), Some("L-7-2"));

    let results: Vec<_> = doc.invoices().map(validate_tax_currency_code).collect();
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn strict_taxes_catch_wrong_withholding_type() {
    let doc = with_replaced("<TaxTypeCode>04</TaxTypeCode>", "<TaxTypeCode>05</TaxTypeCode>");
    doc.validate(&ValidationOptions::default()).unwrap();
    let err = doc
        .validate(&ValidationOptions::default().strict_taxes(true))
        .unwrap_err();
    assert!(matches!(err, FacturaeError::Validation(_)));
    assert!(err.to_string().contains("TaxesWithheld/Tax[1]"));
}

#[test]
fn malformed_amount_is_not_a_mismatch() {
    let doc = with_replaced(
        "<TotalGrossAmount>620.00</TotalGrossAmount>",
        "<TotalGrossAmount>620,00</TotalGrossAmount>",
    );
    let err = doc.validate(&ValidationOptions::default()).unwrap_err();
    assert!(!err.is_accountant());
    assert_eq!(
        err.to_string(),
        "invalid decimal in InvoiceTotals/TotalGrossAmount: '620,00'"
    );
}

// --- Errors ---

#[test]
fn missing_schema_version() {
    let doc = with_replaced("<SchemaVersion>3.2.2</SchemaVersion>", "");
    assert!(matches!(doc.schema_version(), Err(FacturaeError::VersionNotFound(_))));
    // Validation does not depend on the header.
    doc.validate(&ValidationOptions::default()).unwrap();
}

#[test]
fn truncated_document() {
    let xml = fixture("facturae_3_2_2.xml");
    let mut cut = xml.len() / 2;
    while !xml.is_char_boundary(cut) {
        cut -= 1;
    }
    assert!(matches!(FacturaeDocument::from_xml(&xml[..cut]), Err(FacturaeError::Xml(_))));
}
