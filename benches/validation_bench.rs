use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use facturae::core::*;
use facturae::xml::{FacturaeDocument, parse_element};

fn build_invoice(number: &str, lines: usize) -> Element {
    let mut builder = InvoiceBuilder::new(number);
    let mut gross = Decimal::ZERO;
    for i in 1..=lines {
        let amount = Decimal::new(100 * (20 + i as i64), 2);
        gross += amount;
        builder = builder.add_line(format!("Artículo {i}"), amount);
    }
    let iva = (gross * dec!(0.21)).round_dp(2);
    let irpf = (gross * dec!(0.15)).round_dp(2);
    builder
        .add_tax_output(TaxEntry::new(TaxTypeCode::Iva, dec!(21.00), gross, iva))
        .add_tax_withheld(TaxEntry::new(TaxTypeCode::Irpf, dec!(15.00), gross, irpf))
        .build()
        .unwrap()
}

fn build_batch(invoices: usize, lines: usize) -> FacturaeDocument {
    let root = Element::new("Facturae")
        .with_child(
            Element::new("FileHeader")
                .with_child(Element::leaf("SchemaVersion", "3.2.2"))
                .with_child(Element::leaf("Modality", "L"))
                .with_child(Element::leaf("InvoiceIssuerType", "EM")),
        )
        .with_child(
            Element::new("Invoices")
                .with_children((1..=invoices).map(|n| build_invoice(&format!("BENCH-{n:04}"), lines))),
        );
    FacturaeDocument::from_element(root).unwrap()
}

fn bench_validate_10_lines(c: &mut Criterion) {
    let invoice = build_invoice("BENCH-0001", 10);
    c.bench_function("validate_invoice_10_lines", |b| {
        b.iter(|| black_box(validate_invoice(black_box(&invoice))));
    });
}

fn bench_validate_strict_1000_lines(c: &mut Criterion) {
    let invoice = build_invoice("BENCH-0001", 1000);
    let validator = InvoiceValidator::new(&ValidationOptions::default().strict_taxes(true));
    c.bench_function("validate_strict_1000_lines", |b| {
        b.iter(|| black_box(validator.validate(black_box(&invoice))));
    });
}

fn bench_sum_tax_amount(c: &mut Criterion) {
    let taxes = Element::new("TaxesOutputs").with_children((0..100).map(|i| {
        TaxEntry::new(TaxTypeCode::Iva, dec!(21.00), dec!(100.00), Decimal::new(2100 + i, 2)).to_element()
    }));
    c.bench_function("sum_tax_amount_100", |b| {
        b.iter(|| black_box(sum_tax_amount(black_box(&taxes))));
    });
}

fn bench_parse_batch(c: &mut Criterion) {
    let xml = build_batch(100, 10).to_xml().unwrap();
    c.bench_function("parse_batch_100_invoices", |b| {
        b.iter(|| black_box(parse_element(black_box(&xml))));
    });
}

fn bench_parse_and_validate_batch(c: &mut Criterion) {
    let xml = build_batch(100, 10).to_xml().unwrap();
    let options = ValidationOptions::default();
    c.bench_function("parse_and_validate_batch_100_invoices", |b| {
        b.iter(|| {
            let doc = FacturaeDocument::from_xml(black_box(&xml)).unwrap();
            black_box(doc.validate(&options))
        });
    });
}

fn bench_summary(c: &mut Criterion) {
    let doc = build_batch(100, 10);
    c.bench_function("summary_batch_100_invoices", |b| {
        b.iter(|| black_box(doc.summary()));
    });
}

criterion_group!(
    benches,
    bench_validate_10_lines,
    bench_validate_strict_1000_lines,
    bench_sum_tax_amount,
    bench_parse_batch,
    bench_parse_and_validate_batch,
    bench_summary,
);
criterion_main!(benches);
