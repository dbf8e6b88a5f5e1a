//! Typed digest of a Facturae document.
//!
//! Every field is optional: a summary describes what the document
//! declares and never fails because something is absent. A value that is
//! present but malformed (a bad decimal, date or code) is an error.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    Element, FacturaeError, InvoiceClass, InvoiceDocumentType, InvoiceIssuerType, Modality,
    PaymentMeans, PersonTypeCode, ResidenceTypeCode, SchemaVersion, TaxTypeCode, optional_decimal,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacturaeSummary {
    pub schema_version: SchemaVersion,
    pub modality: Option<Modality>,
    pub issuer_type: Option<InvoiceIssuerType>,
    pub batch: Option<BatchSummary>,
    pub seller: Option<PartySummary>,
    pub buyer: Option<PartySummary>,
    pub invoices: Vec<InvoiceSummary>,
}

/// `FileHeader/Batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub identifier: Option<String>,
    pub invoices_count: Option<u32>,
    pub total_invoices_amount: Option<Decimal>,
    pub total_outstanding_amount: Option<Decimal>,
    pub total_executable_amount: Option<Decimal>,
    pub invoice_currency_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySummary {
    pub person_type: Option<PersonTypeCode>,
    pub residence_type: Option<ResidenceTypeCode>,
    pub tax_identification_number: Option<String>,
    /// `CorporateName` of a legal entity, or name and surnames of an
    /// individual.
    pub name: Option<String>,
    pub trade_name: Option<String>,
    pub address: Option<AddressSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSummary {
    pub street: Option<String>,
    pub post_code: Option<String>,
    pub town: Option<String>,
    pub province: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub number: Option<String>,
    pub series_code: Option<String>,
    pub document_type: Option<InvoiceDocumentType>,
    pub class: Option<InvoiceClass>,
    pub issue_date: Option<NaiveDate>,
    pub invoice_currency_code: Option<String>,
    pub tax_currency_code: Option<String>,
    pub language: Option<String>,
    pub taxes_outputs: Vec<TaxSummary>,
    pub taxes_withheld: Vec<TaxSummary>,
    pub totals: Option<TotalsSummary>,
    pub lines: Vec<LineSummary>,
    pub installments: Vec<InstallmentSummary>,
    pub attachments: Vec<AttachmentSummary>,
    pub additional_information: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub type_code: Option<TaxTypeCode>,
    pub rate: Option<Decimal>,
    pub taxable_base: Option<Decimal>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsSummary {
    pub gross_amount: Option<Decimal>,
    pub gross_amount_before_taxes: Option<Decimal>,
    pub tax_outputs: Option<Decimal>,
    pub taxes_withheld: Option<Decimal>,
    pub invoice_total: Option<Decimal>,
    pub outstanding_amount: Option<Decimal>,
    pub executable_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSummary {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price_without_tax: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub gross_amount: Option<Decimal>,
    pub taxes_outputs: Vec<TaxSummary>,
}

/// `PaymentDetails/Installment`, with the account to be debited or
/// credited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentSummary {
    pub due_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub payment_means: Option<PaymentMeans>,
    pub iban: Option<String>,
    pub bic: Option<String>,
}

/// `AdditionalData/RelatedDocuments/Attachment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentSummary {
    pub compression_algorithm: Option<String>,
    pub format: Option<String>,
    pub encoding: Option<String>,
    pub data: Option<String>,
}

impl FacturaeSummary {
    pub(crate) fn from_root(root: &Element, schema_version: SchemaVersion) -> Result<Self, FacturaeError> {
        let header = root.find("FileHeader");
        let parties = root.find("Parties");

        Ok(Self {
            schema_version,
            modality: match header {
                Some(h) => code(h, "Modality", "modality", Modality::from_code)?,
                None => None,
            },
            issuer_type: match header {
                Some(h) => code(h, "InvoiceIssuerType", "invoice issuer type", InvoiceIssuerType::from_code)?,
                None => None,
            },
            batch: header
                .and_then(|h| h.find("Batch"))
                .map(BatchSummary::from_element)
                .transpose()?,
            seller: parties
                .and_then(|p| p.find("SellerParty"))
                .map(PartySummary::from_element)
                .transpose()?,
            buyer: parties
                .and_then(|p| p.find("BuyerParty"))
                .map(PartySummary::from_element)
                .transpose()?,
            invoices: root
                .find("Invoices")
                .into_iter()
                .flat_map(|i| i.find_all("Invoice"))
                .map(InvoiceSummary::from_element)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl BatchSummary {
    fn from_element(batch: &Element) -> Result<Self, FacturaeError> {
        let invoices_count = match batch.text_at("InvoicesCount") {
            Some(count) => Some(count.trim().parse().map_err(|_| FacturaeError::InvalidValue {
                path: "Batch/InvoicesCount".to_string(),
                value: count.to_string(),
                expected: "integer",
            })?),
            None => None,
        };

        Ok(Self {
            identifier: text(batch, "BatchIdentifier"),
            invoices_count,
            total_invoices_amount: optional_decimal(batch, "TotalInvoicesAmount/TotalAmount")?,
            total_outstanding_amount: optional_decimal(batch, "TotalOutstandingAmount/TotalAmount")?,
            total_executable_amount: optional_decimal(batch, "TotalExecutableAmount/TotalAmount")?,
            invoice_currency_code: text(batch, "InvoiceCurrencyCode"),
        })
    }
}

impl PartySummary {
    fn from_element(party: &Element) -> Result<Self, FacturaeError> {
        let tax_id = party.find("TaxIdentification");
        let (person_type, residence_type) = match tax_id {
            Some(t) => (
                code(t, "PersonTypeCode", "person type code", PersonTypeCode::from_code)?,
                code(t, "ResidenceTypeCode", "residence type code", ResidenceTypeCode::from_code)?,
            ),
            None => (None, None),
        };

        let legal_entity = party.find("LegalEntity");
        let individual = party.find("Individual");
        let name = match (legal_entity, individual) {
            (Some(entity), _) => text(entity, "CorporateName"),
            (None, Some(person)) => {
                let parts: Vec<_> = ["Name", "FirstSurname", "SecondSurname"]
                    .iter()
                    .filter_map(|p| person.text_at(p).map(str::trim))
                    .collect();
                (!parts.is_empty()).then(|| parts.join(" "))
            }
            (None, None) => None,
        };
        let address = legal_entity
            .or(individual)
            .and_then(AddressSummary::from_party);

        Ok(Self {
            person_type,
            residence_type,
            tax_identification_number: tax_id.and_then(|t| text(t, "TaxIdentificationNumber")),
            name,
            trade_name: legal_entity.and_then(|e| text(e, "TradeName")),
            address,
        })
    }
}

impl AddressSummary {
    fn from_party(entity: &Element) -> Option<Self> {
        if let Some(a) = entity.find("AddressInSpain") {
            return Some(Self {
                street: text(a, "Address"),
                post_code: text(a, "PostCode"),
                town: text(a, "Town"),
                province: text(a, "Province"),
                country_code: text(a, "CountryCode"),
            });
        }
        // Overseas addresses carry post code and town in one field.
        entity.find("OverseasAddress").map(|a| Self {
            street: text(a, "Address"),
            post_code: None,
            town: text(a, "PostCodeAndTown"),
            province: text(a, "Province"),
            country_code: text(a, "CountryCode"),
        })
    }
}

impl InvoiceSummary {
    fn from_element(invoice: &Element) -> Result<Self, FacturaeError> {
        let header = invoice.find("InvoiceHeader");
        let issue = invoice.find("InvoiceIssueData");

        let (document_type, class) = match header {
            Some(h) => (
                code(h, "InvoiceDocumentType", "invoice document type", InvoiceDocumentType::from_code)?,
                code(h, "InvoiceClass", "invoice class", InvoiceClass::from_code)?,
            ),
            None => (None, None),
        };

        let installments = invoice
            .find("PaymentDetails")
            .into_iter()
            .flat_map(|p| p.find_all("Installment"))
            .map(InstallmentSummary::from_element)
            .collect::<Result<_, _>>()?;

        let attachments = invoice
            .find_path("AdditionalData/RelatedDocuments")
            .into_iter()
            .flat_map(|r| r.find_all("Attachment"))
            .map(|a| AttachmentSummary {
                compression_algorithm: text(a, "AttachmentCompressionAlgorithm"),
                format: text(a, "AttachmentFormat"),
                encoding: text(a, "AttachmentEncoding"),
                data: text(a, "AttachmentData"),
            })
            .collect();

        Ok(Self {
            number: header.and_then(|h| text(h, "InvoiceNumber")),
            series_code: header.and_then(|h| text(h, "InvoiceSeriesCode")),
            document_type,
            class,
            issue_date: match issue {
                Some(i) => date(i, "IssueDate")?,
                None => None,
            },
            invoice_currency_code: issue.and_then(|i| text(i, "InvoiceCurrencyCode")),
            tax_currency_code: issue.and_then(|i| text(i, "TaxCurrencyCode")),
            language: issue.and_then(|i| text(i, "LanguageName")),
            taxes_outputs: taxes(invoice.find("TaxesOutputs"))?,
            taxes_withheld: taxes(invoice.find("TaxesWithheld"))?,
            totals: invoice
                .find("InvoiceTotals")
                .map(TotalsSummary::from_element)
                .transpose()?,
            lines: invoice
                .find("Items")
                .into_iter()
                .flat_map(|i| i.find_all("InvoiceLine"))
                .map(LineSummary::from_element)
                .collect::<Result<_, _>>()?,
            installments,
            attachments,
            additional_information: text(invoice, "AdditionalData/InvoiceAdditionalInformation"),
        })
    }
}

impl TaxSummary {
    fn from_element(tax: &Element) -> Result<Self, FacturaeError> {
        Ok(Self {
            type_code: code(tax, "TaxTypeCode", "tax type code", TaxTypeCode::from_code)?,
            rate: optional_decimal(tax, "TaxRate")?,
            taxable_base: optional_decimal(tax, "TaxableBase/TotalAmount")?,
            amount: optional_decimal(tax, "TaxAmount/TotalAmount")?,
        })
    }
}

impl TotalsSummary {
    fn from_element(totals: &Element) -> Result<Self, FacturaeError> {
        Ok(Self {
            gross_amount: optional_decimal(totals, "TotalGrossAmount")?,
            gross_amount_before_taxes: optional_decimal(totals, "TotalGrossAmountBeforeTaxes")?,
            tax_outputs: optional_decimal(totals, "TotalTaxOutputs")?,
            taxes_withheld: optional_decimal(totals, "TotalTaxesWithheld")?,
            invoice_total: optional_decimal(totals, "InvoiceTotal")?,
            outstanding_amount: optional_decimal(totals, "TotalOutstandingAmount")?,
            executable_amount: optional_decimal(totals, "TotalExecutableAmount")?,
        })
    }
}

impl LineSummary {
    fn from_element(line: &Element) -> Result<Self, FacturaeError> {
        Ok(Self {
            description: text(line, "ItemDescription"),
            quantity: optional_decimal(line, "Quantity")?,
            unit_price_without_tax: optional_decimal(line, "UnitPriceWithoutTax")?,
            total_cost: optional_decimal(line, "TotalCost")?,
            gross_amount: optional_decimal(line, "GrossAmount")?,
            taxes_outputs: taxes(line.find("TaxesOutputs"))?,
        })
    }
}

impl InstallmentSummary {
    fn from_element(installment: &Element) -> Result<Self, FacturaeError> {
        let account = installment
            .find("AccountToBeDebited")
            .or_else(|| installment.find("AccountToBeCredited"));

        Ok(Self {
            due_date: date(installment, "InstallmentDueDate")?,
            amount: optional_decimal(installment, "InstallmentAmount")?,
            payment_means: code(installment, "PaymentMeans", "payment means", PaymentMeans::from_code)?,
            iban: account.and_then(|a| text(a, "IBAN")),
            bic: account.and_then(|a| text(a, "BIC")),
        })
    }
}

fn taxes(parent: Option<&Element>) -> Result<Vec<TaxSummary>, FacturaeError> {
    parent
        .into_iter()
        .flat_map(|p| p.find_all("Tax"))
        .map(TaxSummary::from_element)
        .collect()
}

fn text(elem: &Element, path: &str) -> Option<String> {
    elem.text_at(path).map(|t| t.trim().to_string())
}

fn code<T>(
    elem: &Element,
    path: &str,
    expected: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, FacturaeError> {
    match elem.text_at(path) {
        Some(value) => parse(value.trim()).map(Some).ok_or_else(|| FacturaeError::InvalidValue {
            path: format!("{}/{}", elem.tag(), path),
            value: value.to_string(),
            expected,
        }),
        None => Ok(None),
    }
}

fn date(elem: &Element, path: &str) -> Result<Option<NaiveDate>, FacturaeError> {
    match elem.text_at(path) {
        Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FacturaeError::InvalidValue {
                path: format!("{}/{}", elem.tag(), path),
                value: value.to_string(),
                expected: "date",
            }),
        None => Ok(None),
    }
}
