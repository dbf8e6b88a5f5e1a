//! Facturae code lists.
//!
//! Each list is an enum with `code()` returning the value used in the XML
//! and `from_code()` parsing it back.

use serde::{Deserialize, Serialize};

/// Facturae schema version (`FileHeader/SchemaVersion`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// 3.2
    V3_2,
    /// 3.2.1
    V3_2_1,
    /// 3.2.2
    V3_2_2,
}

impl SchemaVersion {
    pub const DEFAULT: Self = Self::V3_2_2;

    pub fn code(&self) -> &'static str {
        match self {
            Self::V3_2 => "3.2",
            Self::V3_2_1 => "3.2.1",
            Self::V3_2_2 => "3.2.2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "3.2" => Some(Self::V3_2),
            "3.2.1" => Some(Self::V3_2_1),
            "3.2.2" => Some(Self::V3_2_2),
            _ => None,
        }
    }

    /// Namespace URI bound to the `fe` prefix of the root element.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::V3_2 => "http://www.facturae.es/Facturae/2009/v3.2/Facturae",
            Self::V3_2_1 => "http://www.facturae.es/Facturae/2014/v3.2.1/Facturae",
            Self::V3_2_2 => "http://www.facturae.gob.es/formato/Versiones/Facturaev3_2_2.xml",
        }
    }
}

/// `FileHeader/Modality`: single invoice or batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    /// I: individual.
    Single,
    /// L: lote.
    Batch,
}

impl Modality {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Single => "I",
            Self::Batch => "L",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "I" => Some(Self::Single),
            "L" => Some(Self::Batch),
            _ => None,
        }
    }
}

/// `InvoiceHeader/InvoiceClass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceClass {
    /// OO: original.
    Original,
    /// OR: corrective original.
    OriginalCorrective,
    /// OC: summary original.
    OriginalSummary,
    /// CO: copy of the original.
    OriginalDuplicated,
    /// CR: copy of the corrective.
    CorrectiveDuplicated,
    /// CC: copy of the summary.
    SummaryDuplicated,
}

impl InvoiceClass {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Original => "OO",
            Self::OriginalCorrective => "OR",
            Self::OriginalSummary => "OC",
            Self::OriginalDuplicated => "CO",
            Self::CorrectiveDuplicated => "CR",
            Self::SummaryDuplicated => "CC",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "OO" => Some(Self::Original),
            "OR" => Some(Self::OriginalCorrective),
            "OC" => Some(Self::OriginalSummary),
            "CO" => Some(Self::OriginalDuplicated),
            "CR" => Some(Self::CorrectiveDuplicated),
            "CC" => Some(Self::SummaryDuplicated),
            _ => None,
        }
    }
}

/// `InvoiceHeader/InvoiceDocumentType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceDocumentType {
    /// FC: complete invoice.
    Complete,
    /// FA: abbreviated invoice (ticket).
    Abbreviated,
    /// AF: self-invoice.
    SelfInvoice,
}

impl InvoiceDocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Complete => "FC",
            Self::Abbreviated => "FA",
            Self::SelfInvoice => "AF",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FC" => Some(Self::Complete),
            "FA" => Some(Self::Abbreviated),
            "AF" => Some(Self::SelfInvoice),
            _ => None,
        }
    }
}

/// `FileHeader/InvoiceIssuerType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceIssuerType {
    /// EM: issued by the seller.
    Seller,
    /// RE: issued by the buyer.
    Buyer,
    /// TE: issued by a third party.
    ThirdParty,
}

impl InvoiceIssuerType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Seller => "EM",
            Self::Buyer => "RE",
            Self::ThirdParty => "TE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EM" => Some(Self::Seller),
            "RE" => Some(Self::Buyer),
            "TE" => Some(Self::ThirdParty),
            _ => None,
        }
    }
}

/// `Corrective/ReasonCode`: what a corrective invoice rectifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectiveReasonCode {
    InvoiceNumber,
    InvoiceSerialNumber,
    IssueDate,
    IssuersName,
    ReceiversName,
    IssuersTaxId,
    ReceiversTaxId,
    IssuersAddress,
    ReceiversAddress,
    ItemLine,
    ApplicableTaxRate,
    ApplicableTaxAmount,
    ApplicableDate,
    InvoiceClass,
    LegalLiterals,
    TaxableBase,
    CalculationOfTaxOutputs,
    CalculationOfTaxInputs,
    TaxableBaseModifiedByPackageReturn,
    TaxableBaseModifiedByDiscounts,
    TaxableBaseModifiedByCourtRuling,
    TaxableBaseModifiedByUnpaidOutputs,
}

impl CorrectiveReasonCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvoiceNumber => "01",
            Self::InvoiceSerialNumber => "02",
            Self::IssueDate => "03",
            Self::IssuersName => "04",
            Self::ReceiversName => "05",
            Self::IssuersTaxId => "06",
            Self::ReceiversTaxId => "07",
            Self::IssuersAddress => "08",
            Self::ReceiversAddress => "09",
            Self::ItemLine => "10",
            Self::ApplicableTaxRate => "11",
            Self::ApplicableTaxAmount => "12",
            Self::ApplicableDate => "13",
            Self::InvoiceClass => "14",
            Self::LegalLiterals => "15",
            Self::TaxableBase => "16",
            Self::CalculationOfTaxOutputs => "80",
            Self::CalculationOfTaxInputs => "81",
            Self::TaxableBaseModifiedByPackageReturn => "82",
            Self::TaxableBaseModifiedByDiscounts => "83",
            Self::TaxableBaseModifiedByCourtRuling => "84",
            Self::TaxableBaseModifiedByUnpaidOutputs => "85",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Official Spanish description (`ReasonDescription`).
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvoiceNumber => "Número de la factura",
            Self::InvoiceSerialNumber => "Serie de la factura",
            Self::IssueDate => "Fecha expedición",
            Self::IssuersName => "Nombre y apellidos/Razón Social-Emisor",
            Self::ReceiversName => "Nombre y apellidos/Razón Social-Receptor",
            Self::IssuersTaxId => "Identificación fiscal Emisor/obligado",
            Self::ReceiversTaxId => "Identificación fiscal Receptor",
            Self::IssuersAddress => "Domicilio Emisor/Obligado",
            Self::ReceiversAddress => "Domicilio Receptor",
            Self::ItemLine => "Detalle Operación",
            Self::ApplicableTaxRate => "Porcentaje impositivo a aplicar",
            Self::ApplicableTaxAmount => "Cuota tributaria a aplicar",
            Self::ApplicableDate => "Fecha/Periodo a aplicar",
            Self::InvoiceClass => "Clase de factura",
            Self::LegalLiterals => "Literales legales",
            Self::TaxableBase => "Base imponible",
            Self::CalculationOfTaxOutputs => "Cálculo de cuotas repercutidas",
            Self::CalculationOfTaxInputs => "Cálculo de cuotas retenidas",
            Self::TaxableBaseModifiedByPackageReturn => {
                "Base imponible modificada por devolución de envases / embalajes"
            }
            Self::TaxableBaseModifiedByDiscounts => {
                "Base imponible modificada por descuentos y bonificaciones"
            }
            Self::TaxableBaseModifiedByCourtRuling => {
                "Base imponible modificada por resolución firme, judicial o administrativa"
            }
            Self::TaxableBaseModifiedByUnpaidOutputs => {
                "Base imponible modificada cuotas repercutidas no satisfechas. Auto de declaración de concurso"
            }
        }
    }

    const ALL: [Self; 22] = [
        Self::InvoiceNumber,
        Self::InvoiceSerialNumber,
        Self::IssueDate,
        Self::IssuersName,
        Self::ReceiversName,
        Self::IssuersTaxId,
        Self::ReceiversTaxId,
        Self::IssuersAddress,
        Self::ReceiversAddress,
        Self::ItemLine,
        Self::ApplicableTaxRate,
        Self::ApplicableTaxAmount,
        Self::ApplicableDate,
        Self::InvoiceClass,
        Self::LegalLiterals,
        Self::TaxableBase,
        Self::CalculationOfTaxOutputs,
        Self::CalculationOfTaxInputs,
        Self::TaxableBaseModifiedByPackageReturn,
        Self::TaxableBaseModifiedByDiscounts,
        Self::TaxableBaseModifiedByCourtRuling,
        Self::TaxableBaseModifiedByUnpaidOutputs,
    ];
}

/// `Corrective/CorrectionMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// 01: full correction.
    FullItems,
    /// 02: corrected items only (differences).
    CorrectedItemsOnly,
    /// 03: volume discount over a period.
    BulkDeal,
    /// 04: authorised by the tax agency.
    AuthorizedByTaxAgency,
}

impl CorrectionMethod {
    pub fn code(&self) -> &'static str {
        match self {
            Self::FullItems => "01",
            Self::CorrectedItemsOnly => "02",
            Self::BulkDeal => "03",
            Self::AuthorizedByTaxAgency => "04",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::FullItems),
            "02" => Some(Self::CorrectedItemsOnly),
            "03" => Some(Self::BulkDeal),
            "04" => Some(Self::AuthorizedByTaxAgency),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::FullItems => "Rectificación íntegra",
            Self::CorrectedItemsOnly => "Rectificación por diferencias",
            Self::BulkDeal => {
                "Rectificación por descuento por volumen de operaciones durante un periodo"
            }
            Self::AuthorizedByTaxAgency => "Autorizadas por la Agencia Tributaria",
        }
    }
}

/// `TaxIdentification/ResidenceTypeCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidenceTypeCode {
    /// E: foreign (extranjero).
    Foreign,
    /// R: resident in Spain.
    Resident,
    /// U: resident in another EU member state.
    EuResident,
}

impl ResidenceTypeCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Foreign => "E",
            Self::Resident => "R",
            Self::EuResident => "U",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "E" => Some(Self::Foreign),
            "R" => Some(Self::Resident),
            "U" => Some(Self::EuResident),
            _ => None,
        }
    }
}

/// `TaxIdentification/PersonTypeCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonTypeCode {
    /// F: natural person (física).
    Physical,
    /// J: legal entity (jurídica).
    Juridical,
}

impl PersonTypeCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Physical => "F",
            Self::Juridical => "J",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "F" => Some(Self::Physical),
            "J" => Some(Self::Juridical),
            _ => None,
        }
    }
}

/// `Tax/TaxTypeCode`: the tax charged, or the tax applied to withheld amounts.
///
/// The list runs from 01 to 29; codes without their own variant are kept
/// as [`TaxTypeCode::Listed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxTypeCode {
    /// 01: IVA, value added tax.
    Iva,
    /// 02: IPSI (Ceuta and Melilla).
    Ipsi,
    /// 03: IGIC (Canary Islands).
    Igic,
    /// 04: IRPF, personal income tax withholding.
    Irpf,
    /// 05: other.
    Other,
    /// 17: REIVA, recargo de equivalencia on IVA.
    ReIva,
    /// Any other code of the list (06 to 29).
    Listed(u8),
}

const TAX_TYPE_NAMES: [&str; 29] = [
    "IVA", "IPSI", "IGIC", "IRPF", "Otro", "ITPAJD", "IE", "RA", "IGTECM", "IECDPCAC",
    "IIIMAB", "ICIO", "IMVDN", "IMSN", "IMGSN", "IMPN", "REIVA", "REIGIC", "REIPSI", "IPS",
    "RLEA", "IVPEE", "IPCNG", "IACNG", "IDEC", "ILTCAC", "IGFEI", "IRNR", "ISS",
];

impl TaxTypeCode {
    fn number(&self) -> u8 {
        match self {
            Self::Iva => 1,
            Self::Ipsi => 2,
            Self::Igic => 3,
            Self::Irpf => 4,
            Self::Other => 5,
            Self::ReIva => 17,
            Self::Listed(n) => *n,
        }
    }

    pub fn code(&self) -> String {
        format!("{:02}", self.number())
    }

    /// Two-digit code between 01 and 29.
    pub fn from_code(code: &str) -> Option<Self> {
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u8 = code.parse().ok()?;
        Some(match n {
            1 => Self::Iva,
            2 => Self::Ipsi,
            3 => Self::Igic,
            4 => Self::Irpf,
            5 => Self::Other,
            17 => Self::ReIva,
            6..=29 => Self::Listed(n),
            _ => return None,
        })
    }

    /// Spanish acronym.
    pub fn name(&self) -> &'static str {
        usize::from(self.number())
            .checked_sub(1)
            .and_then(|i| TAX_TYPE_NAMES.get(i))
            .copied()
            .unwrap_or("Otro")
    }
}

/// `Installment/PaymentMeans`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMeans {
    /// 01: cash.
    InCash,
    /// 02: direct debit.
    DirectDebit,
    /// 04: credit transfer.
    CreditTransfer,
    /// 13: special.
    Special,
    /// 19: card.
    Card,
    /// Any other code of the Facturae list.
    Other(u8),
}

impl PaymentMeans {
    pub fn code(&self) -> String {
        let n = match self {
            Self::InCash => 1,
            Self::DirectDebit => 2,
            Self::CreditTransfer => 4,
            Self::Special => 13,
            Self::Card => 19,
            Self::Other(c) => *c,
        };
        format!("{n:02}")
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let n: u8 = code.parse().ok()?;
        Some(match n {
            1 => Self::InCash,
            2 => Self::DirectDebit,
            4 => Self::CreditTransfer,
            13 => Self::Special,
            19 => Self::Card,
            c => Self::Other(c),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_version_codes() {
        assert_eq!(SchemaVersion::from_code("3.2.2"), Some(SchemaVersion::V3_2_2));
        assert_eq!(SchemaVersion::DEFAULT.code(), "3.2.2");
        assert!(SchemaVersion::V3_2_1.namespace().ends_with("/v3.2.1/Facturae"));
        assert_eq!(SchemaVersion::from_code("fail"), None);
    }

    #[test]
    fn corrective_reason_codes_roundtrip() {
        for reason in CorrectiveReasonCode::ALL {
            assert_eq!(CorrectiveReasonCode::from_code(reason.code()), Some(reason));
            assert!(!reason.description().is_empty());
        }
        assert_eq!(CorrectiveReasonCode::from_code("17"), None);
    }

    #[test]
    fn tax_type_codes() {
        assert_eq!(TaxTypeCode::from_code("01"), Some(TaxTypeCode::Iva));
        assert_eq!(TaxTypeCode::Irpf.code(), "04");
        assert_eq!(TaxTypeCode::from_code("17"), Some(TaxTypeCode::ReIva));
        assert_eq!(TaxTypeCode::ReIva.name(), "REIVA");
        assert_eq!(TaxTypeCode::from_code("18"), Some(TaxTypeCode::Listed(18)));
        assert_eq!(TaxTypeCode::Listed(18).code(), "18");
        assert_eq!(TaxTypeCode::Listed(29).name(), "ISS");
        assert_eq!(TaxTypeCode::from_code("1"), None);
        assert_eq!(TaxTypeCode::from_code("30"), None);
        assert_eq!(TaxTypeCode::from_code("00"), None);
    }

    #[test]
    fn payment_means_padding() {
        assert_eq!(PaymentMeans::from_code("04"), Some(PaymentMeans::CreditTransfer));
        assert_eq!(PaymentMeans::from_code("07"), Some(PaymentMeans::Other(7)));
        assert_eq!(PaymentMeans::Other(7).code(), "07");
        assert_eq!(PaymentMeans::from_code("xx"), None);
    }
}
