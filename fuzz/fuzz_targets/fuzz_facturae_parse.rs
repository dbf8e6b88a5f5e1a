#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Errors are fine, panics are bugs.
        if let Ok(doc) = facturae::xml::FacturaeDocument::from_xml(s) {
            let _ = doc.summary();
            let _ = doc.validate(&facturae::core::ValidationOptions::default().strict_taxes(true));
        }
    }
});
