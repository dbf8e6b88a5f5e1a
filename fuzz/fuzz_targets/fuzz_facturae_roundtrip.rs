#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse → serialize → parse must not panic at any step.
        if let Ok(tree) = facturae::xml::parse_element(s) {
            if let Ok(xml) = tree.to_xml() {
                let _ = facturae::xml::parse_element(&xml);
            }
        }
    }
});
