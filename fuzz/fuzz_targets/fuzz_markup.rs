#![no_main]

use formwire_dom::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Ok(doc) = Document::parse(data) else {
        return;
    };
    // Every element is reachable and its id resolves to some element.
    for node in doc.elements() {
        assert!(doc.is_connected(node));
        if let Some(id) = doc.id_of(node) {
            assert!(doc.by_id(id).is_some());
        }
    }
    // Serialized output loads again.
    let html = doc.to_html();
    assert!(Document::parse(&html).is_ok());
});
