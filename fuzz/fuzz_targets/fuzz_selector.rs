#![no_main]

use arbitrary::Arbitrary;
use formwire_dom::{Document, Selector};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    selector: &'a str,
    markup: &'a str,
}

fuzz_target!(|input: Input<'_>| {
    let Ok(selector) = Selector::parse(input.selector) else {
        return;
    };
    let Ok(doc) = Document::parse(input.markup) else {
        return;
    };
    for node in doc.query_all(&selector) {
        assert!(doc.matches(node, &selector));
    }
});
