#![no_main]

use arbitrary::Arbitrary;
use formwire_behaviors::totals::{MAX_PRECISION, format_total, numeric_value};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    term: &'a str,
    precision: u8,
}

fuzz_target!(|input: Input<'_>| {
    let value = numeric_value(input.term);
    assert!(value.is_finite());
    let precision = usize::from(input.precision) % (MAX_PRECISION + 1);
    let text = format_total(value, precision);
    // Grouped output reads back as the same rounded number.
    let back = numeric_value(&text);
    assert!(back.is_finite());
    assert_eq!(text.contains('.'), precision > 0);
});
