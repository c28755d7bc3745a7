#![forbid(unsafe_code)]

//! Running totals.
//!
//! ```html
//! <span class="js-CalculateTotals" data-total-terms=".fine" data-total-precision="2"></span>
//! ```
//!
//! The element's text is the sum of every element matching the terms
//! selector, formatted to a fixed precision with `,` thousands separators.
//! Inputs contribute their value, other elements their text; commas are
//! ignored and anything non-numeric counts as zero.
//!
//! After writing its text a total fires `update` on itself, so a total whose
//! terms include other totals (a grand total over sub-totals) follows them.
//!
//! # Invariants
//!
//! 1. A total is never one of its own terms.
//! 2. A total never recomputes while it is already recomputing, so cyclic
//!    declarations terminate.
//! 3. [`Totals::discover`] orders totals so that one feeding another binds
//!    (and therefore renders) first.

use std::cell::Cell;
use std::rc::Rc;

use formwire_dom::{Document, EventKind, NodeId, Selector};
use formwire_runtime::{Behavior, Error, Page, RENDER, Result};
use serde::{Deserialize, Serialize};

/// Elements bound by [`Totals`].
pub const SELECTOR: &str = ".js-CalculateTotals";

/// Terms selector used when `data-total-terms` is absent.
pub const DEFAULT_TERMS: &str = ".term";

/// Decimal places used when `data-total-precision` is absent.
pub const DEFAULT_PRECISION: usize = 2;

/// Largest accepted precision.
pub const MAX_PRECISION: usize = 20;

/// Configuration of one total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TotalsConfig {
    /// Selector for the terms.
    pub terms: String,
    /// Decimal places; `0` yields an integer.
    pub precision: usize,
}

impl Default for TotalsConfig {
    fn default() -> Self {
        Self {
            terms: DEFAULT_TERMS.to_owned(),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl TotalsConfig {
    /// Read `data-total-terms` and `data-total-precision`.
    pub fn from_element(doc: &Document, node: NodeId) -> Result<Self> {
        let terms = terms_selector(doc, node).to_owned();
        let precision = match doc.attr(node, "data-total-precision").map(str::trim) {
            None | Some("") => DEFAULT_PRECISION,
            Some(raw) => {
                let precision: usize = raw.parse().map_err(|_| {
                    Error::invalid_attribute("data-total-precision", raw, "not a whole number")
                })?;
                if precision > MAX_PRECISION {
                    return Err(Error::invalid_attribute(
                        "data-total-precision",
                        raw,
                        format!("exceeds {MAX_PRECISION}"),
                    ));
                }
                precision
            }
        };
        Ok(Self { terms, precision })
    }
}

fn terms_selector(doc: &Document, node: NodeId) -> &str {
    doc.attr(node, "data-total-terms")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_TERMS)
}

// ---------------------------------------------------------------------------
// Number handling
// ---------------------------------------------------------------------------

/// Numeric value of a term's raw text; non-numeric text is zero.
#[must_use]
pub fn numeric_value(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    let plain = cleaned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
    if cleaned.is_empty() || !plain {
        return 0.0;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Fraction digits in the exact decimal expansion of any `f64`.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Format `total` with `precision` decimals and `,` thousands separators.
///
/// Rounding is half away from zero on the exact binary value, so `2.5`
/// becomes `3` and `0.125` becomes `0.13`, while `1.005` (stored just below
/// the tie) stays `1.00`.
#[must_use]
pub fn format_total(total: f64, precision: usize) -> String {
    let fixed = to_fixed(total, precision);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int, frac) = match unsigned.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (unsigned, None),
    };
    let mut out = String::with_capacity(fixed.len() + int.len() / 3);
    out.push_str(sign);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Fixed-point text of `value`, rounding ties away from zero. A result that
/// rounds to zero carries no sign.
fn to_fixed(value: f64, precision: usize) -> String {
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let (int, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut digits: Vec<u8> = int
        .bytes()
        .chain(frac.bytes().chain(std::iter::repeat(b'0')).take(precision))
        .collect();
    if frac.as_bytes().get(precision).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }
    let split = digits.len() - precision;
    let mut out = String::with_capacity(digits.len() + 2);
    if value < 0.0 && digits.iter().any(|d| *d != b'0') {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|d| char::from(*d)));
    if precision > 0 {
        out.push('.');
        out.extend(digits[split..].iter().map(|d| char::from(*d)));
    }
    out
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

/// One bound total.
#[derive(Debug)]
pub struct TotalsInstance {
    total: NodeId,
    terms: Vec<NodeId>,
    precision: usize,
    updating: Cell<bool>,
}

impl TotalsInstance {
    /// The element showing the total.
    #[must_use]
    pub const fn total(&self) -> NodeId {
        self.total
    }

    /// Terms captured at bind time.
    #[must_use]
    pub fn terms(&self) -> &[NodeId] {
        &self.terms
    }

    /// Sum of the terms' numeric values.
    #[must_use]
    pub fn sum(&self, doc: &Document) -> f64 {
        self.terms
            .iter()
            .map(|term| {
                let raw = if doc.control_kind(*term).is_some() {
                    doc.value(*term).unwrap_or_default()
                } else {
                    doc.text_content(*term)
                };
                numeric_value(&raw)
            })
            .sum()
    }

    /// Recompute, write the text and fire `update` on the total.
    pub fn update(&self, page: &mut Page) -> Result<()> {
        if self.updating.replace(true) {
            tracing::trace!(total = ?self.total, "total already updating");
            return Ok(());
        }
        let result = self.recompute(page);
        self.updating.set(false);
        result
    }

    fn recompute(&self, page: &mut Page) -> Result<()> {
        let text = format_total(self.sum(page.document()), self.precision);
        page.document_mut().set_text_content(self.total, &text)?;
        tracing::trace!(total = ?self.total, %text, "total updated");
        page.trigger(self.total, EventKind::Update)?;
        Ok(())
    }
}

/// Running totals behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct Totals;

impl Totals {
    /// Bind `node` with an explicit configuration.
    pub fn bind_with(
        page: &mut Page,
        node: NodeId,
        config: &TotalsConfig,
    ) -> Result<Rc<TotalsInstance>> {
        let selector = Selector::parse(&config.terms)?;
        let terms: Vec<NodeId> = page
            .document()
            .query_all(&selector)
            .into_iter()
            .filter(|t| *t != node)
            .collect();
        let instance = Rc::new(TotalsInstance {
            total: node,
            terms,
            precision: config.precision,
            updating: Cell::new(false),
        });
        for term in instance.terms.clone() {
            for kind in [EventKind::Change, EventKind::Update] {
                let inst = Rc::clone(&instance);
                page.on(term, kind, move |page, _| inst.update(page));
            }
        }
        let inst = Rc::clone(&instance);
        page.subscribe(RENDER, move |page| inst.update(page));
        Ok(instance)
    }
}

impl Behavior for Totals {
    fn name(&self) -> &'static str {
        "totals"
    }

    /// Totals in dependency order: a total that is a term of another comes
    /// before it. Ties and cycles fall back to document order.
    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        let totals = doc.select(SELECTOR)?;
        let selectors: Vec<Option<Selector>> = totals
            .iter()
            .map(|t| Selector::parse(terms_selector(doc, *t)).ok())
            .collect();
        // feeds[i][j]: total i is a term of total j.
        let feeds = |i: usize, j: usize| {
            i != j
                && selectors[j]
                    .as_ref()
                    .is_some_and(|sel| sel.matches(doc, totals[i]))
        };
        let mut indegree: Vec<usize> = (0..totals.len())
            .map(|j| (0..totals.len()).filter(|i| feeds(*i, j)).count())
            .collect();
        let mut done = vec![false; totals.len()];
        let mut order = Vec::with_capacity(totals.len());
        while order.len() < totals.len() {
            let next = (0..totals.len())
                .find(|j| !done[*j] && indegree[*j] == 0)
                .or_else(|| (0..totals.len()).find(|j| !done[*j]));
            let Some(next) = next else {
                break;
            };
            done[next] = true;
            order.push(totals[next]);
            for j in 0..totals.len() {
                if !done[j] && feeds(next, j) {
                    indegree[j] = indegree[j].saturating_sub(1);
                }
            }
        }
        Ok(order)
    }

    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        let config = TotalsConfig::from_element(page.document(), node)?;
        Self::bind_with(page, node, &config).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_page;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn bind_all(page: &mut Page) {
        for node in Totals.discover(page.document()).unwrap() {
            Totals.bind(page, node).unwrap();
        }
        page.render().unwrap();
    }

    fn text_of(page: &Page, selector: &str) -> String {
        let node = page.document().select(selector).unwrap()[0];
        page.document().text_content(node)
    }

    #[test]
    fn sums_inputs_and_text_terms() {
        let mut page = test_page(
            r#"<input class="term" value="10"><input class="term" value="5">
               <input class="term" value=""><span class="term">7</span>
               <span class="js-CalculateTotals"></span>"#,
        );
        bind_all(&mut page);
        assert_eq!(text_of(&page, SELECTOR), "22.00");
    }

    #[test]
    fn precision_attribute_is_honoured_including_zero() {
        let mut page = test_page(
            r#"<input class="term" value="10"><span class="term">12.4</span>
               <span id="four" class="js-CalculateTotals" data-total-precision="4"></span>
               <span id="zero" class="js-CalculateTotals" data-total-precision="0"></span>"#,
        );
        bind_all(&mut page);
        assert_eq!(text_of(&page, "#four"), "22.4000");
        assert_eq!(text_of(&page, "#zero"), "22");
    }

    #[test]
    fn terms_selector_supports_negation() {
        let mut page = test_page(
            r#"<input class=term value=10><input class="term excluded" value=5>
               <span id=t class=js-CalculateTotals data-total-terms=".term:not(.excluded)"></span>"#,
        );
        bind_all(&mut page);
        assert_eq!(text_of(&page, "#t"), "10.00");
    }

    #[test]
    fn non_numeric_terms_count_as_zero() {
        let mut page = test_page(
            r#"<input class="term" value="aaa"><input class="term" value="22">
               <span class="js-CalculateTotals"></span>"#,
        );
        bind_all(&mut page);
        assert_eq!(text_of(&page, SELECTOR), "22.00");
    }

    #[test]
    fn commas_are_ignored_and_thousands_grouped() {
        let mut page = test_page(
            r#"<input class="term" value="1,000,000"><input class="term" value="12">
               <span class="js-CalculateTotals"></span>"#,
        );
        bind_all(&mut page);
        assert_eq!(text_of(&page, SELECTOR), "1,000,012.00");
    }

    #[test]
    fn change_recomputes() {
        let mut page = test_page(
            r#"<input class="term" value="1"><span class="js-CalculateTotals"></span>"#,
        );
        bind_all(&mut page);
        let input = page.document().select(".term").unwrap()[0];
        page.fill(input, "2.5").unwrap();
        assert_eq!(text_of(&page, SELECTOR), "2.50");
    }

    #[test]
    fn grand_total_follows_sub_totals() {
        let mut page = test_page(
            r#"<span id="total" class="js-CalculateTotals" data-total-terms=".intermediate-total"></span>
               <input class="term-1" value="10"><input class="term-1" value="10">
               <span id="t1" class="js-CalculateTotals intermediate-total" data-total-terms=".term-1"></span>
               <input class="term-2" value="1"><input class="term-2" value="1">
               <span id="t2" class="js-CalculateTotals intermediate-total" data-total-terms=".term-2"></span>"#,
        );
        let order = Totals.discover(page.document()).unwrap();
        let total = page.document().by_id("total").unwrap();
        assert_eq!(order.last(), Some(&total));

        bind_all(&mut page);
        assert_eq!(text_of(&page, "#t1"), "20.00");
        assert_eq!(text_of(&page, "#t2"), "2.00");
        assert_eq!(text_of(&page, "#total"), "22.00");

        let input = page.document().select(".term-2").unwrap()[0];
        page.fill(input, "5").unwrap();
        assert_eq!(text_of(&page, "#t2"), "6.00");
        assert_eq!(text_of(&page, "#total"), "26.00");
    }

    #[test]
    fn total_never_counts_itself_and_cycles_terminate() {
        let mut page = test_page(
            r#"<span id="a" class="js-CalculateTotals term" data-total-terms=".term"></span>
               <span id="b" class="js-CalculateTotals term" data-total-terms=".term"></span>
               <input class="term" value="3">"#,
        );
        bind_all(&mut page);
        let a = page.document().by_id("a").unwrap();
        let b = page.document().by_id("b").unwrap();
        let doc = page.document();
        assert!(!doc.text_content(a).is_empty());
        assert!(!doc.text_content(b).is_empty());
    }

    #[test]
    fn bad_precision_is_rejected() {
        let page = test_page(r#"<span class="js-CalculateTotals" data-total-precision="two"></span>"#);
        let node = page.document().select(SELECTOR).unwrap()[0];
        assert!(matches!(
            TotalsConfig::from_element(page.document(), node),
            Err(Error::InvalidAttribute { attribute: "data-total-precision", .. })
        ));
    }

    #[test]
    fn format_total_groups_thousands() {
        assert_eq!(format_total(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_total(-1234.5, 1), "-1,234.5");
        assert_eq!(format_total(999.0, 0), "999");
        assert_eq!(format_total(-0.0, 2), "0.00");
    }

    #[test]
    fn format_total_rounds_ties_away_from_zero() {
        assert_eq!(format_total(2.5, 0), "3");
        assert_eq!(format_total(0.125, 2), "0.13");
        assert_eq!(format_total(0.25, 1), "0.3");
        assert_eq!(format_total(-2.5, 0), "-3");
        assert_eq!(format_total(1.005, 2), "1.00");
        assert_eq!(format_total(999.5, 0), "1,000");
        assert_eq!(format_total(-0.001, 2), "0.00");
    }

    #[test]
    fn numeric_value_rejects_words() {
        assert_eq!(numeric_value(" 7 "), 7.0);
        assert_eq!(numeric_value("1,000.5"), 1000.5);
        assert_eq!(numeric_value("inf"), 0.0);
        assert_eq!(numeric_value("NaN"), 0.0);
        assert_eq!(numeric_value("£5"), 0.0);
    }

    proptest! {
        #[test]
        fn grouping_round_trips_integers(n in 0u64..10_000_000_000) {
            let formatted = format_total(n as f64, 0);
            let digits: String = formatted.chars().filter(|c| *c != ',').collect();
            prop_assert_eq!(digits, n.to_string());
            for group in formatted.split(',').skip(1) {
                prop_assert_eq!(group.len(), 3);
            }
        }
    }
}
