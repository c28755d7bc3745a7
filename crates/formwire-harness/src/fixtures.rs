//! Reference pages shared by the integration tests.
//!
//! Ids are stable and referenced by the tests; keep them when editing.

/// Four terms (10, 5, blank, 7) and one total with default precision.
pub const TOTALS: &str = r#"
<form id="fines" action="/fines">
  <input id="term_1" class="term" name="fine" value="10">
  <input id="term_2" class="term" name="costs" value="5">
  <input id="term_3" class="term" name="surcharge" value="">
  <span id="term_4" class="term">7</span>
  <p id="total" class="js-CalculateTotals">0</p>
  <p id="total_4dp" class="js-CalculateTotals" data-total-precision="4">0</p>
</form>
"#;

/// Two sub-totals feeding a grand total declared before them.
pub const TOTALS_CASCADE: &str = r#"
<div>
  <span id="grand" class="js-CalculateTotals" data-total-terms=".intermediate-total"></span>
  <input id="a_1" class="term-1" value="10"><input id="a_2" class="term-1" value="10">
  <span id="sub_1" class="js-CalculateTotals intermediate-total" data-total-terms=".term-1"></span>
  <input id="b_1" class="term-2" value="1"><input id="b_2" class="term-2" value="1">
  <span id="sub_2" class="js-CalculateTotals intermediate-total" data-total-terms=".term-2"></span>
</div>
"#;

/// Attribute-protocol and legacy conditional content.
pub const CONDITIONAL: &str = r#"
<form id="plea_form" action="/plea">
  <input type="radio" name="plea" value="guilty" id="plea_guilty">
  <input type="radio" name="plea" value="not_guilty" id="plea_not_guilty">
  <div id="mitigation" data-conditional="plea" data-conditional-value="^guilty$">Mitigation</div>
  <div id="reasons" data-conditional="plea" data-conditional-value="not_guilty">Reasons</div>
  <select name="court" id="court">
    <option value="">Choose</option>
    <option value="manchester">Manchester</option>
    <option value="leeds">Leeds</option>
  </select>
  <div class="js-Conditional" id="court_details" data-conditional-trigger="court"
       data-conditional-value="manchester|leeds">Court details</div>
  <input type="checkbox" name="interpreter" value="yes" id="interpreter">
  <div id="language" data-conditional="interpreter" data-conditional-value="yes">Language</div>
</form>
"#;

/// Templated text driven by a radio group, with a delegate target.
pub const TEMPLATED: &str = r##"
<div class="test_control">
  <input id="radio_1" name="testField" type="radio" value="one">
  <input id="radio_2" name="testField" type="radio" value="two">
  <input id="radio_3" name="testField" type="radio" value="three ignored">
  <div id="templated" class="js-TemplatedElement" data-template-trigger="testField"
       data-template="Templated content, value = {value}"
       data-template-defaults-for="three ignored">Default content</div>
  <div id="delegating" class="js-TemplatedElement" data-template-trigger="testField"
       data-template="Delegated {value}" data-template-delegate="#delegate">unused</div>
  <p id="delegate">Another element</p>
</div>
"##;

/// Disclosure widget with an open-state summary.
pub const DETAILS: &str = r##"
<div class="js-Details" id="details" data-summary-open="Hide details">
  <a class="details-trigger" id="trigger" href="#details-content"><span class="summary" id="summary">View details</span></a>
  <div class="details-content" id="details-content">Content</div>
</div>
"##;

/// Radio and checkbox labels in two forms.
pub const SELECTION: &str = r#"
<form id="first">
  <label id="label_1"><input type="radio" name="choice" value="1" id="choice_1"> One</label>
  <label id="label_2"><input type="radio" name="choice" value="2" id="choice_2" checked> Two</label>
  <label id="label_3"><input type="radio" name="choice" value="3" id="choice_3"> Three</label>
  <label id="label_check"><input type="checkbox" name="agree" value="yes" id="agree"> Agree</label>
</form>
<form id="second">
  <label id="label_other"><input type="radio" name="choice" value="1" id="other_1" checked> One</label>
</form>
"#;

/// Form watched by the unsaved-changes guard.
pub const GUARD: &str = r#"
<form id="details_form" action="/details">
  <input type="text" name="testField" id="field" value="test value">
  <input type="submit" value="Continue" id="continue">
</form>
"#;

/// Guard page whose message and deadline come from an inline script.
pub const GUARD_INLINE: &str = r#"
<script>
  var promptOnChangeMessage = "Your answers will be lost";
  var sessionTimeout = 1700000600;
</script>
<form id="details_form"><input type="text" name="name" id="field" value=""></form>
"#;

/// Error summary linking to four sections, plus a skip link.
pub const ERROR_SUMMARY: &str = r##"
<a class="skiplink" id="skip" href="#content">Skip to content</a>
<main id="content">
  <div class="error-summary" id="errors">
    <ul>
      <li><a id="link_1" href="#section_1">Name</a></li>
      <li><a id="link_2" href="#section_2">Plea</a></li>
      <li><a id="link_3" href="#section_3">Mitigation</a></li>
      <li><a id="link_4" href="#section_4">Court</a></li>
    </ul>
  </div>
  <div id="section_1"><label>Name <input type="text" id="field_1" name="name"></label></div>
  <div id="section_2"><input type="radio" name="plea" id="field_2"><input type="radio" name="plea"></div>
  <div id="section_3"><textarea id="field_3" name="mitigation"></textarea></div>
  <div id="section_4"><select id="field_4" name="court"><option>Manchester</option></select></div>
</main>
"##;

/// External links and a button-role link.
pub const LINKS: &str = r#"
<a href="http://www.example.com" rel="external" id="external">Example</a>
<a href="http://www.example.com/new" rel="external" target="_blank" id="external_blank">New window</a>
<a href="/plea/guilty" role="button" id="button_link">Guilty</a>
"#;
