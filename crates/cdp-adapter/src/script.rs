//! In-page element resolution
//!
//! Each query is a self-contained expression: the serialized [`Locator`] is
//! embedded as a JSON literal, resolved against the live document, and the
//! requested operation applied to the first match.

use action_primitives::Locator;
use serde::Deserialize;

use crate::error::{AdapterError, AdapterErrorKind};

/// Operation applied to the resolved elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Query<'a> {
    Count,
    Visible,
    Click,
    Fill(&'a str),
    Check,
    InnerText,
}

/// Reply shape for the mutating and text queries.
#[derive(Debug, Deserialize)]
pub(crate) struct Outcome {
    pub ok: bool,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl Outcome {
    pub fn into_result(self, locator: &Locator) -> Result<Option<String>, AdapterError> {
        if self.ok {
            return Ok(self.text);
        }
        let kind = match self.reason.as_deref() {
            Some("missing") => AdapterErrorKind::TargetNotFound,
            _ => AdapterErrorKind::NotInteractable,
        };
        Err(AdapterError::new(kind).with_hint(locator.to_string()))
    }
}

const RESOLVER: &str = r#"
const norm = (s) => (s || "").replace(/\s+/g, " ").trim();
const textMatches = (m, candidate) => {
  const c = norm(candidate);
  if (m.mode === "exact") return c === norm(m.text);
  return c.toLowerCase().includes(norm(m.text).toLowerCase());
};
const labelText = (el) => {
  const parts = [];
  if (el.labels) for (const l of el.labels) parts.push(l.innerText || l.textContent);
  const by = el.getAttribute("aria-labelledby");
  if (by) for (const id of by.split(/\s+/)) {
    const n = document.getElementById(id);
    if (n) parts.push(n.textContent);
  }
  return norm(parts.join(" "));
};
const accessibleName = (el) => {
  const aria = el.getAttribute("aria-label");
  if (aria) return norm(aria);
  const tag = el.tagName.toLowerCase();
  if (tag === "input" || tag === "textarea" || tag === "select") {
    const labelled = labelText(el);
    if (labelled) return labelled;
    const type = (el.type || "").toLowerCase();
    return ["submit", "button", "reset"].includes(type) ? norm(el.value) : "";
  }
  return norm(el.innerText || el.textContent);
};
const ROLES = {
  heading: "h1,h2,h3,h4,h5,h6,[role=heading]",
  button: "button,input[type=submit],input[type=button],input[type=reset],[role=button]",
  link: "a[href],[role=link]",
  radio: "input[type=radio],[role=radio]",
  checkbox: "input[type=checkbox],[role=checkbox]",
  textbox: "input:not([type]),input[type=text],input[type=tel],input[type=email],input[type=number],input[type=password],input[type=search],textarea,[role=textbox]",
};
const all = (selector) => Array.from(document.querySelectorAll(selector));
const find = (spec) => {
  switch (spec.kind) {
    case "role":
      return all(ROLES[spec.role] || "*").filter((el) => textMatches(spec.name, accessibleName(el)));
    case "label": {
      const out = [];
      for (const label of all("label")) {
        if (!textMatches(spec.label, label.innerText || label.textContent)) continue;
        const control = label.control || (label.htmlFor && document.getElementById(label.htmlFor));
        if (control && !out.includes(control)) out.push(control);
      }
      for (const el of all("[aria-label]")) {
        if (textMatches(spec.label, el.getAttribute("aria-label")) && !out.includes(el)) out.push(el);
      }
      return out;
    }
    case "css":
      return all(spec.selector);
    case "css_with_text": {
      const needle = { mode: "contains", text: spec.text };
      return all(spec.selector).filter((el) => textMatches(needle, el.innerText || el.textContent));
    }
    case "description_value": {
      const needle = { mode: "contains", text: spec.term };
      const out = [];
      for (const dt of all("dt")) {
        if (!textMatches(needle, dt.innerText || dt.textContent)) continue;
        let sib = dt.nextElementSibling;
        while (sib && sib.tagName.toLowerCase() !== "dd") sib = sib.nextElementSibling;
        if (sib) out.push(sib);
      }
      return out;
    }
    case "body":
      return document.body ? [document.body] : [];
  }
  return [];
};
const isVisible = (el) => {
  if (!el.isConnected) return false;
  const style = window.getComputedStyle(el);
  if (style.visibility === "hidden" || style.display === "none") return false;
  const rect = el.getBoundingClientRect();
  return rect.width > 0 || rect.height > 0;
};
const matches = find(spec);
const el = matches[0];
"#;

const COUNT: &str = "return matches.length;";

const VISIBLE: &str = "return !!el && isVisible(el);";

const CLICK: &str = r#"
if (!el) return { ok: false, reason: "missing" };
if (el.disabled) return { ok: false, reason: "disabled" };
el.scrollIntoView({ block: "center" });
el.click();
return { ok: true };
"#;

const FILL: &str = r#"
if (!el) return { ok: false, reason: "missing" };
if (!("value" in el) || el.disabled || el.readOnly) return { ok: false, reason: "not-editable" };
el.focus();
const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
const setter = Object.getOwnPropertyDescriptor(proto, "value").set;
setter.call(el, value);
el.dispatchEvent(new Event("input", { bubbles: true }));
el.dispatchEvent(new Event("change", { bubbles: true }));
return { ok: true };
"#;

const CHECK: &str = r#"
if (!el) return { ok: false, reason: "missing" };
if (el.disabled) return { ok: false, reason: "disabled" };
if (!el.checked) el.click();
if (!el.checked) {
  el.checked = true;
  el.dispatchEvent(new Event("change", { bubbles: true }));
}
return { ok: true };
"#;

const INNER_TEXT: &str = r#"
if (!el) return { ok: false, reason: "missing" };
return { ok: true, text: el.innerText || el.textContent || "" };
"#;

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, AdapterError> {
    serde_json::to_string(value).map_err(|err| {
        AdapterError::new(AdapterErrorKind::Internal).with_hint(format!("encode query: {err}"))
    })
}

/// Expression evaluating `query` against the first element matching `locator`.
pub(crate) fn build(locator: &Locator, query: Query<'_>) -> Result<String, AdapterError> {
    let mut script = String::from("(() => {\n");
    script.push_str(&format!("const spec = {};\n", to_json(locator)?));
    if let Query::Fill(value) = query {
        script.push_str(&format!("const value = {};\n", to_json(value)?));
    }
    script.push_str(RESOLVER);
    script.push_str(match query {
        Query::Count => COUNT,
        Query::Visible => VISIBLE,
        Query::Click => CLICK,
        Query::Fill(_) => FILL,
        Query::Check => CHECK,
        Query::InnerText => INNER_TEXT,
    });
    script.push_str("\n})()");
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_primitives::TextMatch;

    #[test]
    fn embeds_locator_as_json() {
        let locator = Locator::button(TextMatch::exact("Continue"));
        let script = build(&locator, Query::Count).unwrap();
        assert!(script.contains(
            r#"const spec = {"kind":"role","role":"button","name":{"mode":"exact","text":"Continue"}};"#
        ));
        assert!(script.trim_end().ends_with("})()"));
        assert!(script.contains("return matches.length;"));
    }

    #[test]
    fn fill_value_is_escaped() {
        let locator = Locator::label(TextMatch::contains("Security code"));
        let script = build(&locator, Query::Fill("12\"3</script>")).unwrap();
        assert!(script.contains(r#"const value = "12\"3</script>";"#));
    }

    #[test]
    fn outcome_maps_missing_to_not_found() {
        let locator = Locator::css("a.govuk-button");
        let outcome: Outcome = serde_json::from_str(r#"{"ok":false,"reason":"missing"}"#).unwrap();
        let err = outcome.into_result(&locator).unwrap_err();
        assert_eq!(err.kind, AdapterErrorKind::TargetNotFound);

        let outcome: Outcome = serde_json::from_str(r#"{"ok":true,"text":"JANE DOE"}"#).unwrap();
        assert_eq!(
            outcome.into_result(&locator).unwrap().as_deref(),
            Some("JANE DOE")
        );
    }
}
