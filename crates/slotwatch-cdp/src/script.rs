//! In-page helpers evaluated through `Runtime.evaluate`.
//!
//! Elements are tagged with an integer ref on first sight and kept in a
//! `WeakRef` table on `window.__sw`. A navigation wipes the table, so old
//! refs resolve to `null` and surface as absent.

use serde_json::{Value, json};
use slotwatch_core::{ElementHandle, Query, Selector, TextMatch};

/// Installs `window.__sw` once per document.
pub const PRELUDE: &str = r#"(() => {
  if (window.__sw) return;
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
  const test = (m, s) => ('contains' in m)
    ? norm(s).includes(norm(m.contains))
    : new RegExp(m.pattern, 'i').test(s || '');
  const ROLES = {
    button: 'button,[role="button"],input[type="button"],input[type="submit"]',
    dialog: 'dialog,[role="dialog"],[role="alertdialog"]',
  };
  const sw = { refs: new Map(), next: 1 };
  sw.tag = (el) => {
    if (!el.__swRef) {
      el.__swRef = sw.next++;
      sw.refs.set(el.__swRef, new WeakRef(el));
    }
    return el.__swRef;
  };
  sw.el = (id) => {
    const ref = sw.refs.get(id);
    const el = ref && ref.deref();
    return el && el.isConnected ? el : null;
  };
  sw.text = (el) => (el.innerText !== undefined ? el.innerText : el.textContent) || '';
  sw.name = (el) => el.getAttribute('aria-label') || sw.text(el);
  sw.byRole = (root, role) =>
    Array.from(root.querySelectorAll(ROLES[role] || `[role="${role}"]`));
  sw.visible = (el) => {
    const r = el.getBoundingClientRect();
    const st = getComputedStyle(el);
    return r.width > 0 && r.height > 0 && st.visibility !== 'hidden' && st.display !== 'none';
  };
  sw.find = (q) => {
    let root = document;
    if (q.within) {
      root = sw.el(q.within);
      if (!root) return [];
    }
    let found = [];
    switch (q.kind) {
      case 'role':
        found = sw.byRole(root, q.role).filter((e) => !q.name || test(q.name, sw.name(e)));
        break;
      case 'role_text':
        found = sw.byRole(root, q.role).filter((e) => test(q.text, sw.text(e)));
        break;
      case 'attribute':
        found = sw.byRole(root, q.role).filter((e) =>
          e.hasAttribute(q.attribute) && (!q.value || test(q.value, e.getAttribute(q.attribute))));
        break;
      case 'text': {
        const scope = root === document ? document.body : root;
        if (!scope) return [];
        const hits = Array.from(scope.querySelectorAll('*')).filter((e) => test(q.text, sw.text(e)));
        found = hits.filter((e) => !hits.some((o) => o !== e && e.contains(o)));
        break;
      }
    }
    return found.map(sw.tag);
  };
  window.__sw = sw;
})()"#;

fn text_match(m: &TextMatch) -> Value {
    match m {
        TextMatch::Contains(needle) => json!({ "contains": needle }),
        TextMatch::Pattern(re) => json!({ "pattern": re.as_str() }),
    }
}

/// Encode a query for `__sw.find`.
pub fn query_spec(query: &Query) -> Value {
    let mut spec = match &query.selector {
        Selector::Role { role, name } => json!({
            "kind": "role",
            "role": role,
            "name": name.as_ref().map(text_match),
        }),
        Selector::RoleWithText { role, text } => json!({
            "kind": "role_text",
            "role": role,
            "text": text_match(text),
        }),
        Selector::Text(text) => json!({
            "kind": "text",
            "text": text_match(text),
        }),
        Selector::Attribute {
            role,
            attribute,
            value,
        } => json!({
            "kind": "attribute",
            "role": role,
            "attribute": attribute,
            "value": value.as_ref().map(text_match),
        }),
    };
    spec["within"] = query.within.map_or(Value::Null, |h| json!(h.0));
    spec
}

pub fn find(query: &Query) -> String {
    format!("{};window.__sw.find({})", PRELUDE, query_spec(query))
}

/// Run `body` with `el` bound to the referenced element; `null` when stale.
pub fn on_element(handle: ElementHandle, body: &str) -> String {
    format!(
        "{};(() => {{ const el = window.__sw.el({}); if (!el) return null; {} }})()",
        PRELUDE, handle.0, body
    )
}

pub const IS_VISIBLE: &str = "return window.__sw.visible(el);";

pub const INNER_TEXT: &str = "return window.__sw.text(el);";

pub const BOUNDING_BOX: &str =
    "const r = el.getBoundingClientRect(); return { x: r.x, y: r.y, width: r.width, height: r.height };";

/// Scroll into view, then report the click point. `null` when not clickable.
pub const CLICK_POINT: &str = "el.scrollIntoView({ block: 'center', inline: 'center' }); \
     if (!window.__sw.visible(el)) return null; \
     const r = el.getBoundingClientRect(); \
     return { x: r.x + r.width / 2, y: r.y + r.height / 2 };";

pub fn attribute(name: &str) -> String {
    format!("return el.getAttribute({});", json!(name))
}

pub const BODY_TEXT: &str = "document.body ? document.body.innerText : ''";

/// Flags the current document so its replacement can be told apart.
pub const MARK_DOCUMENT: &str = "window.__swOutgoing = true";

/// `"stale"` while the flagged document is still the current one.
pub const READY_STATE: &str = "window.__swOutgoing ? 'stale' : document.readyState";
