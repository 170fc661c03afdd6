//! In-page collector script.
//!
//! Evaluated once per page. Keeps a stable element→id mapping alive in a
//! WeakMap so that snapshot keys and mutation-batch keys agree, and
//! relays mutation batches through the CDP binding.

/// Name of the CDP binding the collector emits through.
pub(crate) const BINDING_NAME: &str = "__autoreplyEmit";

pub(crate) const COLLECTOR_JS: &str = r#"
(() => {
  if (window.__autoreplySnapshot) return;
  let nextId = 1;
  const ids = new WeakMap();
  const byId = new Map();

  const keyOf = (el) => {
    let id = ids.get(el);
    if (!id) {
      id = nextId++;
      ids.set(el, id);
      byId.set(id, el);
    }
    return id;
  };
  const lookup = (id) => {
    const el = byId.get(id);
    return el && el.isConnected ? el : null;
  };
  const ownText = (el) => {
    let text = '';
    for (const child of el.childNodes) {
      if (child.nodeType === Node.TEXT_NODE) text += child.textContent;
    }
    return text;
  };
  const serialize = (el, nodes, parent) => {
    const id = keyOf(el);
    const attrs = {};
    for (const a of el.attributes) attrs[a.name] = a.value;
    const entry = {
      id,
      tag: el.tagName.toLowerCase(),
      attrs,
      classes: Array.from(el.classList),
      text: ownText(el),
      children: [],
      parent,
    };
    nodes.push(entry);
    for (const child of el.children) entry.children.push(serialize(child, nodes, id));
    return id;
  };

  window.__autoreplySnapshot = () => {
    const nodes = [];
    const root = serialize(document.body, nodes, null);
    return JSON.stringify({ root, nodes });
  };

  let nextObserver = 1;
  window.__autoreplyObserve = (rootId) => {
    const el = rootId ? lookup(rootId) : document.body;
    if (!el) return 0;
    const observerId = nextObserver++;
    const observer = new MutationObserver((mutations) => {
      const added = [];
      for (const mutation of mutations) {
        for (const node of mutation.addedNodes) {
          if (node.nodeType === Node.ELEMENT_NODE) added.push(keyOf(node));
        }
      }
      if (added.length && window.__autoreplyEmit) {
        window.__autoreplyEmit(JSON.stringify({ type: 'mutation', observer: observerId, added }));
      }
    });
    observer.observe(el, { childList: true, subtree: true });
    return observerId;
  };

  window.__autoreplyClick = (id) => {
    const el = lookup(id);
    if (!el) return false;
    el.click();
    return true;
  };
  window.__autoreplyFocus = (id) => {
    const el = lookup(id);
    if (!el) return false;
    el.focus();
    return true;
  };
  window.__autoreplyClear = (id) => {
    const el = lookup(id);
    if (!el) return false;
    el.textContent = '';
    return true;
  };
  window.__autoreplyInsert = (id, text) => {
    const el = lookup(id);
    if (!el) return false;
    el.textContent = text;
    return true;
  };
  window.__autoreplyInput = (id) => {
    const el = lookup(id);
    if (!el) return false;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    return true;
  };
  window.__autoreplyEnter = (id) => {
    const el = lookup(id);
    if (!el) return false;
    el.dispatchEvent(new KeyboardEvent('keydown', {
      key: 'Enter', code: 'Enter', keyCode: 13, which: 13, bubbles: true,
    }));
    return true;
  };
  window.__autoreplyNavigate = (target) => {
    const link = document.querySelector('[data-qa="' + target + '"]')
      || document.querySelector('a[href*="' + target + '"]');
    if (!link) return false;
    link.click();
    return true;
  };
})();
"#;
