//! Base-URL substitution on rendered markup.
//!
//! Pages are rendered under the host's base URL (or a placeholder when the
//! host has none) and must be portable afterwards. Templates emit that base
//! in more than one encoding, so the rewrite runs five passes, in order:
//!
//! | # | Search | Replace |
//! |---|--------|---------|
//! | 1 | `original/` | `target/` |
//! | 2 | `original` | `target`, or `/` if the target is empty |
//! | 3 | JSON `original\/` | JSON `target\/` |
//! | 4 | JSON `original` | JSON `target`, or `\/` if empty |
//! | 5 | HTML-entity escaped `placeholder/` | `target/` |
//!
//! Pass 5 keeps the separator it consumed: an escaped
//! `placeholder/og.png` becomes `target/og.png`, not `targetog.png`.
//!
//! The trailing-slash passes run first so that `https://example.com/blog`
//! becomes `/blog` rather than `//blog` when the target is empty.
//!
//! JSON escaping follows the common server-side convention of escaping `/`
//! as `\/`, which is how absolute URLs show up in inline script data.

/// Base URL used while rendering when the host has none configured.
pub const PLACEHOLDER_BASE_URL: &str = "https://sitefreeze-base-url";

/// Rewrites one original base URL to one target base URL.
#[derive(Debug, Clone)]
pub struct UrlRewriter {
    original: String,
    target: String,
    json_original: String,
    json_target: String,
    entity_placeholder: String,
}

impl UrlRewriter {
    pub fn new(original: &str, target: &str) -> Self {
        Self {
            original: original.to_string(),
            target: target.to_string(),
            json_original: json_escape(original),
            json_target: json_escape(target),
            entity_placeholder: html_entity_escape(&format!("{PLACEHOLDER_BASE_URL}/")),
        }
    }

    pub fn rewrite(&self, markup: &str) -> String {
        let mut content = markup.to_string();

        // An empty search string would match between every character.
        if !self.original.is_empty() {
            let bare_target = if self.target.is_empty() {
                "/"
            } else {
                self.target.as_str()
            };
            content = content.replace(
                &format!("{}/", self.original),
                &format!("{}/", self.target),
            );
            content = content.replace(&self.original, bare_target);

            let json_bare_target = if self.json_target.is_empty() {
                r"\/"
            } else {
                self.json_target.as_str()
            };
            content = content.replace(
                &format!(r"{}\/", self.json_original),
                &format!(r"{}\/", self.json_target),
            );
            content = content.replace(&self.json_original, json_bare_target);
        }

        content.replace(&self.entity_placeholder, &format!("{}/", self.target))
    }
}

/// JSON string escaping without the surrounding quotes, with `/` escaped.
pub fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    let inner = &quoted[1..quoted.len() - 1];
    inner.replace('/', r"\/")
}

/// Escape for an HTML attribute context: everything except ASCII
/// alphanumerics and `,._-` becomes a hex character reference.
pub fn html_entity_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() * 2);
    for c in value.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, ',' | '.' | '_' | '-') {
            escaped.push(c);
        } else {
            escaped.push_str(&format!("&#x{:02X};", c as u32));
        }
    }
    escaped
}
