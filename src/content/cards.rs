//! Ghost toggle cards
//!
//! Toggle cards arrive from Ghost as static markup. The server makes sure
//! every card starts in a known state and the page ships a small script that
//! flips `data-kg-toggle-state` when the heading or icon is clicked.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

const TOGGLE_CARD_CLASS: &str = "kg-toggle-card";
const STATE_ATTR: &str = "data-kg-toggle-state";

lazy_static! {
    /// An opening tag with a class attribute
    static ref CLASSED_TAG: Regex = Regex::new(
        r#"<([a-zA-Z][a-zA-Z0-9]*)(\s[^>]*?\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*?)(\s*/?)>"#
    )
    .unwrap();
}

/// Client-side toggle behaviour, injected before `</body>`
pub const TOGGLE_CARD_SCRIPT: &str = r#"
<script>
(function() {
    var handlers = [];
    function init() {
        document.querySelectorAll('.kg-toggle-card').forEach(function(card) {
            var button = card.querySelector('.kg-toggle-card-icon');
            var heading = card.querySelector('.kg-toggle-heading');
            if (!button || !heading) return;
            var handleClick = function(e) {
                e.preventDefault();
                var state = card.getAttribute('data-kg-toggle-state');
                card.setAttribute('data-kg-toggle-state', state === 'close' ? 'open' : 'close');
            };
            button.addEventListener('click', handleClick);
            heading.addEventListener('click', handleClick);
            handlers.push([button, handleClick], [heading, handleClick]);
        });
    }
    function cleanup() {
        handlers.forEach(function(h) { h[0].removeEventListener('click', h[1]); });
        handlers = [];
    }
    if (document.readyState === 'loading') {
        document.addEventListener('DOMContentLoaded', init);
    } else {
        init();
    }
    window.addEventListener('pagehide', cleanup);
})();
</script>
</body>
"#;

/// Whether the fragment contains any toggle card
pub fn has_toggle_cards(html: &str) -> bool {
    CLASSED_TAG.captures_iter(html).any(|caps| is_toggle_card(&caps))
}

/// Give every toggle card without a state a closed state
pub fn normalize_toggle_cards(html: &str) -> String {
    CLASSED_TAG
        .replace_all(html, |caps: &Captures| {
            let whole = &caps[0];
            if !is_toggle_card(caps) || caps[2].contains(STATE_ATTR) {
                return whole.to_string();
            }
            format!(
                r#"<{}{} {}="close"{}>"#,
                &caps[1], &caps[2], STATE_ATTR, &caps[5]
            )
        })
        .into_owned()
}

/// Inject the toggle script into a full HTML page
pub fn inject_script(page: &str) -> String {
    if let Some(pos) = page.rfind("</body>") {
        let mut out = String::with_capacity(page.len() + TOGGLE_CARD_SCRIPT.len());
        out.push_str(&page[..pos]);
        out.push_str(TOGGLE_CARD_SCRIPT);
        out.push_str(&page[pos + "</body>".len()..]);
        out
    } else {
        // no </body>, append to end
        format!("{}{}", page, TOGGLE_CARD_SCRIPT)
    }
}

fn is_toggle_card(caps: &Captures) -> bool {
    caps.get(3)
        .or_else(|| caps.get(4))
        .map(|m| m.as_str().split_whitespace().any(|c| c == TOGGLE_CARD_CLASS))
        .unwrap_or(false)
}
