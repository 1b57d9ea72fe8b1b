use anyhow::Result;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::control::{Action, Binding};
use crate::group::{self, ActivityGroup, Granularity};
use crate::types::ActivityRecord;
use crate::view::{needs_pagination, page_count, page_window, Direction, ViewState};

/// Markup plus the interaction bindings for every enabled element in it.
///
/// The renderer is the single source of truth for element ids: a binding
/// exists exactly when an enabled interactive element was rendered, so
/// the registry can never resolve an id the markup does not contain.
pub struct RenderedView {
    pub markup: Markup,
    pub bindings: Vec<Binding>,
}

/// Render the control's whole subtree for the given view state.
pub fn render_timeline(records: &[ActivityRecord], view: &ViewState) -> RenderedView {
    let mut bindings = Vec::new();

    if records.is_empty() {
        let markup = html! {
            div.no-activities { "No activities found" }
        };
        return RenderedView { markup, bindings };
    }

    let groups = group::group_and_order(records, view.granularity);
    let selector = render_view_selector(view.granularity, &mut bindings);

    let paginate_dates = needs_pagination(groups.len());
    let window = if paginate_dates {
        page_window(view.page, groups.len())
    } else {
        0..groups.len()
    };
    let group_markup: Vec<Markup> = groups[window]
        .iter()
        .map(|group| render_group(group, view, &mut bindings))
        .collect();
    let date_pagination = paginate_dates.then(|| {
        render_pagination(
            "prev-date-page".to_string(),
            "next-date-page".to_string(),
            Action::DatePage(Direction::Previous),
            Action::DatePage(Direction::Next),
            view.page,
            page_count(groups.len()),
            &mut bindings,
        )
    });

    let markup = html! {
        (selector)
        div.timeline-container {
            @for group in group_markup { (group) }
            @if let Some(pagination) = date_pagination { (pagination) }
        }
    };

    RenderedView { markup, bindings }
}

fn render_view_selector(active: Granularity, bindings: &mut Vec<Binding>) -> Markup {
    for granularity in Granularity::ALL {
        bindings.push(Binding::new(
            view_target(granularity),
            Action::SelectView(granularity),
        ));
    }

    html! {
        div.view-selector {
            @for granularity in Granularity::ALL {
                button
                    id=(view_target(granularity))
                    data-action=(view_target(granularity))
                    aria-pressed=(if granularity == active { "true" } else { "false" }) {
                    (granularity.label())
                }
            }
        }
    }
}

fn view_target(granularity: Granularity) -> String {
    format!("view-{granularity}")
}

/// One collapsible date group: header, item list, optional item pager.
///
/// Groups start collapsed; the header toggle is purely client-side and
/// never round-trips to the render state machine.
fn render_group(group: &ActivityGroup, view: &ViewState, bindings: &mut Vec<Binding>) -> Markup {
    let items = &group.records;
    let paginate_items = needs_pagination(items.len());
    let window = if paginate_items {
        page_window(view.page, items.len())
    } else {
        0..items.len()
    };
    let pagination = paginate_items.then(|| {
        render_pagination(
            format!("prev-page-{}", group.key),
            format!("next-page-{}", group.key),
            Action::GroupPage(Direction::Previous, group.key.clone()),
            Action::GroupPage(Direction::Next, group.key.clone()),
            view.page,
            page_count(items.len()),
            bindings,
        )
    });

    html! {
        div.timeline-group {
            div.timeline-group-header data-group=(group.key) aria-expanded="false" {
                span { (group.key) }
                span.toggle-icon { "▼" }
            }
            div.timeline-items {
                @for record in &items[window] { (render_activity_item(record)) }
            }
            @if let Some(pagination) = pagination { (pagination) }
        }
    }
}

fn render_activity_item(record: &ActivityRecord) -> Markup {
    let color = record.status().color();
    html! {
        div.activity-item
            data-record-id=(record.id)
            style={"border-left: 4px solid " (color) ";"} {
            div.subject { (record.display_subject()) }
            div.description { (record.display_description()) }
            div.dates { "Start: " (record.display_start()) ", End: " (record.display_end()) }
        }
    }
}

/// Previous / page label / Next. Boundary buttons render disabled and
/// get no binding, so a stale click can only resolve to a no-op.
fn render_pagination(
    prev_id: String,
    next_id: String,
    prev_action: Action,
    next_action: Action,
    page: usize,
    pages: usize,
    bindings: &mut Vec<Binding>,
) -> Markup {
    let prev_disabled = page <= 1;
    let next_disabled = page >= pages;
    if !prev_disabled {
        bindings.push(Binding::new(prev_id.clone(), prev_action));
    }
    if !next_disabled {
        bindings.push(Binding::new(next_id.clone(), next_action));
    }

    html! {
        div.pagination-controls {
            button id=(prev_id) data-action=(prev_id) disabled[prev_disabled] { "Previous" }
            span { "Page " (page) " of " (pages) }
            button id=(next_id) data-action=(next_id) disabled[next_disabled] { "Next" }
        }
    }
}

/// Wrap a rendered timeline subtree in the full page chrome.
pub fn render_page(timeline: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Cronovista" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    h1 { "Cronovista" }
                    div.timeline #"timeline" {
                        (PreEscaped(timeline))
                    }
                }
                script { (PreEscaped(JAVASCRIPT)) }
            }
        }
    }
}

/// Write a full page for the rendered timeline to disk (static build).
pub fn generate_html(timeline: &str, path: &Path) -> Result<()> {
    let page = render_page(timeline);
    fs::write(path, page.into_string())?;
    Ok(())
}

const CSS: &str = r#"
@import url('https://fonts.googleapis.com/css2?family=Inter:wght@400;700;900&display=swap');

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: 'Inter', -apple-system, BlinkMacSystemFont, sans-serif;
    background: #0a0a0a;
    color: #fff;
    min-height: 100vh;
    line-height: 1.4;
    overflow-x: hidden;
}

.container {
    max-width: 1000px;
    margin: 0 auto;
    padding: 40px 24px 60px;
}

h1 {
    color: #fff;
    font-weight: 900;
    font-size: 3em;
    letter-spacing: -0.03em;
    margin-bottom: 28px;
    text-transform: uppercase;
    text-shadow:
        0 0 10px rgba(255,0,150,0.5),
        3px 3px 0 #ff0096,
        -2px -2px 0 #00ffff;
}

.view-selector {
    display: flex;
    gap: 10px;
    margin-bottom: 36px;
}

.view-selector button {
    background: rgba(255,255,255,0.04);
    color: #ccc;
    border: 1px solid rgba(255,255,255,0.15);
    padding: 8px 18px;
    font-family: inherit;
    font-weight: 700;
    font-size: 0.8em;
    text-transform: uppercase;
    letter-spacing: 0.1em;
    cursor: pointer;
    transition: all 0.15s;
}

.view-selector button:hover {
    border-color: rgba(255,0,150,0.6);
    color: #fff;
}

.view-selector button[aria-pressed="true"] {
    background: linear-gradient(135deg, #ff0096, #00ffff);
    color: #000;
    border-color: #fff;
    box-shadow: 0 0 10px rgba(255,0,150,0.5);
}

.timeline-container {
    display: grid;
    gap: 32px;
}

.timeline-group {
    border-left: 4px solid;
    border-image: linear-gradient(180deg, #ff0096, #00ffff) 1;
    padding-left: 24px;
}

.timeline-group-header {
    display: flex;
    justify-content: space-between;
    align-items: center;
    color: #fff;
    font-weight: 900;
    font-size: 1.05em;
    text-transform: uppercase;
    letter-spacing: 0.12em;
    cursor: pointer;
    padding: 6px 0;
    text-shadow: 0 0 8px rgba(0,255,255,0.6);
    user-select: none;
}

.toggle-icon {
    color: #00ffff;
    font-size: 0.8em;
}

.timeline-items {
    max-height: 0;
    overflow: hidden;
    transition: max-height 0.25s ease;
}

.activity-item {
    padding: 16px;
    margin: 14px 0;
    background: rgba(255,255,255,0.03);
    border: 1px solid rgba(255,255,255,0.1);
    transition: all 0.2s;
}

.activity-item:hover {
    background: rgba(255,255,255,0.05);
    transform: translateX(4px);
}

.activity-item .subject {
    color: #fff;
    font-weight: 700;
    font-size: 1.05em;
    margin-bottom: 6px;
}

.activity-item .description {
    color: #ccc;
    font-size: 0.92em;
    line-height: 1.6;
}

.activity-item .dates {
    color: #888;
    font-size: 0.8em;
    margin-top: 8px;
    letter-spacing: 0.04em;
}

.pagination-controls {
    display: flex;
    align-items: center;
    gap: 14px;
    margin-top: 12px;
    color: #888;
    font-size: 0.85em;
}

.pagination-controls button {
    background: rgba(255,255,255,0.04);
    color: #ccc;
    border: 1px solid rgba(255,255,255,0.15);
    padding: 6px 14px;
    font-family: inherit;
    font-size: 0.9em;
    cursor: pointer;
}

.pagination-controls button:hover:not(:disabled) {
    border-color: rgba(0,255,255,0.6);
    color: #fff;
}

.pagination-controls button:disabled {
    opacity: 0.35;
    cursor: default;
}

.no-activities {
    padding: 60px 20px;
    text-align: center;
    color: #666;
    font-size: 0.95em;
}

@media (max-width: 768px) {
    h1 {
        font-size: 2.2em;
    }

    .container {
        padding: 30px 16px 40px;
    }
}
"#;

const JAVASCRIPT: &str = r#"
// Collapse/expand a date group. Purely visual: no server round-trip,
// so toggling never disturbs the current page or granularity.
document.querySelectorAll('.timeline-group-header').forEach((header) => {
    const items = header.nextElementSibling;
    if (!items) return;

    header.addEventListener('click', () => {
        const expanded = header.getAttribute('aria-expanded') === 'true';
        header.setAttribute('aria-expanded', String(!expanded));
        items.style.maxHeight = expanded ? '0px' : `${items.scrollHeight}px`;

        const icon = header.querySelector('.toggle-icon');
        if (icon) icon.textContent = expanded ? '▼' : '▲';
    });
});

// Granularity and pagination buttons round-trip through the host so the
// control re-renders with the new view state.
document.querySelectorAll('button[data-action]').forEach((button) => {
    button.addEventListener('click', () => {
        window.location.href = '/action/' + encodeURIComponent(button.dataset.action);
    });
});
"#;
