/// Wrap `body` in an `xview:view` root with extra root attributes
pub fn view(root_attrs: &str, body: &str) -> String {
    format!(
        r#"<xview:view xmlns:xview="xview" {}>{}</xview:view>"#,
        root_attrs, body
    )
}

/// A card component: title and tone defaults, child content inside the div
pub fn card() -> String {
    view(
        r#"xview:title="Untitled" xview:tone="plain""#,
        r#"<div class="card ${tone}"><h2>${title}</h2><xview:process_child_nodes/></div>"#,
    )
}

/// A layout component that only wraps its child content
pub fn layout() -> String {
    view("", "<body><xview:process_child_nodes/></body>")
}

/// The standard component directory
pub fn components() -> Vec<(&'static str, String)> {
    vec![
        ("/components/card.xview", card()),
        ("/components/layout.xview", layout()),
    ]
}
