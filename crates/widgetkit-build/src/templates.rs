//! Template engine for the widget HTML documents.

use minijinja::{context, Environment};

/// Context for rendering one widget's HTML document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WidgetPage {
    /// Widget name
    pub name: String,

    /// Content hash shared by the whole build
    pub hash: String,

    /// Asset base URL (no trailing slash)
    pub asset_base: String,

    /// Telemetry endpoint, if configured
    pub telemetry_url: Option<String>,

    /// Whether a hashed stylesheet exists for this widget
    pub has_stylesheet: bool,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the widget template.
    pub fn new() -> Self {
        let mut env = Environment::new();

        // No file extension on the name: attribute values are URLs and must
        // not pass through HTML auto-escaping.
        env.add_template_owned("widget".to_string(), WIDGET_TEMPLATE.to_string())
            .expect("Failed to add widget template");

        Self { env }
    }

    /// Render the HTML document for one widget.
    pub fn render_widget(&self, page: &WidgetPage) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("widget")?;

        tmpl.render(context! {
            name => &page.name,
            hash => &page.hash,
            asset_base => &page.asset_base,
            telemetry_url => &page.telemetry_url,
            has_stylesheet => page.has_stylesheet,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

const WIDGET_TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="widget-domain" content="{{ asset_base }}">
  <meta name="widget-id" content="{{ name }}">
{%- if telemetry_url %}
  <meta name="telemetry-url" content="{{ telemetry_url }}">
{%- endif %}
  <script type="module" src="{{ asset_base }}/{{ name }}-{{ hash }}.js"></script>
{%- if has_stylesheet %}
  <link rel="stylesheet" href="{{ asset_base }}/{{ name }}-{{ hash }}.css">
{%- endif %}
</head>
<body>
  <div id="{{ name }}-root"></div>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page() -> WidgetPage {
        WidgetPage {
            name: "w".to_string(),
            hash: "h1a2".to_string(),
            asset_base: "https://cdn.example.com/assets".to_string(),
            telemetry_url: None,
            has_stylesheet: true,
        }
    }

    #[test]
    fn renders_full_document() {
        let html = TemplateEngine::new().render_widget(&page()).unwrap();

        assert_eq!(
            html.trim_end(),
            r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="widget-domain" content="https://cdn.example.com/assets">
  <meta name="widget-id" content="w">
  <script type="module" src="https://cdn.example.com/assets/w-h1a2.js"></script>
  <link rel="stylesheet" href="https://cdn.example.com/assets/w-h1a2.css">
</head>
<body>
  <div id="w-root"></div>
</body>
</html>"#
        );
    }

    #[test]
    fn includes_telemetry_meta_when_configured() {
        let page = WidgetPage {
            telemetry_url: Some("https://t.example.com".to_string()),
            ..page()
        };

        let html = TemplateEngine::new().render_widget(&page).unwrap();

        assert!(html.contains(r#"<meta name="telemetry-url" content="https://t.example.com">"#));
    }

    #[test]
    fn omits_stylesheet_link_without_stylesheet() {
        let page = WidgetPage {
            has_stylesheet: false,
            ..page()
        };

        let html = TemplateEngine::new().render_widget(&page).unwrap();

        assert!(!html.contains("<link"));
        assert!(html.contains(r#"src="https://cdn.example.com/assets/w-h1a2.js""#));
    }
}
