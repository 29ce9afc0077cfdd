//! Scaffold a widget project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing widgetkit...");

    let files: [(&str, &str); 4] = [
        ("widgetkit.toml", DEFAULT_CONFIG),
        ("package.json", DEFAULT_PACKAGE),
        ("src/index.css", DEFAULT_GLOBAL_CSS),
        ("src/components/example/index.tsx", DEFAULT_WIDGET),
    ];

    for (relative, content) in files {
        let path = root.join(relative);

        if path.exists() && !yes {
            tracing::warn!("{} already exists. Use --yes to overwrite.", relative);
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))?;
        tracing::info!("Created {}", relative);
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'widgetkit dev' to build and serve your widgets.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# widgetkit configuration

[build]
# Directory scanned for <widget>/index.tsx entries
source_dir = "src"

# Output directory (wiped on every build)
out_dir = "assets"

# Stylesheets bundled into every widget, before the widget's own
global_styles = ["src/index.css"]

# Build only these widgets (empty builds all)
targets = []

minify = true

[assets]
# Public URL the output directory is served from.
# BASE_URL and TELEMETRY_URL in the environment take precedence.
base_url = "http://localhost:4444/assets"
# telemetry_url = "https://telemetry.example.com"

[bundler]
# command = "node_modules/.bin/esbuild"
target = "es2022"
"#;

const DEFAULT_PACKAGE: &str = r#"{
  "name": "widgets",
  "version": "0.1.0",
  "private": true,
  "type": "module",
  "devDependencies": {
    "esbuild": "^0.25.0"
  },
  "dependencies": {
    "react": "^19.0.0",
    "react-dom": "^19.0.0"
  }
}
"#;

const DEFAULT_GLOBAL_CSS: &str = r#"*,
*::before,
*::after {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, sans-serif;
}
"#;

const DEFAULT_WIDGET: &str = r#"import { createRoot } from "react-dom/client";

function App() {
  return (
    <div style={{ padding: "1rem" }}>
      <h1>Hello from the example widget</h1>
    </div>
  );
}

const rootEl = document.getElementById("example-root");
if (rootEl) {
  createRoot(rootEl).render(<App />);
}

export default App;
export { App };
"#;
