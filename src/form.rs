//! HTML test form for manual predictions.

use crate::metadata::FeatureSpec;

const SCRIPT: &str = r#"    <script>
      const form = document.getElementById('predictForm');
      form.addEventListener('submit', async (e) => {
        e.preventDefault();
        const data = {};
        form.querySelectorAll('input').forEach(input => {
          const val = input.value;
          data[input.id] = val ? parseFloat(val) : null;
        });
        const res = await fetch('/predict', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(data)
        });
        const json = await res.json();
        document.getElementById('output').textContent = JSON.stringify(json, null, 2);
      });
    </script>
"#;

/// Render the form page with one numeric input per feature.
pub fn render_form(title: &str, spec: &FeatureSpec) -> String {
    let title = escape_html(title);
    let mut html = String::with_capacity(1024 + spec.len() * 96);
    html.push_str("<!DOCTYPE html>\n<html>\n  <head>\n");
    html.push_str("    <meta charset=\"utf-8\">\n");
    html.push_str(&format!("    <title>{title}</title>\n"));
    html.push_str("  </head>\n  <body>\n");
    html.push_str(&format!("    <h2>{title}</h2>\n"));
    html.push_str("    <form id=\"predictForm\">\n");
    for name in spec.names() {
        let name = escape_html(name);
        html.push_str(&format!(
            "      <label>{name}: <input id=\"{name}\" type=\"number\" step=\"any\"></label><br/>\n"
        ));
    }
    html.push_str("      <button type=\"submit\">Predict</button>\n");
    html.push_str("    </form>\n");
    html.push_str("    <pre id=\"output\"></pre>\n");
    html.push_str(SCRIPT);
    html.push_str("  </body>\n</html>\n");
    html
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
