//! Static HTML template assembly.

use super::sink::{MetricRow, RenderBlock};

const STYLE: &str = "
body { font-family: 'Segoe UI', Arial, sans-serif; margin: 0; background: #f5f6f8; color: #2b2b2b; }
header { background: #2c3e50; color: #fff; padding: 18px 32px; }
header h1 { margin: 0; font-size: 22px; }
main { max-width: 1360px; margin: 0 auto; padding: 16px 32px 48px; }
h2.section { border-bottom: 2px solid #2c3e50; padding-bottom: 4px; margin-top: 36px; }
h3.block-title { margin: 28px 0 8px; color: #2c3e50; }
p.block-text { margin: 6px 0; }
table.metrics { border-collapse: collapse; margin: 8px 0 16px; }
table.metrics th, table.metrics td { border: 1px solid #ccd1d9; padding: 4px 12px; text-align: left; }
table.metrics th { background: #e8ebef; }
img.chart { max-width: 100%; border: 1px solid #ccd1d9; background: #fff; margin: 8px 0; }
";

/// Assemble the final single-page report from both section block lists.
pub fn build_template(single_variable: &[RenderBlock], multi_variable: &[RenderBlock]) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Facet Profile Report</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str("<header><h1>Facet Profile Report</h1></header>\n<main>\n");

    render_section(&mut html, "Single Variable Analysis", single_variable);
    render_section(&mut html, "Column Relationships", multi_variable);

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn render_section(html: &mut String, heading: &str, blocks: &[RenderBlock]) {
    if blocks.is_empty() {
        return;
    }
    html.push_str(&format!("<h2 class=\"section\">{}</h2>\n", escape(heading)));
    for block in blocks {
        match block {
            RenderBlock::Title(title) => {
                html.push_str(&format!("<h3 class=\"block-title\">{}</h3>\n", escape(title)));
            }
            RenderBlock::Text(text) => {
                // Text blocks may carry intentional <br> line breaks.
                html.push_str(&format!("<p class=\"block-text\">{}</p>\n", text));
            }
            RenderBlock::Table(rows) => render_table(html, rows),
            RenderBlock::Image(file_name) => {
                html.push_str(&format!(
                    "<img class=\"chart\" src=\"assets/{}\" alt=\"{}\">\n",
                    escape(file_name),
                    escape(file_name)
                ));
            }
            RenderBlock::Break => html.push_str("<br>\n"),
        }
    }
}

fn render_table(html: &mut String, rows: &[MetricRow]) {
    html.push_str("<table class=\"metrics\">\n<tr><th>metric</th><th>value</th></tr>\n");
    for row in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(&row.metric),
            escape(&row.value)
        ));
    }
    html.push_str("</table>\n");
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_contains_sections() {
        let single = vec![
            RenderBlock::Title("age".into()),
            RenderBlock::Table(vec![MetricRow {
                metric: "Row Count".into(),
                value: "10".into(),
            }]),
        ];
        let multi = vec![RenderBlock::Image("facet_pairs.svg".into())];

        let html = build_template(&single, &multi);
        assert!(html.contains("Single Variable Analysis"));
        assert!(html.contains("Column Relationships"));
        assert!(html.contains("assets/facet_pairs.svg"));
        assert!(html.contains("Row Count"));
    }

    #[test]
    fn test_empty_section_omitted() {
        let html = build_template(&[], &[]);
        assert!(!html.contains("Single Variable Analysis"));
    }

    #[test]
    fn test_escaping() {
        let single = vec![RenderBlock::Title("a<b".into())];
        let html = build_template(&single, &[]);
        assert!(html.contains("a&lt;b"));
    }
}
