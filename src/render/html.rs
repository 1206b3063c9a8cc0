use crate::render::svg::{self, escape};
use crate::render::{Dashboard, RawTable, RenderModel, Section, RAW_DATA_LABEL};

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 860px; margin: 2rem auto; color: #262730; }
h1 { font-size: 2rem; }
h2 { font-size: 1.3rem; margin-top: 2.2rem; }
.error { background: #ffe9e9; color: #7d1a1a; border-radius: 6px; padding: 1rem; }
details { border: 1px solid #ddd; border-radius: 6px; padding: .5rem 1rem; }
summary { cursor: pointer; }
.raw { max-height: 420px; overflow: auto; }
table { border-collapse: collapse; font-size: .85rem; }
th, td { border: 1px solid #e3e3e3; padding: .2rem .5rem; text-align: right; }
th { background: #f6f6f6; position: sticky; top: 0; }
.metric-label { font-size: .9rem; color: #555; }
.metric-value { font-size: 2.2rem; }
"#;

/// Whole HTML page for one pipeline run.
pub fn render_page(model: &RenderModel) -> String {
    let (title, body) = match model {
        RenderModel::Halted { title, error } => (
            title.as_str(),
            error
                .as_deref()
                .map(|e| format!(r#"<div class="error" role="alert">{}</div>"#, escape(e)))
                .unwrap_or_default(),
        ),
        RenderModel::Dashboard(d) => (d.title.as_str(), dashboard_body(d)),
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"es\"><head><meta charset=\"utf-8\"><title>{t}</title><style>{style}</style></head>\
         <body><h1>{t}</h1>{body}</body></html>\n",
        t = escape(title),
        style = STYLE,
        body = body
    )
}

fn dashboard_body(d: &Dashboard) -> String {
    let mut out = raw_table(&d.raw);
    for section in &d.sections {
        out.push_str(&section_html(section));
    }
    out.push_str(&format!(
        r#"<p><small>Generado {}</small></p>"#,
        d.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

fn raw_table(raw: &RawTable) -> String {
    let mut out = format!(
        r#"<details><summary>{}</summary><div class="raw"><table><thead><tr>"#,
        escape(RAW_DATA_LABEL)
    );
    for h in &raw.headers {
        out.push_str(&format!("<th>{}</th>", escape(h)));
    }
    out.push_str("</tr></thead><tbody>");
    for row in &raw.rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table></div></details>");
    out
}

fn section_html(section: &Section) -> String {
    match section {
        Section::BarChart { heading, points } => {
            format!("<h2>{}</h2>{}", escape(heading), svg::bar_chart(points))
        }
        Section::LineChart { heading, points } => {
            format!("<h2>{}</h2>{}", escape(heading), svg::line_chart(points))
        }
        Section::Metric { label, value } => format!(
            r#"<div class="metric"><div class="metric-label">{}</div><div class="metric-value">{}</div></div>"#,
            escape(label),
            escape(value)
        ),
        Section::Distribution {
            heading,
            title,
            x_label,
            y_label,
            histogram,
            density,
        } => format!(
            "<h2>{}</h2>{}",
            escape(heading),
            svg::distribution_chart(title, x_label, y_label, histogram.as_ref(), density.as_ref())
        ),
        Section::BoxPlot {
            heading,
            title,
            x_label,
            y_label,
            groups,
        } => format!(
            "<h2>{}</h2>{}",
            escape(heading),
            svg::box_plot(title, x_label, y_label, groups)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregates;
    use crate::derive::derive_revenue;
    use crate::error::LoadError;
    use crate::load::parse_sales_csv;

    fn page_for(csv: &str) -> String {
        let derived = derive_revenue(parse_sales_csv(csv.as_bytes()).unwrap());
        let agg = Aggregates::compute(&derived);
        render_page(&RenderModel::dashboard(&derived, &agg))
    }

    #[test]
    fn error_page_has_banner_and_no_charts() {
        let page = render_page(&RenderModel::halted(&LoadError::MissingColumn("Categoria")));
        assert!(page.contains("Análisis Exploratorio de Datos (EDA)"));
        assert!(page.contains("Falta la columna requerida: Categoria"));
        assert!(!page.contains("<svg"));
        assert!(!page.contains("<details"));
    }

    #[test]
    fn dashboard_page_lists_sections_in_order() {
        let page = page_for(
            "Producto,Categoria,cantidad,precio_unitario,mes,año\n\
             A,X,2,10,1,2023\n\
             B,X,1,5,1,2023\n",
        );
        let order = [
            "Ver datos crudos",
            "Total de ventas por mes",
            "Total de ventas por año",
            "Top 10 Productos Más Vendidos",
            "Ventas Totales por Categoría",
            "Factura Total",
            "Distribución de Ventas",
            "Ventas por Categoría (Boxplot)",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| page.find(needle).unwrap_or_else(|| panic!("missing {}", needle)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(page.contains("$25.00"));
        assert_eq!(page.matches("<svg").count(), 6);
    }

    #[test]
    fn raw_rows_are_escaped() {
        let page = page_for(
            "Producto,Categoria,cantidad,precio_unitario,mes,año\n\
             <b>x</b>,X,1,1,1,2023\n",
        );
        assert!(page.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!page.contains("<b>x</b>"));
    }

    #[test]
    fn empty_model_renders_title_only() {
        let page = render_page(&RenderModel::empty());
        assert!(page.contains("<h1>Análisis Exploratorio de Datos (EDA)</h1>"));
        assert!(!page.contains("class=\"error\""));
        assert!(!page.contains("<svg"));
        assert!(!page.contains(RAW_DATA_LABEL));
        assert!(!page.contains("$0.00"));
    }
}
