// src/render/mod.rs
pub mod format;
pub mod html;
pub mod raw_table;
pub mod svg;

pub use raw_table::RawTable;

use crate::aggregate::{Aggregates, CategorySpread, DensityCurve, Grouped, Histogram};
use crate::derive::DerivedTable;
use crate::error::LoadError;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const TITLE: &str = "Análisis Exploratorio de Datos (EDA)";
pub const RAW_DATA_LABEL: &str = "Ver datos crudos";

/// A labelled value on a categorical axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

impl From<&Grouped<f64>> for Point {
    fn from(g: &Grouped<f64>) -> Self {
        Point {
            label: g.key.clone(),
            value: g.value,
        }
    }
}

impl From<&Grouped<usize>> for Point {
    fn from(g: &Grouped<usize>) -> Self {
        Point {
            label: g.key.clone(),
            value: g.value as f64,
        }
    }
}

/// One block of the dashboard, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    BarChart {
        heading: String,
        points: Vec<Point>,
    },
    LineChart {
        heading: String,
        points: Vec<Point>,
    },
    Metric {
        label: String,
        value: String,
    },
    Distribution {
        heading: String,
        title: String,
        x_label: String,
        y_label: String,
        histogram: Option<Histogram>,
        density: Option<DensityCurve>,
    },
    BoxPlot {
        heading: String,
        title: String,
        x_label: String,
        y_label: String,
        groups: Vec<CategorySpread>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub raw: RawTable,
    pub sections: Vec<Section>,
}

/// Everything the host needs to draw one rerun of the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderModel {
    /// The run stopped after loading: only the title is shown, plus the error
    /// banner when the load failed. A table with no rows halts without one.
    Halted {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Dashboard(Box<Dashboard>),
}

impl RenderModel {
    pub fn halted(err: &LoadError) -> Self {
        RenderModel::Halted {
            title: TITLE.to_string(),
            error: Some(err.banner()),
        }
    }

    /// The loaded table has no rows: nothing to aggregate or chart.
    pub fn empty() -> Self {
        RenderModel::Halted {
            title: TITLE.to_string(),
            error: None,
        }
    }

    pub fn dashboard(derived: &DerivedTable, agg: &Aggregates) -> Self {
        let points =
            |groups: &[Grouped<f64>]| -> Vec<Point> { groups.iter().map(Point::from).collect() };

        let sections = vec![
            Section::BarChart {
                heading: "Total de ventas por mes".into(),
                points: points(&agg.sales_by_month),
            },
            Section::LineChart {
                heading: "Total de ventas por año".into(),
                points: points(&agg.sales_by_year),
            },
            Section::BarChart {
                heading: "Top 10 Productos Más Vendidos".into(),
                points: agg.top_products.iter().map(Point::from).collect(),
            },
            Section::BarChart {
                heading: "Ventas Totales por Categoría".into(),
                points: points(&agg.sales_by_category),
            },
            Section::Metric {
                label: "Factura Total".into(),
                value: format::format_currency(agg.total_invoice),
            },
            Section::Distribution {
                heading: "Distribución de Ventas".into(),
                title: "Distribución de Ventas".into(),
                x_label: "Total Venta".into(),
                y_label: "Frecuencia".into(),
                histogram: agg.revenue_distribution.histogram.clone(),
                density: agg.revenue_distribution.density.clone(),
            },
            Section::BoxPlot {
                heading: "Ventas por Categoría (Boxplot)".into(),
                title: "Ventas por Categoría (Boxplot)".into(),
                x_label: "Categoría".into(),
                y_label: "Total Venta".into(),
                groups: agg.revenue_by_category.clone(),
            },
        ];

        RenderModel::Dashboard(Box::new(Dashboard {
            title: TITLE.to_string(),
            generated_at: Utc::now(),
            raw: RawTable::from_derived(derived),
            sections,
        }))
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, RenderModel::Halted { .. })
    }

    pub fn sections(&self) -> &[Section] {
        match self {
            RenderModel::Halted { .. } => &[],
            RenderModel::Dashboard(d) => &d.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_revenue;
    use crate::load::parse_sales_csv;

    fn example_model() -> RenderModel {
        let csv = "Producto,Categoria,cantidad,precio_unitario,mes,año\n\
                   A,X,2,10,1,2023\n\
                   B,X,1,5,1,2023\n";
        let derived = derive_revenue(parse_sales_csv(csv.as_bytes()).unwrap());
        let agg = Aggregates::compute(&derived);
        RenderModel::dashboard(&derived, &agg)
    }

    #[test]
    fn sections_in_fixed_order() {
        let model = example_model();
        let kinds: Vec<&str> = model
            .sections()
            .iter()
            .map(|s| match s {
                Section::BarChart { .. } => "bar",
                Section::LineChart { .. } => "line",
                Section::Metric { .. } => "metric",
                Section::Distribution { .. } => "distribution",
                Section::BoxPlot { .. } => "box",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["bar", "line", "bar", "bar", "metric", "distribution", "box"]
        );
    }

    #[test]
    fn metric_is_formatted_invoice() {
        let model = example_model();
        let metric = model.sections().iter().find_map(|s| match s {
            Section::Metric { label, value } => Some((label.as_str(), value.as_str())),
            _ => None,
        });
        assert_eq!(metric, Some(("Factura Total", "$25.00")));
    }

    #[test]
    fn halted_model_carries_banner_only() {
        let model = RenderModel::halted(&LoadError::MissingColumn("Categoria"));
        assert!(model.is_halted());
        assert!(model.sections().is_empty());

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["status"], "halted");
        assert_eq!(
            json["error"],
            "Error al cargar los datos: Falta la columna requerida: Categoria"
        );
    }

    #[test]
    fn empty_model_has_no_banner() {
        let model = RenderModel::empty();
        assert!(model.is_halted());
        assert!(model.sections().is_empty());

        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["status"], "halted");
        assert_eq!(json["title"], TITLE);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn dashboard_serialises_with_tags() {
        let json = serde_json::to_value(example_model()).unwrap();
        assert_eq!(json["status"], "dashboard");
        assert_eq!(json["title"], TITLE);
        assert_eq!(json["sections"][0]["kind"], "bar_chart");
        assert_eq!(json["sections"][0]["points"][0]["label"], "1");
        assert_eq!(json["sections"][0]["points"][0]["value"], 25.0);
        assert_eq!(json["sections"][4]["value"], "$25.00");
        assert_eq!(json["raw"]["rows"][1][6], "5");
    }
}
