//! ECharts chart config for the dashboard and reports pages.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::bar::Bar,
};
use maud::PreEscaped;

use crate::html::HeadElement;

/// A chart with the HTML container ID it renders into and its ECharts
/// configuration as JSON.
pub(super) struct DashboardChart {
    pub id: &'static str,
    pub options: String,
}

/// JavaScript that initializes the given charts on page load.
///
/// Each chart gets responsive resizing and follows the browser's dark mode
/// preference.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let init_blocks = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chart = echarts.init(document.getElementById("{}"));
                    chart.setOption({});

                    window.addEventListener('resize', chart.resize);

                    const darkModeQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeQuery.matches ? 'dark' : 'default');
                    }}
                    darkModeQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{init_blocks}\n}});"
    );

    HeadElement::ScriptSource(PreEscaped(script))
}

/// A bar chart of expense totals per category.
pub(super) fn expenses_by_category_chart(totals: &[(String, f64)]) -> Chart {
    let labels: Vec<String> = totals.iter().map(|(category, _)| category.clone()).collect();
    let values: Vec<f64> = totals.iter().map(|(_, total)| *total).collect();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext("This month"),
        )
        .tooltip(currency_tooltip())
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(Bar::new().name("Spent").data(values))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
