//! The HTML input form.
//!
//! A plain GET form: submitting it reloads `/` with the selection in the
//! query string. Once the run has loaded and the selection checks out, the
//! page embeds `/map.png` for it; otherwise it shows the error text.

use chrono::NaiveDate;
use gfs_common::{Deployment, Parameter, RunCycle, ViewerError, MAX_FORECAST_STEP};

use crate::pipeline::MapRequest;

/// Current form values, echoed back into the inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub date: String,
    pub cycle: String,
    pub step: String,
    pub parameter: String,
}

impl FormValues {
    /// Defaults: today's date, the 00 cycle, step 0, the first parameter.
    pub fn defaults(today: NaiveDate) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            cycle: RunCycle::Z00.as_str().to_string(),
            step: "0".to_string(),
            parameter: Parameter::Rainfall.selector_label().to_string(),
        }
    }
}

/// What to show below the form.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing submitted yet.
    Empty,
    /// A selection that checked out against the loaded run.
    Map(MapRequest),
    /// The selection was rejected or its run could not be loaded.
    Error(ViewerError),
}

/// Escape text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        r#"<option value="{}"{}>{}</option>"#,
        escape_html(value),
        if selected { " selected" } else { "" },
        escape_html(label)
    )
}

fn cycle_options(current: &str) -> String {
    let current = current.parse::<RunCycle>().ok();
    RunCycle::all()
        .iter()
        .map(|c| option(c.as_str(), c.as_str(), Some(*c) == current))
        .collect()
}

fn parameter_options(current: &str) -> String {
    let current = Parameter::from_selector(current).ok();
    Parameter::all()
        .iter()
        .map(|p| option(p.selector_label(), p.selector_label(), Some(*p) == current))
        .collect()
}

fn outcome_html(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Empty => String::new(),
        Outcome::Map(request) => {
            let query = escape_html(&request.query_string());
            let name = escape_html(&request.download_name());
            format!(
                r#"<section class="map">
  <img src="/map.png?{query}" alt="{name}">
  <p><a href="/map.png?{query}&amp;download=1" download="{name}">Download {name}</a></p>
</section>"#
            )
        }
        Outcome::Error(err) => {
            let class = if err.is_warning() { "warning" } else { "error" };
            format!(r#"<p class="{}">{}</p>"#, class, escape_html(&err.to_string()))
        }
    }
}

/// Render the full page.
pub fn render_page(deployment: &Deployment, values: &FormValues, outcome: &Outcome) -> String {
    let title = escape_html(&deployment.title);
    let header = deployment
        .header
        .as_deref()
        .map(|h| format!("<h2>{}</h2>", escape_html(h)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 1.5em; }}
form {{ display: flex; flex-wrap: wrap; gap: 1em; align-items: end; }}
label {{ display: flex; flex-direction: column; font-size: 0.9em; }}
.map img {{ max-width: 100%; margin-top: 1em; }}
.warning {{ color: #8a6d00; }}
.error {{ color: #a40000; }}
</style>
</head>
<body>
<h1>{title}</h1>
{header}
<form method="get" action="/">
  <label>Run date (UTC)<input type="date" name="date" value="{date}"></label>
  <label>Run cycle (UTC)<select name="cycle">{cycles}</select></label>
  <label>Forecast hour<input type="number" name="step" min="0" max="{max_step}" step="1" value="{step}"></label>
  <label>Parameter<select name="parameter">{parameters}</select></label>
  <button type="submit">Show</button>
</form>
{outcome}
</body>
</html>
"#,
        title = title,
        header = header,
        date = escape_html(&values.date),
        cycles = cycle_options(&values.cycle),
        max_step = MAX_FORECAST_STEP,
        step = escape_html(&values.step),
        parameters = parameter_options(&values.parameter),
        outcome = outcome_html(outcome),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"wind" & 'rain'</b>"#),
            "&lt;b&gt;&quot;wind&quot; &amp; &#39;rain&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_empty_form_has_defaults() {
        let html = render_page(&Deployment::indonesia(), &FormValues::defaults(today()), &Outcome::Empty);
        assert!(html.contains(r#"value="2024-01-15""#));
        assert!(html.contains(r#"<option value="00" selected>00</option>"#));
        assert!(html.contains(r#"max="240""#));
        assert!(html.contains("Surface Wind (ugrd10m &amp; vgrd10m)"));
        assert!(html.contains(">Show</button>"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_map_outcome_links_image_and_download() {
        let request = MapRequest::parse("2024-01-15", "12", "24", "ugrd10m").unwrap();
        let values = FormValues {
            date: "2024-01-15".to_string(),
            cycle: "12".to_string(),
            step: "24".to_string(),
            parameter: Parameter::Wind.selector_label().to_string(),
        };
        let html = render_page(&Deployment::indonesia(), &values, &Outcome::Map(request));

        assert!(html.contains(r#"<img src="/map.png?date=2024-01-15&amp;cycle=12&amp;step=24&amp;parameter=ugrd10m""#));
        assert!(html.contains(r#"download="ugrd10m_t+024.png""#));
        assert!(html.contains(r#"<option value="12" selected>12</option>"#));
        assert!(html.contains(r#"selected>Surface Wind"#));
    }

    #[test]
    fn test_error_outcome_is_escaped() {
        let err = ViewerError::UnrecognizedParameter("<script>".to_string());
        let html = render_page(&Deployment::indonesia(), &FormValues::defaults(today()), &Outcome::Error(err));
        assert!(html.contains(r#"class="warning""#));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
