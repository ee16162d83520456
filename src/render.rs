//! Server-side HTML for the single page: the search form, the selected
//! countries, and (after a POST) the three sentiment lists and the chart.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write as _;

use crate::article::Article;
use crate::categorize::Categorized;
use crate::session::SelectedCountries;

/// Form values echoed back into the inputs.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub keywords: String,
    pub start_date: String,
    pub end_date: String,
    pub region: String,
}

#[derive(Debug, Default)]
pub struct Page<'a> {
    /// `YYYY-MM-DD`, default for the start-date input.
    pub current_date: String,
    pub form: FormValues,
    pub countries: Option<&'a SelectedCountries>,
    pub results: Option<&'a Categorized>,
    /// Cache-busted chart URL; omitted when no chart was written.
    pub chart_url: Option<String>,
    pub error: Option<String>,
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }
form { display: grid; grid-template-columns: 8rem 1fr; gap: .5rem 1rem; max-width: 32rem; }
.error { color: #b00020; font-weight: bold; }
.lists { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }
.lists li { margin-bottom: .4rem; }
.score { color: #666; font-size: .85em; }
"#;

const GEO_SCRIPT: &str = r#"
function toggleCountry() {
  var out = document.getElementById('country-status');
  if (!navigator.geolocation) { out.textContent = 'Geolocation is not available.'; return; }
  navigator.geolocation.getCurrentPosition(function (pos) {
    fetch('/get_country', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      credentials: 'same-origin',
      body: JSON.stringify({ latitude: pos.coords.latitude, longitude: pos.coords.longitude })
    })
      .then(function (r) { return r.json(); })
      .then(function (data) {
        if (data.error) { out.textContent = data.error; return; }
        out.textContent = 'Selected countries: ' + (data.selected_countries.join(', ') || 'none');
      })
      .catch(function () { out.textContent = 'Failed to fetch country'; });
  }, function (err) { out.textContent = err.message; });
}
"#;

pub fn render_page(page: &Page<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Energy News Aggregator</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>\n</head>\n<body>");
    html.push_str("<h1>Energy News Aggregator</h1>\n");

    if let Some(err) = &page.error {
        let _ = writeln!(html, "<p class=\"error\">{}</p>", text(err));
    }

    render_form(&mut html, page);
    render_countries(&mut html, page.countries);

    if let Some(results) = page.results {
        html.push_str("<div class=\"lists\">\n");
        render_list(&mut html, "Positive", "positive", &results.positive);
        render_list(&mut html, "Neutral", "neutral", &results.neutral);
        render_list(&mut html, "Negative", "negative", &results.negative);
        html.push_str("</div>\n");
    }

    if let Some(url) = &page.chart_url {
        let _ = writeln!(
            html,
            "<h2>Topics</h2>\n<img id=\"topic-chart\" src=\"{}\" alt=\"Share of Topics in News Articles\" width=\"400\" height=\"400\">",
            attr(url)
        );
    }

    let _ = writeln!(html, "<script>{GEO_SCRIPT}</script>\n</body>\n</html>");
    html
}

fn render_form(html: &mut String, page: &Page<'_>) {
    let f = &page.form;
    let start = if f.start_date.trim().is_empty() {
        page.current_date.as_str()
    } else {
        f.start_date.as_str()
    };
    html.push_str("<form method=\"post\" action=\"/\">\n");
    input(html, "keywords", "Keywords", "text", &f.keywords);
    input(html, "start-date", "Start date", "date", start);
    input(html, "end-date", "End date", "date", &f.end_date);
    input(html, "region", "Region", "text", &f.region);
    html.push_str("<span></span><button type=\"submit\">Search</button>\n</form>\n");
}

fn input(html: &mut String, name: &str, label: &str, kind: &str, value: &str) {
    let _ = writeln!(
        html,
        "<label for=\"{name}\">{label}</label><input id=\"{name}\" name=\"{name}\" type=\"{kind}\" value=\"{}\">",
        attr(value)
    );
}

fn render_countries(html: &mut String, countries: Option<&SelectedCountries>) {
    html.push_str("<p><button type=\"button\" onclick=\"toggleCountry()\">Toggle my country</button> ");
    let listed = countries
        .filter(|c| !c.is_empty())
        .map(|c| c.iter().map(|n| text(n).into_owned()).collect::<Vec<_>>().join(", "));
    let _ = writeln!(
        html,
        "<span id=\"country-status\">Selected countries: {}</span></p>",
        listed.as_deref().unwrap_or("none")
    );
}

fn render_list(html: &mut String, heading: &str, id: &str, articles: &[Article]) {
    let _ = writeln!(
        html,
        "<section id=\"{id}\">\n<h2>{heading} ({})</h2>\n<ul>",
        articles.len()
    );
    for a in articles {
        let _ = write!(html, "<li>");
        if a.link.is_empty() {
            let _ = write!(html, "{}", text(&a.title));
        } else {
            let _ = write!(
                html,
                "<a href=\"{}\" rel=\"noopener\">{}</a>",
                attr(&a.link),
                text(&a.title)
            );
        }
        if let Some(s) = a.sentiment {
            let _ = write!(html, " <span class=\"score\">{s:+.2}</span>");
        }
        let _ = writeln!(html, "<br><small>{}</small></li>", text(&a.published));
    }
    html.push_str("</ul>\n</section>\n");
}
