//! Job-details form served at `/`

use super::state::LocationOptions;

/// Render the form page with the given dropdown options and target URL.
pub fn render_index(locations: &LocationOptions, predict_url: &str) -> String {
    let options = locations
        .codes
        .iter()
        .map(|code| {
            let selected = if code == "CA" { " selected" } else { "" };
            let code = escape_html(code);
            format!(r#"<option value="{code}"{selected}>{code}</option>"#)
        })
        .collect::<Vec<_>>()
        .join("\n                ");

    let notice = locations
        .notice
        .as_deref()
        .map(|msg| format!(r#"<div class="alert error" id="location-notice">{}</div>"#, escape_html(msg)))
        .unwrap_or_default();

    // JSON string literal, with `</` broken up so it cannot close the script tag
    let url_literal = serde_json::to_string(predict_url)
        .unwrap_or_else(|_| "\"/predict\"".to_string())
        .replace("</", "<\\/");

    INDEX_TEMPLATE
        .replace("{{LOCATION_NOTICE}}", &notice)
        .replace("{{STATE_OPTIONS}}", &options)
        .replace("{{PREDICT_URL}}", &url_literal)
}

fn escape_html(text: &str) -> String {
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

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Salary Prediction Tool</title>
    <style>
        body { font-family: system-ui, sans-serif; background: #111827; color: #f3f4f6; margin: 0; }
        main { max-width: 960px; margin: 0 auto; padding: 2rem; }
        details { background: #1f2937; border-radius: 6px; padding: 0.75rem 1rem; margin-bottom: 1.5rem; }
        form { background: #1f2937; border-radius: 6px; padding: 1.5rem; }
        .columns { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; }
        label { display: block; margin: 0.75rem 0 0.25rem; font-weight: 600; }
        input[type=text], select, textarea { width: 100%; box-sizing: border-box; padding: 0.5rem;
            background: #374151; color: inherit; border: 1px solid #4b5563; border-radius: 4px; }
        .radios label { display: inline; font-weight: normal; margin-right: 1rem; }
        button { width: 100%; margin-top: 1.5rem; padding: 0.75rem; background: #3b82f6; color: white;
            border: none; border-radius: 4px; font-size: 1rem; cursor: pointer; }
        .alert { padding: 0.75rem 1rem; border-radius: 4px; margin: 1rem 0; }
        .alert.error { background: #7f1d1d; }
        .alert.success { background: #14532d; }
        .metric { font-size: 2rem; font-weight: 700; }
        pre { background: #111827; padding: 0.75rem; overflow-x: auto; }
    </style>
</head>
<body>
<main>
    {{LOCATION_NOTICE}}
    <h1>Salary Prediction Tool</h1>
    <details>
        <summary>About this tool</summary>
        <p>Predict the salary for a job posting from its title, description, company,
        location (US state code), work arrangement and employment type.</p>
    </details>

    <h2>Enter Job Details</h2>
    <form id="job-form">
        <div class="columns">
            <div>
                <h3>Position Information</h3>
                <label for="title">Job Title</label>
                <input type="text" id="title" name="title" value="Data Analyst">
                <label for="company_name">Company Name</label>
                <input type="text" id="company_name" name="company_name" value="TechCorp">
                <label for="state">State Code</label>
                <select id="state" name="state">
                {{STATE_OPTIONS}}
                </select>
            </div>
            <div>
                <h3>Work Arrangements</h3>
                <label>Remote Work Option</label>
                <div class="radios">
                    <input type="radio" id="remote-yes" name="remote_allowed" value="Yes" checked><label for="remote-yes">Yes</label>
                    <input type="radio" id="remote-no" name="remote_allowed" value="No"><label for="remote-no">No</label>
                </div>
                <label>Employment Type</label>
                <div class="radios">
                    <input type="radio" id="type-full" name="work_type" value="Full Time" checked><label for="type-full">Full Time</label>
                    <input type="radio" id="type-part" name="work_type" value="Part Time"><label for="type-part">Part Time</label>
                    <input type="radio" id="type-contract" name="work_type" value="Contract"><label for="type-contract">Contract</label>
                </div>
            </div>
        </div>
        <h3>Job Description</h3>
        <label for="description">Detailed Job Description</label>
        <textarea id="description" name="description" rows="5">Analyze data and create reports</textarea>
        <button type="submit">Predict Salary</button>
    </form>
    <div id="result"></div>
</main>
<script>
const PREDICT_URL = {{PREDICT_URL}};

function renderError(message) {
    const el = document.getElementById('result');
    el.innerHTML = '';
    const alert = document.createElement('div');
    alert.className = 'alert error';
    alert.textContent = message;
    el.appendChild(alert);
}

function renderSalary(salary, data) {
    const el = document.getElementById('result');
    el.innerHTML = '';
    const alert = document.createElement('div');
    alert.className = 'alert success';
    alert.textContent = 'Salary Prediction Complete!';
    const label = document.createElement('div');
    label.textContent = 'Predicted Salary';
    const metric = document.createElement('div');
    metric.className = 'metric';
    metric.textContent = '$' + (Math.round(salary * 100) / 100);
    const raw = document.createElement('details');
    const summary = document.createElement('summary');
    summary.textContent = 'View Raw Data';
    const pre = document.createElement('pre');
    pre.textContent = JSON.stringify(data, null, 2);
    raw.append(summary, pre);
    el.append(alert, label, metric, raw);
}

document.getElementById('job-form').addEventListener('submit', async (event) => {
    event.preventDefault();
    const form = event.target;
    const workType = form.elements['work_type'].value;
    const data = {
        remote_allowed: form.elements['remote_allowed'].value === 'Yes',
        work_type_contract: workType === 'Contract',
        work_type_full_time: workType === 'Full Time',
        work_type_part_time: workType === 'Part Time',
        state: form.elements['state'].value,
        company_name: form.elements['company_name'].value,
        title: form.elements['title'].value,
        description: form.elements['description'].value,
    };

    try {
        const response = await fetch(PREDICT_URL, {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(data),
        });
        if (response.status === 200) {
            const body = await response.json();
            renderSalary(body.salary, data);
        } else {
            renderError('API Error: ' + response.status);
        }
    } catch (err) {
        renderError('Request failed: ' + err);
    }
});
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_and_default_selection() {
        let locations = LocationOptions {
            codes: vec!["CA".into(), "NY".into()],
            notice: None,
        };
        let html = render_index(&locations, "/predict");
        assert!(html.contains(r#"<option value="CA" selected>CA</option>"#));
        assert!(html.contains(r#"<option value="NY">NY</option>"#));
        assert!(html.contains(r#"const PREDICT_URL = "/predict";"#));
        assert!(!html.contains("location-notice"));
    }

    #[test]
    fn test_values_are_escaped() {
        let locations = LocationOptions {
            codes: vec!["<b>".into()],
            notice: None,
        };
        let html = render_index(&locations, "https://x.test/</script>");
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("x.test/</script>"));
    }

    #[test]
    fn test_fallback_notice_shown() {
        let html = render_index(&LocationOptions::defaults(), "/predict");
        assert!(html.contains("Location mapping file not found. Using default state codes."));
        assert!(html.contains(r#"<option value="NC">NC</option>"#));
    }
}
