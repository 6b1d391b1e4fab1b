use credwatch_core::{AppError, AppResult};
use credwatch_domain::AlertEvent;
use handlebars::Handlebars;
use serde::Serialize;

const BODY_TEMPLATE: &str = "expiry-alert-body";

/// Registered alert templates. Values are HTML-escaped by the registry.
pub(super) struct AlertTemplates {
    registry: Handlebars<'static>,
}

#[derive(Serialize)]
struct BodyContext<'a> {
    accent: &'static str,
    kind: &'static str,
    application: &'a str,
    expiry: String,
    days: i64,
    day_label: &'static str,
    owners: String,
}

impl AlertTemplates {
    pub(super) fn new() -> AppResult<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(
                BODY_TEMPLATE,
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
        .container { max-width: 600px; margin: 0 auto; padding: 20px; }
        .header { background: {{accent}}; color: white; padding: 20px; border-radius: 5px 5px 0 0; }
        .content { background: #f9f9f9; padding: 20px; border-radius: 0 0 5px 5px; }
        h1 { margin: 0; font-size: 22px; }
        .footer { text-align: center; margin-top: 20px; color: #666; font-size: 12px; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{{kind}} expiring in {{days}} {{day_label}}</h1>
        </div>
        <div class="content">
            <p><strong>Application:</strong> {{application}}</p>
            <p><strong>Credential type:</strong> {{kind}}</p>
            <p><strong>Expiry date:</strong> {{expiry}} (UTC)</p>
            <p><strong>Days remaining:</strong> {{days}}</p>
            <p><strong>Owners:</strong> {{owners}}</p>
            <p>Rotate this credential before it expires to avoid an outage.</p>
        </div>
        <div class="footer">
            <p>You receive this message because you are listed as an owner of the application.</p>
        </div>
    </div>
</body>
</html>"#,
            )
            .map_err(|error| {
                AppError::Internal(format!("failed to register alert body template: {error}"))
            })?;

        Ok(Self { registry })
    }

    pub(super) fn render_html(&self, event: &AlertEvent) -> AppResult<String> {
        let record = event.record();
        let accent = match event.days_left() {
            days if days <= 7 => "#dc3545",
            days if days <= 30 => "#fd7e14",
            _ => "#0d6efd",
        };
        let owners = if record.owner_names().is_empty() {
            "Unknown".to_owned()
        } else {
            record.owner_names().join(", ")
        };

        let context = BodyContext {
            accent,
            kind: record.kind().as_str(),
            application: record.application_name(),
            expiry: record.expiry_date().format("%Y-%m-%d").to_string(),
            days: event.days_left(),
            day_label: day_label(event.days_left()),
            owners,
        };

        self.registry
            .render(BODY_TEMPLATE, &context)
            .map_err(|error| AppError::Internal(format!("failed to render alert body: {error}")))
    }
}

/// Plain-text subject line; no markup escaping applies.
pub(super) fn render_subject(event: &AlertEvent) -> String {
    let record = event.record();
    format!(
        "{} for {} expires in {} {}",
        record.kind(),
        record.application_name(),
        event.days_left(),
        day_label(event.days_left())
    )
}

fn day_label(days: i64) -> &'static str {
    if days == 1 { "day" } else { "days" }
}
