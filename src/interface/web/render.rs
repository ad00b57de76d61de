//! HTML fragments for the dashboard

use std::fmt::Write;

use crate::application::{IdentitySummary, Table};
use crate::domain::info::QUOTA_EXCEEDED;
use crate::domain::{Attachment, BarSegment, ChartView, InstanceRow, RenderedChart, SegmentRole, VolumeRow};

/// Escape text for use in element content and attribute values
pub fn escape(text: &str) -> String {
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

/// One quota bar with its info line
pub fn chart(chart: &RenderedChart) -> String {
    match chart {
        RenderedChart::Ready(view) => ready_chart(view),
        RenderedChart::Unavailable { kind, message } => format!(
            "<div class=\"quota-chart\" data-kind=\"{kind}\">\
             <div class=\"graphBar\"><div class=\"unavailable\"><span>Unavailable</span></div></div>\
             <p class=\"quota-info\" id=\"{kind}Holder_info\">{}</p></div>",
            escape(message),
        ),
    }
}

fn ready_chart(view: &ChartView) -> String {
    let mut html = format!("<div class=\"quota-chart\" data-kind=\"{}\">", view.kind);

    html.push_str("<div class=\"graphBar\"");
    if let Some(delay) = view.animate_after_ms {
        let _ = write!(html, " data-animate-after=\"{}\"", delay);
    }
    html.push('>');
    for segment in &view.segments {
        html.push_str(&bar_segment(segment));
    }
    html.push_str("</div>");

    let _ = write!(html, "<p class=\"quota-info\" id=\"{}Holder_info\">", view.kind);
    match view.info.remediation {
        Some(hint) => {
            let _ = write!(html, "<strong>{}</strong> {}", QUOTA_EXCEEDED, escape(hint));
        }
        None => html.push_str(&escape(&view.info.message)),
    }
    html.push_str("</p></div>");
    html
}

fn bar_segment(segment: &BarSegment) -> String {
    let mut classes = vec![segment.tier.css_class()];
    match segment.role {
        SegmentRole::Base => {}
        SegmentRole::Delta => classes.push("addedUsageBar"),
        SegmentRole::Collapsing => classes.push("addedUsageBar collapsing"),
    }
    if segment.flush_left {
        classes.push("barFlushLeft");
    }

    let mut style = format!("width: {}%; --from-width: {}%;", segment.width, segment.from_width);
    if segment.translucent {
        style.push_str(" opacity: 0.5;");
    }
    if segment.dark_label() {
        style.push_str(" color: #000;");
    }

    let label = segment
        .label
        .as_deref()
        .map(|label| format!("<span>{}</span>", escape(label)))
        .unwrap_or_default();

    format!("<div class=\"{}\" style=\"{}\">{}</div>", classes.join(" "), style, label)
}

fn instance_table(table: &Table<InstanceRow>) -> String {
    let rows = match table {
        Table::Failed { message } => return format!("<p class=\"table-error\">{}</p>", escape(message)),
        Table::Loaded { rows } if rows.is_empty() => {
            return "<p class=\"table-empty\">No instances.</p>".to_string();
        }
        Table::Loaded { rows } => rows,
    };

    let mut html = String::from("<table class=\"instances\"><thead><tr><th>Name</th><th>Size</th><th>IP Address</th></tr></thead><tbody>");
    for row in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&row.name),
            escape(&row.size),
            escape(&row.ip_address)
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn volume_table(table: &Table<VolumeRow>) -> String {
    let rows = match table {
        Table::Failed { message } => return format!("<p class=\"table-error\">{}</p>", escape(message)),
        Table::Loaded { rows } if rows.is_empty() => {
            return "<p class=\"table-empty\">No volumes.</p>".to_string();
        }
        Table::Loaded { rows } => rows,
    };

    let mut html = String::from("<table class=\"volumes\"><thead><tr><th>Name</th><th>Capacity</th><th>Status</th></tr></thead><tbody>");
    for row in rows {
        let status = match row.status {
            Attachment::Attached => "Attached",
            Attachment::Available => "Available",
        };
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape(&row.name),
            escape(&row.capacity),
            status
        );
    }
    html.push_str("</tbody></table>");
    html
}

/// Accordion panel body of one identity
pub fn identity_summary(summary: &IdentitySummary) -> String {
    let title = summary
        .name
        .clone()
        .unwrap_or_else(|| summary.identity.to_string());

    let mut html = format!(
        "<section class=\"identity-summary\" data-provider=\"{}\" data-identity=\"{}\"><h2>{}",
        escape(&summary.identity.provider),
        escape(&summary.identity.identity),
        escape(&title)
    );
    if summary.current {
        html.push_str(" <span class=\"current-identity\">CURRENT</span>");
    }
    html.push_str("</h2><div class=\"quota-charts\">");
    for rendered in &summary.charts {
        html.push_str(&chart(rendered));
    }
    html.push_str("</div><h3>Instances</h3>");
    html.push_str(&instance_table(&summary.instances));
    html.push_str("<h3>Volumes</h3>");
    html.push_str(&volume_table(&summary.volumes));
    let _ = write!(
        html,
        "<p class=\"generated-at\">Updated {}</p></section>",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuotaChart, QuotaKind};

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"a\" & 'b'</b>"), "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_committed_bar_markup() {
        let mut quota = QuotaChart::new(QuotaKind::Cpu);
        let html = chart(&quota.render(4.0, 16.0));

        assert!(html.contains("class=\"greenGraphBar\""));
        assert!(html.contains("width: 25%; --from-width: 0%;"));
        assert!(html.contains("<span>25%</span>"));
        assert!(html.contains("You are using 4 of 16 available CPUs."));
    }

    #[test]
    fn test_preview_markup() {
        let mut quota = QuotaChart::new(QuotaKind::Cpu);
        quota.render(4.0, 16.0);
        quota.add_usage(4.0);
        let html = chart(quota.current());

        assert!(html.contains("data-animate-after=\"500\""));
        assert!(html.contains("orangeGraphBar barFlushLeft"));
        assert!(html.contains("orangeGraphBar addedUsageBar\" style=\"width: 25%; --from-width: 0%; opacity: 0.5;"));
    }

    #[test]
    fn test_exceeded_markup() {
        let mut quota = QuotaChart::new(QuotaKind::DiskCount);
        quota.render(4.0, 5.0);
        quota.add_usage(2.0);
        let html = chart(quota.current());

        assert!(html.contains("redGraphBar"));
        assert!(html.contains("<strong>Quota Exceeded.</strong> You must destroy an existing volume"));
    }

    #[test]
    fn test_unavailable_markup() {
        let mut quota = QuotaChart::new(QuotaKind::Mem);
        let html = chart(&quota.render_unavailable("Could not fetch instance memory quota."));

        assert!(html.contains("<span>Unavailable</span>"));
        assert!(html.contains("Could not fetch instance memory quota."));
        assert!(!html.contains("GraphBar"));
    }
}
