//! Utilization report rendering.

use super::terminal::format_field;
use crate::error::{UtilizationError, UtilizationResult};
use crate::models::{ComputeUtilizationResponse, UsageLimit};
use colored::Colorize;

const LABEL_WIDTH: usize = 14;
const NUMBER_WIDTH: usize = 10;

/// Render the response as an aligned table, one row per limit.
pub fn render_table(response: &ComputeUtilizationResponse) -> String {
    let mut lines = Vec::with_capacity(4);
    lines.push(format!(
        "{name} {location} {subscription}",
        name = response.name.bold(),
        location = response.location,
        subscription = response.subscription_id
    ));
    lines.push(format!(
        "{kind},{limit},{usage},{free}",
        kind = format_field("kind", LABEL_WIDTH),
        limit = format_field("limit", NUMBER_WIDTH),
        usage = format_field("usage", NUMBER_WIDTH),
        free = format_field("free", NUMBER_WIDTH),
    ));
    lines.push(row("quota", &response.utilization.quota));
    lines.push(row("reservation", &response.utilization.reservation));
    lines.join("\n")
}

fn row(kind: &str, limit: &UsageLimit) -> String {
    let free = limit.limit - limit.usage;
    let free_field = format_field(free, NUMBER_WIDTH);
    format!(
        "{kind},{limit},{usage},{free}",
        kind = format_field(kind, LABEL_WIDTH),
        limit = format_field(limit.limit, NUMBER_WIDTH),
        usage = format_field(limit.usage, NUMBER_WIDTH),
        free = if free < 0 {
            free_field.red().to_string()
        } else {
            free_field
        },
    )
}

/// Render the response exactly as the HTTP endpoint returns it.
pub fn render_json(response: &ComputeUtilizationResponse) -> UtilizationResult<String> {
    serde_json::to_string_pretty(response).map_err(|e| UtilizationError::Parse {
        context: "utilization response",
        path: ".".to_string(),
        message: e.to_string(),
    })
}

/// Print the response to stdout.
pub fn print_utilization(response: &ComputeUtilizationResponse, json: bool) -> UtilizationResult<()> {
    if json {
        println!("{}", render_json(response)?);
    } else {
        println!("{}", render_table(response));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Utilization;
    use uuid::Uuid;

    fn response() -> ComputeUtilizationResponse {
        ComputeUtilizationResponse {
            name: "standardDSv5Family".to_string(),
            location: "westeurope".to_string(),
            subscription_id: Uuid::nil(),
            utilization: Utilization {
                quota: UsageLimit {
                    limit: 100,
                    usage: 40,
                },
                reservation: UsageLimit { limit: 8, usage: 14 },
            },
        }
    }

    #[test]
    fn test_render_table_rows() {
        colored::control::set_override(false);
        let table = render_table(&response());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[2],
            r#"       "quota",     "100",      "40",      "60""#
        );
        assert_eq!(
            lines[3],
            r#" "reservation",       "8",      "14",      "-6""#
        );
    }

    #[test]
    fn test_render_json_matches_endpoint_shape() {
        let json = render_json(&response()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("parse back");
        assert_eq!(value["utilization"]["reservation"]["usage"], 14);
        assert_eq!(value["subscriptionId"], Uuid::nil().to_string());
    }
}
