use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Schedule columns in display order.
const SCHEDULE_COLUMNS: [(&str, &str); 11] = [
    ("period", "Period"),
    ("period_end", "Period End"),
    ("opening_liability", "Opening Liability"),
    ("interest_expense", "Interest"),
    ("payment", "Payment"),
    ("principal", "Principal"),
    ("closing_liability", "Closing Liability"),
    ("depreciation", "Depreciation"),
    ("closing_asset", "Closing ROU Asset"),
    ("modification_applied", "Modified"),
    ("modification_index", "Modification"),
];

/// Format output as tables: headline figures, then the schedule.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_result(result, map),
            _ => print_fields(map),
        },
        _ => println!("{}", value),
    }
}

fn print_result(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    let mut summary = result.clone();
    let schedule = summary.remove("schedule");
    print_fields(&summary);

    if let Some(Value::Array(rows)) = schedule {
        println!();
        print_schedule(&rows);
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_schedule(rows: &[Value]) {
    if rows.is_empty() {
        println!("(empty schedule)");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(SCHEDULE_COLUMNS.iter().map(|(_, title)| *title));
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(SCHEDULE_COLUMNS.iter().map(|(key, _)| {
                match map.get(*key) {
                    Some(Value::Bool(true)) => "*".to_string(),
                    Some(Value::Bool(false)) | None | Some(Value::Null) => String::new(),
                    Some(v) => format_value(v),
                }
            }));
        }
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => round_if_decimal(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Decimals arrive as full-precision strings; show them to the cent.
fn round_if_decimal(s: &str) -> String {
    match s.parse::<rust_decimal::Decimal>() {
        Ok(d) if s.contains('.') => d.round_dp(2).to_string(),
        _ => s.to_string(),
    }
}
