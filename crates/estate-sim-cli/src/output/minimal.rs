use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Batch results print one `name: net_worth` line per strategy. Otherwise
/// look for well-known result fields in order of priority, then fall back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(lines) = per_strategy_lines(result_obj) {
        for line in lines {
            println!("{}", line);
        }
        return;
    }

    let priority_keys = [
        "best_strategy",
        "net_worth",
        "valid",
        "cash_on_cash_return",
        "monthly_cashflow",
        "status",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

/// `name: net_worth` for a simulate response. Compare output carries a
/// `best_strategy` answer instead.
fn per_strategy_lines(result: &Value) -> Option<Vec<String>> {
    let results = result.get("results")?.as_array()?;
    let lines = results
        .iter()
        .map(|r| {
            let name = r
                .get("strategy_name")
                .map(format_minimal)
                .unwrap_or_default();
            let net_worth = r
                .get("summary")
                .and_then(|s| s.get("net_worth"))
                .map(format_minimal)
                .unwrap_or_else(|| "null".to_string());
            format!("{}: {}", name, net_worth)
        })
        .collect();
    Some(lines)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
