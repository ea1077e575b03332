use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Columns shown for each snapshot row. Per-property detail stays in JSON.
const SNAPSHOT_COLUMNS: [&str; 9] = [
    "period",
    "property_count",
    "leveraged_count",
    "cash_count",
    "total_property_value",
    "total_debt",
    "total_equity",
    "cash_available",
    "monthly_cashflow",
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else if let Some(Value::Array(presets)) = map.get("presets") {
                print_array_table(presets);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Some(Value::Array(results)) = result.get("results") {
        print_strategy_results(results);
    } else if let Some(Value::Array(summaries)) = result.get("summaries") {
        print_array_table(summaries);
        if let Some(Value::String(best)) = result.get("best_strategy") {
            println!("\nBest strategy: {}", best);
        }
    } else if let Value::Object(_) = result {
        print_flat_object(result);
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
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

/// One summary table for the batch, then a snapshot table per strategy.
fn print_strategy_results(results: &[Value]) {
    let summaries: Vec<Value> = results
        .iter()
        .filter_map(|r| r.get("summary").cloned())
        .collect();
    print_array_table(&summaries);

    for result in results {
        let name = result
            .get("strategy_name")
            .map(format_value)
            .unwrap_or_default();
        println!("\n{}", name);

        let mut builder = Builder::default();
        builder.push_record(SNAPSHOT_COLUMNS);
        if let Some(Value::Array(snapshots)) = result.get("snapshots") {
            for snapshot in snapshots {
                let row: Vec<String> = SNAPSHOT_COLUMNS
                    .iter()
                    .map(|c| snapshot.get(*c).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    }
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
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
