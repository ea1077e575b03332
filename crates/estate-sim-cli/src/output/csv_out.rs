use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// A simulate response becomes one row per snapshot with a leading
/// `strategy` column; summaries and presets become one row each.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let result = map.get("result");
            if let Some(Value::Array(results)) = result.and_then(|r| r.get("results")) {
                write_snapshot_rows(&mut wtr, results);
            } else if let Some(Value::Array(summaries)) = result.and_then(|r| r.get("summaries")) {
                write_array_csv(&mut wtr, summaries);
            } else if let Some(Value::Object(result)) = result {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            } else if let Some(Value::Array(presets)) = map.get("presets") {
                write_array_csv(&mut wtr, presets);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Scalar snapshot fields only; nested property lists and events are skipped.
fn write_snapshot_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, results: &[Value]) {
    let first = results
        .iter()
        .filter_map(|r| r.get("snapshots").and_then(Value::as_array))
        .find_map(|s| s.first())
        .and_then(Value::as_object);
    let Some(first) = first else {
        return;
    };

    let columns: Vec<&str> = first
        .iter()
        .filter(|(_, v)| !v.is_array() && !v.is_object())
        .map(|(k, _)| k.as_str())
        .collect();

    let mut headers = vec!["strategy"];
    headers.extend(columns.iter().copied());
    let _ = wtr.write_record(&headers);

    for result in results {
        let name = result
            .get("strategy_name")
            .map(format_csv_value)
            .unwrap_or_default();
        if let Some(Value::Array(snapshots)) = result.get("snapshots") {
            for snapshot in snapshots {
                let mut row = vec![name.clone()];
                row.extend(
                    columns
                        .iter()
                        .map(|c| snapshot.get(*c).map(format_csv_value).unwrap_or_default()),
                );
                let _ = wtr.write_record(&row);
            }
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
