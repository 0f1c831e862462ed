use serde_json::{Value, json};
use validator::{ValidationErrors, ValidationErrorsKind};

fn humanize(field: &str) -> String {
    let label = field.replace('_', " ");
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => label,
    }
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<Value>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in fields {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    out.push(json!({
                        "message": message,
                        "path": path,
                        "label": humanize(field),
                    }));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{}.{}", path, index), out);
                }
            }
        }
    }
}

/// Flattens validator output into `{message, path, label}` entries, sorted
/// by field path.
pub fn validation_details(errors: &ValidationErrors) -> Vec<Value> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out
}
