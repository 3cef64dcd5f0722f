//! Format decoded values for display (dump text). Record keys are sorted so output is stable.

use crate::value::Value;

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

/// Raw scalar string; compound values fall back to `Debug`.
pub fn format_scalar(v: &Value) -> String {
    match v {
        Value::Bool(x) => format!("{}", x),
        Value::U8(x) => format!("{}", x),
        Value::I8(x) => format!("{}", x),
        Value::I16(x) => format!("{}", x),
        Value::U16(x) => format!("{}", x),
        Value::I32(x) => format!("{}", x),
        Value::U32(x) => format!("{}", x),
        Value::Float(x) => format!("{}", x),
        Value::Double(x) => format!("{}", x),
        Value::String(s) => format!("{:?}", s),
        Value::Enum(name) => name.clone(),
        Value::Bytes(b) => format!("hex({})", hex_string(b)),
        _ => format!("{:?}", v),
    }
}

/// Multi-line dump of a decoded value.
pub fn dump_value(v: &Value) -> String {
    value_to_dump(v, 0)
}

fn value_to_dump(v: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        Value::Struct(m) => {
            if m.is_empty() {
                return format!("{}{{}}", pad);
            }
            let mut lines: Vec<String> = vec![format!("{}{{", pad)];
            let mut entries: Vec<_> = m.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (k, val) in entries {
                let sub = value_to_dump(val, indent + 1);
                lines.push(format!("{}  {}: {}", pad, k, sub.trim_start()));
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
        Value::List(lst) => {
            if lst.is_empty() {
                return format!("{}[]", pad);
            }
            let mut lines: Vec<String> = vec![format!("{}[", pad)];
            for (i, item) in lst.iter().enumerate() {
                let sub = value_to_dump(item, indent + 1);
                lines.push(format!("{}  [{}] {}", pad, i, sub.trim_start()));
            }
            lines.push(format!("{}]", pad));
            lines.join("\n")
        }
        Value::Union { member, value } => {
            let sub = value_to_dump(value, indent);
            format!("{}{} {}", pad, member, sub.trim_start())
        }
        _ => format!("{}{}", pad, format_scalar(v)),
    }
}
