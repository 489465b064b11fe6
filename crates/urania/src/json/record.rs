//! Records described as ordered field lists, rendered by one writer.

use crate::chart::BatchSummary;
use crate::ephemeris::types::{AngleRecord, ApsisPoint, BodyPosition, NodeApsisRecord, NodeMethod};
use crate::json::escape::escape_into;

/// A JSON value with its rendering precision attached.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    /// Degrees and angular speeds, 6 decimals.
    Angle(f64),
    /// Distances (AU) and their speeds, 9 decimals.
    Distance(f64),
    /// Julian days, 6 decimals.
    Time(f64),
    Text(&'a str),
    Bool(bool),
    Object(Vec<Field<'a>>),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field<'a> {
    pub key: &'static str,
    pub value: Value<'a>,
}

impl<'a> Field<'a> {
    pub fn new(key: &'static str, value: Value<'a>) -> Self {
        Self { key, value }
    }
}

fn write_number(out: &mut String, value: f64, decimals: usize) {
    if value.is_finite() {
        out.push_str(&format!("{:.*}", decimals, value));
    } else {
        out.push_str("null");
    }
}

pub fn write_value(out: &mut String, value: &Value<'_>) {
    match value {
        Value::Int(n) => {
            out.push_str(&n.to_string());
        }
        Value::Angle(v) | Value::Time(v) => write_number(out, *v, 6),
        Value::Distance(v) => write_number(out, *v, 9),
        Value::Text(s) => {
            out.push('"');
            escape_into(out, s);
            out.push('"');
        }
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Object(fields) => write_object(out, fields),
        Value::Null => out.push_str("null"),
    }
}

pub fn write_object(out: &mut String, fields: &[Field<'_>]) {
    if fields.is_empty() {
        out.push_str("{ }");
        return;
    }
    out.push_str("{ ");
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('"');
        out.push_str(field.key);
        out.push_str("\": ");
        write_value(out, &field.value);
    }
    out.push_str(" }");
}

/// Every kind of object the assembler emits.
#[derive(Debug, Clone, Copy)]
pub enum Record<'a> {
    /// A body position. `jd_ut` is echoed in single-body documents.
    Body {
        position: &'a BodyPosition,
        jd_ut: Option<f64>,
    },
    Angle(&'a AngleRecord),
    /// A node/apsis set. `epoch` (ET and method) is echoed in single-body documents.
    Nodes {
        record: &'a NodeApsisRecord,
        epoch: Option<(f64, NodeMethod)>,
    },
    Summary(&'a BatchSummary),
    Warning(&'a str),
}

fn apsis_fields(point: &ApsisPoint) -> Vec<Field<'_>> {
    vec![
        Field::new("long", Value::Angle(point.long)),
        Field::new("lat", Value::Angle(point.lat)),
        Field::new("distance", Value::Distance(point.distance)),
        Field::new("speed_long", Value::Angle(point.speed_long)),
        Field::new("speed_lat", Value::Angle(point.speed_lat)),
        Field::new("speed_dist", Value::Distance(point.speed_dist)),
        Field::new("long_s", Value::Text(&point.long_s)),
    ]
}

impl<'a> Record<'a> {
    pub fn fields(&self) -> Vec<Field<'a>> {
        match *self {
            Record::Body { position, jd_ut } => {
                let mut fields = vec![
                    Field::new("index", Value::Int(position.index.into())),
                    Field::new("name", Value::Text(&position.name)),
                    Field::new("long", Value::Angle(position.long)),
                    Field::new("lat", Value::Angle(position.lat)),
                    Field::new("distance", Value::Distance(position.distance)),
                    Field::new("speed", Value::Angle(position.speed)),
                    Field::new("long_s", Value::Text(&position.long_s)),
                ];
                if let Some(jd) = jd_ut {
                    fields.push(Field::new("jd_ut", Value::Time(jd)));
                }
                fields.push(Field::new("iflagret", Value::Int(position.status.into())));
                fields.push(Field::new("error", Value::Bool(position.is_error())));
                if let Some(message) = &position.error {
                    fields.push(Field::new("error_msg", Value::Text(message)));
                }
                fields
            }
            Record::Angle(angle) => vec![
                Field::new("name", Value::Text(&angle.name)),
                Field::new("long", Value::Angle(angle.long)),
                Field::new("long_s", Value::Text(&angle.long_s)),
            ],
            Record::Nodes { record, epoch } => {
                let mut fields = vec![
                    Field::new("index", Value::Int(record.index.into())),
                    Field::new("name", Value::Text(&record.name)),
                ];
                if let Some((jd_et, method)) = epoch {
                    fields.push(Field::new("jd_et", Value::Time(jd_et)));
                    fields.push(Field::new("method", Value::Int(method.bits().into())));
                }
                match (&record.points, &record.error) {
                    (Some(points), None) => {
                        fields.push(Field::new(
                            "ascending_node",
                            Value::Object(apsis_fields(&points.ascending_node)),
                        ));
                        fields.push(Field::new(
                            "descending_node",
                            Value::Object(apsis_fields(&points.descending_node)),
                        ));
                        fields.push(Field::new(
                            "perihelion",
                            Value::Object(apsis_fields(&points.perihelion)),
                        ));
                        fields.push(Field::new(
                            "aphelion",
                            Value::Object(apsis_fields(&points.aphelion)),
                        ));
                        fields.push(Field::new("error", Value::Bool(false)));
                    }
                    (_, error) => {
                        fields.push(Field::new("error", Value::Bool(true)));
                        fields.push(Field::new(
                            "error_msg",
                            Value::Text(error.as_deref().unwrap_or("")),
                        ));
                    }
                }
                fields
            }
            Record::Summary(summary) => vec![
                Field::new("calculated", Value::Int(summary.calculated as i64)),
                Field::new("errors", Value::Int(summary.errors as i64)),
                Field::new("total_requested", Value::Int(summary.total_requested as i64)),
            ],
            Record::Warning(text) => vec![Field::new("warning", Value::Text(text))],
        }
    }

    pub fn write(&self, out: &mut String) {
        write_object(out, &self.fields());
    }

    pub fn to_json(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_policy() {
        let mut out = String::new();
        write_value(&mut out, &Value::Angle(263.12345678));
        out.push(' ');
        write_value(&mut out, &Value::Distance(0.983));
        out.push(' ');
        write_value(&mut out, &Value::Time(f64::NAN));
        out.push(' ');
        write_value(&mut out, &Value::Int(-258));
        assert_eq!(out, "263.123457 0.983000000 null -258");
    }

    #[test]
    fn test_body_field_order() {
        let position = BodyPosition::computed(
            0,
            "Sun".into(),
            &[273.5, 0.0001, 0.98, 1.019, 0.0, 0.0],
            258,
        );
        let json = Record::Body {
            position: &position,
            jd_ut: Some(2460304.0),
        }
        .to_json();
        assert!(json.starts_with(
            r#"{ "index": 0, "name": "Sun", "long": 273.500000, "lat": 0.000100, "distance": 0.980000000, "speed": 1.019000, "long_s": " 3 cp 30'"#
        ));
        assert!(json.ends_with(r#""jd_ut": 2460304.000000, "iflagret": 258, "error": false }"#));
    }

    #[test]
    fn test_failed_body_carries_message() {
        let position = BodyPosition::failed(17, "Ceres".into(), -1, "seas_18.se1 \"missing\"".into());
        let json = Record::Body {
            position: &position,
            jd_ut: None,
        }
        .to_json();
        assert!(json.ends_with(r#""iflagret": -1, "error": true, "error_msg": "seas_18.se1 \"missing\"" }"#));
    }

    #[test]
    fn test_node_error_record() {
        let record = NodeApsisRecord {
            index: 1,
            name: "Moon".into(),
            points: None,
            error: Some("no data".into()),
        };
        let json = Record::Nodes {
            record: &record,
            epoch: Some((2460304.5, NodeMethod::MEAN)),
        }
        .to_json();
        assert_eq!(
            json,
            r#"{ "index": 1, "name": "Moon", "jd_et": 2460304.500000, "method": 1, "error": true, "error_msg": "no data" }"#
        );
    }
}
