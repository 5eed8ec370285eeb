use super::*;
use rr_core::Value;
use rr_query::{Param, ParamType};

#[test]
fn test_parse_order_keeps_key_order() {
    let order = parse_order(Some(r#"{"name": "ASC", "age": "desc"}"#)).unwrap();
    assert_eq!(
        order,
        vec![
            ("name".to_string(), "ASC".to_string()),
            ("age".to_string(), "desc".to_string())
        ]
    );
    assert!(parse_order(None).unwrap().is_empty());
    assert!(parse_order(Some(r#"{"name": 1}"#)).is_err());
    assert!(parse_order(Some("[")).is_err());
}

#[test]
fn test_format_rendered() {
    let rendered = RenderedQuery {
        sql: r#"SELECT e."id" FROM "users" e WHERE e."status" = $1 AND e."age" >= $2"#.to_string(),
        params: vec![
            Param {
                value: Value::from("active"),
                param_type: ParamType::Text,
            },
            Param {
                value: Value::Int(18),
                param_type: ParamType::Integer,
            },
        ],
    };
    assert_eq!(
        format_rendered(&rendered),
        "SELECT e.\"id\" FROM \"users\" e WHERE e.\"status\" = $1 AND e.\"age\" >= $2\n\
         -- $1 = \"active\" (text)\n\
         -- $2 = 18 (integer)\n"
    );
    let json = rendered_json(&rendered);
    assert_eq!(json["params"][1]["value"], 18);
    assert_eq!(json["params"][0]["type"], "text");
}
