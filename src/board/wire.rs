use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::error::EvaluateError;

/// Body of `POST <base>/calculate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// PNG data URI of the surface.
    pub image: String,
    pub dict_of_vars: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct CalculateResponse {
    data: Vec<ResponseItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ResponseItem {
    expr: String,
    result: String,
    assign: bool,
}

/// One recognised expression and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationItem {
    pub expression: String,
    pub answer: String,
    pub is_assignment: bool,
}

impl EvaluationItem {
    pub fn new(expression: impl Into<String>, answer: impl Into<String>, is_assignment: bool) -> Self {
        Self {
            expression: expression.into(),
            answer: answer.into(),
            is_assignment,
        }
    }
}

impl From<ResponseItem> for EvaluationItem {
    fn from(item: ResponseItem) -> Self {
        Self {
            expression: item.expr,
            answer: item.result,
            is_assignment: item.assign,
        }
    }
}

/// Parse a success body. Either every item parses or none is returned.
pub fn parse_response(body: &str) -> Result<Vec<EvaluationItem>, EvaluateError> {
    let response: CalculateResponse =
        serde_json::from_str(body).map_err(|err| EvaluateError::malformed(err.to_string()))?;
    Ok(response.data.into_iter().map(EvaluationItem::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_service_field_names() {
        let mut vars = BTreeMap::new();
        vars.insert("x".to_string(), "5".to_string());
        let request = CalculateRequest {
            image: "data:image/png;base64,AAAA".into(),
            dict_of_vars: vars,
        };
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["image"], "data:image/png;base64,AAAA");
        assert_eq!(json["dict_of_vars"]["x"], "5");
    }

    #[test]
    fn parses_items_in_order() {
        let items = parse_response(
            r#"{"data":[{"expr":"x","result":"5","assign":true},{"expr":"1+1","result":"2","assign":false}],"status":"success"}"#,
        )
        .unwrap();
        assert_eq!(
            items,
            vec![
                EvaluationItem::new("x", "5", true),
                EvaluationItem::new("1+1", "2", false),
            ]
        );
    }

    #[test]
    fn empty_data_is_valid() {
        assert_eq!(parse_response(r#"{"data":[]}"#).unwrap(), Vec::new());
    }

    #[test]
    fn missing_data_is_malformed() {
        let err = parse_response(r#"{"message":"ok"}"#).unwrap_err();
        assert!(matches!(err, EvaluateError::MalformedResponse(_)));
    }

    #[test]
    fn one_bad_item_rejects_the_whole_body() {
        let err = parse_response(
            r#"{"data":[{"expr":"x","result":"5","assign":true},{"expr":"y","assign":true}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, EvaluateError::MalformedResponse(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_response("<html>bad gateway</html>"),
            Err(EvaluateError::MalformedResponse(_))
        ));
    }
}
