//! Decoding of delimiter-encoded spreadsheet cells.
//!
//! Nested, repeatable structures are packed into a single cell with a small
//! set of delimiters:
//!
//! ```text
//! cidr-list  ::= item { "," item }
//! id-list    ::= item { "," item }
//! rule-list  ::= rule { "," rule }
//! rule       ::= attribute { ";" attribute }
//! attribute  ::= <key> "=" <value>
//!              | "options" "=" <protocol> "::" payload
//! payload    ::= option { "||" option }
//! option     ::= <key> "<>" <value>
//! tag-map    ::= tag { ";" tag }
//! tag        ::= <key> "=" <value>
//! ```
//!
//! `=` and `::` split on their first occurrence. A payload is only decoded
//! when it is non-empty and contains `||`; anything else yields an empty
//! option list. Every production reports failure through [`GrammarError`],
//! and a single malformed fragment fails the whole cell.

use crate::record::{OptionMap, ProtocolOptions, RuleAttr, RuleObject, TagMap};
use thiserror::Error;

/// The rule attribute whose value uses the nested `protocol::payload` form.
pub const OPTIONS_ATTRIBUTE: &str = "options";

/// Errors raised while decoding a cell.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum GrammarError {
    /// A `key=value` pair without `=`.
    #[error("expected `key=value`, found \"{fragment}\"")]
    MissingAssignment { fragment: String },
    /// An `options` value without the `::` protocol separator.
    #[error("expected `protocol::options`, found \"{fragment}\"")]
    MissingProtocolSeparator { fragment: String },
    /// An option entry that is not exactly `key<>value`.
    #[error("expected `key<>value`, found \"{fragment}\"")]
    MalformedOption { fragment: String },
}

/// Splits a CIDR cell on `,` and wraps every item in double quotes.
///
/// An empty cell yields a single quoted empty item.
pub fn parse_cidr_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|item| format!("\"{}\"", item)).collect()
}

/// Splits a reference-list cell on `,` without any further decoding.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Decodes a rule-list cell such as `destination=0.0.0.0/0;network_entity_id=ocid1`.
///
/// An empty cell decodes to an empty list.
pub fn parse_rule_list(raw: &str) -> Result<Vec<RuleObject>, GrammarError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',').map(parse_rule).collect()
}

fn parse_rule(item: &str) -> Result<RuleObject, GrammarError> {
    let mut rule = RuleObject::new();
    for pair in item.split(';') {
        let (key, value) = parse_assignment(pair)?;
        let attr = if key == OPTIONS_ATTRIBUTE {
            RuleAttr::Options(parse_protocol_options(value)?)
        } else {
            RuleAttr::Value(value.to_string())
        };
        rule.set(key, attr);
    }
    Ok(rule)
}

fn parse_assignment(pair: &str) -> Result<(&str, &str), GrammarError> {
    pair.split_once('=')
        .ok_or_else(|| GrammarError::MissingAssignment {
            fragment: pair.to_string(),
        })
}

fn parse_protocol_options(value: &str) -> Result<ProtocolOptions, GrammarError> {
    let (protocol, payload) =
        value
            .split_once("::")
            .ok_or_else(|| GrammarError::MissingProtocolSeparator {
                fragment: value.to_string(),
            })?;

    let mut options = Vec::new();
    if !payload.is_empty() && payload.contains("||") {
        let mut option_map = OptionMap::new();
        for option in payload.split("||") {
            let (key, value) = parse_option(option)?;
            option_map.insert(key.to_string(), value.to_string());
        }
        options.push(option_map);
    }
    Ok(ProtocolOptions::new(protocol, options))
}

fn parse_option(option: &str) -> Result<(&str, &str), GrammarError> {
    let mut parts = option.split("<>");
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => Ok((key, value)),
        _ => Err(GrammarError::MalformedOption {
            fragment: option.to_string(),
        }),
    }
}

/// Decodes a tag cell such as `env=prod;team=infra`.
///
/// An empty cell decodes to an empty map.
pub fn parse_tag_map(raw: &str) -> Result<TagMap, GrammarError> {
    let mut tags = TagMap::new();
    if raw.is_empty() {
        return Ok(tags);
    }
    for pair in raw.split(';') {
        let (key, value) = parse_assignment(pair)?;
        tags.insert(key.to_string(), value.to_string());
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Re-encodes decoded rules with the same delimiters.
    fn encode_rule_list(rules: &[RuleObject]) -> String {
        rules
            .iter()
            .map(|rule| {
                rule.attrs
                    .iter()
                    .map(|(key, attr)| match attr {
                        RuleAttr::Value(v) => format!("{}={}", key, v),
                        RuleAttr::Options(o) => {
                            let payload = o
                                .options
                                .iter()
                                .flat_map(|m| m.iter().map(|(k, v)| format!("{}<>{}", k, v)))
                                .collect::<Vec<_>>()
                                .join("||");
                            format!("{}={}::{}", key, o.protocol, payload)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(";")
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn test_parse_cidr_list() {
        let cidrs = parse_cidr_list("10.0.0.0/16,10.1.0.0/16,192.168.0.0/24");
        assert_eq!(
            cidrs,
            vec![
                "\"10.0.0.0/16\"".to_string(),
                "\"10.1.0.0/16\"".to_string(),
                "\"192.168.0.0/24\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_cidr_list_empty_cell() {
        assert_eq!(parse_cidr_list(""), vec!["\"\"".to_string()]);
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(
            parse_id_list("ocid1.a,ocid1.b"),
            vec!["ocid1.a".to_string(), "ocid1.b".to_string()]
        );
        assert_eq!(parse_id_list(""), vec!["".to_string()]);
    }

    #[test]
    fn test_parse_rule_list() -> Result<(), GrammarError> {
        let rules = parse_rule_list(
            "destination=0.0.0.0/0;network_entity_id=ocid1.igw,destination=10.0.0.0/8;description=a=b",
        )?;
        assert_eq!(rules.len(), 2);
        assert_eq!(
            serde_json::to_value(&rules).unwrap(),
            json!([
                {"destination": "0.0.0.0/0", "network_entity_id": "ocid1.igw"},
                {"destination": "10.0.0.0/8", "description": "a=b"}
            ])
        );
        Ok(())
    }

    #[test]
    fn test_parse_rule_list_with_options() -> Result<(), GrammarError> {
        let rules = parse_rule_list("options=tcp::80<>allow||443<>deny")?;
        assert_eq!(
            serde_json::to_value(&rules[0]).unwrap(),
            json!({"options": {"tcp": [{"80": "allow", "443": "deny"}]}})
        );
        Ok(())
    }

    #[test]
    fn test_parse_rule_list_options_without_double_bar() -> Result<(), GrammarError> {
        let rules = parse_rule_list("protocol=6;options=tcp::80<>allow,protocol=17;options=udp::")?;
        assert_eq!(
            serde_json::to_value(&rules).unwrap(),
            json!([
                {"protocol": "6", "options": {"tcp": []}},
                {"protocol": "17", "options": {"udp": []}}
            ])
        );
        Ok(())
    }

    #[test]
    fn test_parse_rule_list_malformed_pair_fails_whole_cell() {
        let err = parse_rule_list("destination=0.0.0.0/0,destination10.0.0.0/8").unwrap_err();
        assert_eq!(
            err,
            GrammarError::MissingAssignment {
                fragment: "destination10.0.0.0/8".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rule_list_malformed_options() {
        assert_eq!(
            parse_rule_list("options=tcp").unwrap_err(),
            GrammarError::MissingProtocolSeparator {
                fragment: "tcp".to_string()
            }
        );
        assert_eq!(
            parse_rule_list("options=tcp::80<>allow||443").unwrap_err(),
            GrammarError::MalformedOption {
                fragment: "443".to_string()
            }
        );
        assert_eq!(
            parse_rule_list("options=tcp::a<>b<>c||d<>e").unwrap_err(),
            GrammarError::MalformedOption {
                fragment: "a<>b<>c".to_string()
            }
        );
    }

    #[test]
    fn test_parse_rule_list_trailing_separator() {
        assert!(parse_rule_list("destination=0.0.0.0/0;").is_err());
        assert!(parse_rule_list("destination=0.0.0.0/0,").is_err());
    }

    #[test]
    fn test_parse_rule_list_empty_cell() {
        assert_eq!(parse_rule_list(""), Ok(Vec::new()));
    }

    #[test]
    fn test_parse_rule_list_reencoding_is_stable() -> Result<(), GrammarError> {
        let cells = [
            "destination=0.0.0.0/0;network_entity_id=ocid1.drg",
            "source=10.0.0.0/8;protocol=6;options=tcp::min<>22||max<>22,source=0.0.0.0/0;protocol=1",
            "protocol=17;options=udp::53<>allow",
        ];
        for cell in cells {
            let decoded = parse_rule_list(cell)?;
            let redecoded = parse_rule_list(&encode_rule_list(&decoded))?;
            assert_eq!(decoded, redecoded, "cell: {}", cell);
        }
        Ok(())
    }

    #[test]
    fn test_parse_tag_map() -> Result<(), GrammarError> {
        let tags = parse_tag_map("env=prod;team=infra")?;
        assert_eq!(
            serde_json::to_value(&tags).unwrap(),
            json!({"env": "prod", "team": "infra"})
        );
        let keys: Vec<&String> = tags.keys().collect();
        assert_eq!(keys, vec!["env", "team"]);

        assert_eq!(parse_tag_map("")?, TagMap::new());
        Ok(())
    }

    #[test]
    fn test_parse_tag_map_malformed() {
        assert_eq!(
            parse_tag_map("env=prod;team").unwrap_err(),
            GrammarError::MissingAssignment {
                fragment: "team".to_string()
            }
        );
    }
}
