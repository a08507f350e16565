use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use thiserror::Error;

/// Represents errors that can occur during `ResourceSet` validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// A record was stored under an empty key.
    #[error("sheet \"{sheet}\" contains a record with an empty key")]
    EmptyKey { sheet: String },
}

/// Key/value pairs decoded from a `key=value;key=value` cell.
pub type TagMap = IndexMap<String, String>;

/// Key/value pairs decoded from a `key<>value||key<>value` options payload.
pub type OptionMap = IndexMap<String, String>;

/// The decoded `options` attribute of a rule.
///
/// Serialized as a single-entry map `{protocol: [option map]}`, so a rule can
/// never carry more than one protocol key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolOptions {
    /// Protocol token preceding `::` (e.g. `tcp`).
    pub protocol: String,
    /// Empty, or a single option map.
    pub options: Vec<OptionMap>,
}

impl ProtocolOptions {
    pub fn new(protocol: &str, options: Vec<OptionMap>) -> Self {
        ProtocolOptions {
            protocol: protocol.to_string(),
            options,
        }
    }
}

impl Serialize for ProtocolOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.protocol, &self.options)?;
        map.end()
    }
}

/// A single attribute value of a rule object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RuleAttr {
    Value(String),
    Options(ProtocolOptions),
}

/// One decoded entry of a rule-list cell (route rule, security rule, network details).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct RuleObject {
    pub attrs: IndexMap<String, RuleAttr>,
}

impl RuleObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute. A repeated attribute keeps its first position and takes the new value.
    pub fn set(&mut self, key: &str, value: RuleAttr) {
        self.attrs.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&RuleAttr> {
        self.attrs.get(key)
    }
}

/// A coerced cell value stored in a resource record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    /// CIDR tokens, each already wrapped in double quotes.
    Cidrs(Vec<String>),
    /// Plain comma-split references (e.g. security list OCIDs).
    Ids(Vec<String>),
    Rules(Vec<RuleObject>),
    Tags(TagMap),
}

/// The attributes of one resource, in the order they were assigned.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ResourceRecord {
    fields: IndexMap<String, FieldValue>,
}

impl ResourceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a field, overwriting any earlier value in place.
    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// All records produced from one sheet, keyed by the sheet's name column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceSet {
    /// The sheet name, used as the top-level variable name.
    pub name: String,
    records: IndexMap<String, ResourceRecord>,
}

impl ResourceSet {
    /// Creates a new, empty `ResourceSet` for the given sheet.
    pub fn new(name: &str) -> Self {
        ResourceSet {
            name: name.to_string(),
            records: IndexMap::new(),
        }
    }

    /// Replaces the record stored under `key` with an empty one and returns it.
    ///
    /// A key seen before keeps its original position in the set.
    pub fn reset(&mut self, key: &str) -> &mut ResourceRecord {
        let slot = self.records.entry(key.to_string()).or_default();
        *slot = ResourceRecord::new();
        slot
    }

    pub fn get(&self, key: &str) -> Option<&ResourceRecord> {
        self.records.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResourceRecord)> {
        self.records.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validates the set: every record key must be non-empty.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.records.keys().any(|k| k.is_empty()) {
            return Err(RecordError::EmptyKey {
                sheet: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl Serialize for ResourceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_set_reset_keeps_position() {
        let mut set = ResourceSet::new("vcns");
        set.reset("a")
            .set("display_name", FieldValue::Text("first".to_string()));
        set.reset("b")
            .set("display_name", FieldValue::Text("second".to_string()));
        set.reset("a").set("dns_label", FieldValue::Text("x".to_string()));

        let keys: Vec<&String> = set.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);

        let a = set.get("a").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.get("display_name"), None);
        assert_eq!(a.get("dns_label"), Some(&FieldValue::Text("x".to_string())));
    }

    #[test]
    fn test_resource_set_validate() {
        let mut set = ResourceSet::new("subnets");
        set.reset("subnet1");
        assert!(set.validate().is_ok());

        set.reset("");
        assert_eq!(
            set.validate().unwrap_err(),
            RecordError::EmptyKey {
                sheet: "subnets".to_string()
            }
        );
    }

    #[test]
    fn test_field_value_serialization() {
        let mut option = OptionMap::new();
        option.insert("80".to_string(), "allow".to_string());
        let mut rule = RuleObject::new();
        rule.set("destination", RuleAttr::Value("0.0.0.0/0".to_string()));
        rule.set(
            "options",
            RuleAttr::Options(ProtocolOptions::new("tcp", vec![option])),
        );

        let mut record = ResourceRecord::new();
        record.set("ocpus", FieldValue::Text("2".to_string()));
        record.set("memory_in_gbs", FieldValue::Integer(16));
        record.set("assign_public_ip", FieldValue::Boolean(false));
        record.set(
            "cidr_blocks",
            FieldValue::Cidrs(vec!["\"10.0.0.0/16\"".to_string()]),
        );
        record.set("route_rules_igw", FieldValue::Rules(vec![rule]));
        record.set("freeform_tags", FieldValue::Tags(TagMap::new()));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "ocpus": "2",
                "memory_in_gbs": 16,
                "assign_public_ip": false,
                "cidr_blocks": ["\"10.0.0.0/16\""],
                "route_rules_igw": [
                    {"destination": "0.0.0.0/0", "options": {"tcp": [{"80": "allow"}]}}
                ],
                "freeform_tags": {}
            })
        );
    }

    #[test]
    fn test_resource_set_serializes_records_in_order() {
        let mut set = ResourceSet::new("vcns");
        set.reset("z");
        set.reset("a");
        let text = serde_json::to_string(&set).unwrap();
        assert_eq!(text, r#"{"z":{},"a":{}}"#);
    }
}
