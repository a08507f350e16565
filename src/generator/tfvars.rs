//! Line-oriented rewrite of the JSON assignment block into tfvars syntax.
//!
//! Each line is rewritten on its own, assuming the `"key": value` line shape
//! produced by [`super::json::to_assignment_block`]:
//!
//! 1. If the line contains `\"`, the first two `\"` are removed (quoted CIDR
//!    items); otherwise the first two `"` are removed (the key's quotes).
//! 2. The first `:` becomes ` =`.
//! 3. Unless the line contains `},`, every trailing `,` and `\n` is stripped
//!    and a single `\n` appended.

use super::base::Generator;
use super::json::to_assignment_block;
use crate::record::ResourceSet;
use anyhow::Result;

/// Rewrites a whole assignment block, line by line.
pub fn reformat(block: &str) -> String {
    block.split_inclusive('\n').map(reformat_line).collect()
}

/// Rewrites one line (including its `\n`, if any).
pub fn reformat_line(line: &str) -> String {
    let unquoted = if line.contains("\\\"") {
        line.replacen("\\\"", "", 2)
    } else {
        line.replacen('"', "", 2)
    };
    let assigned = unquoted.replacen(':', " =", 1);

    if assigned.contains("},") {
        assigned
    } else {
        let mut trimmed = assigned
            .trim_end_matches(|c| c == ',' || c == '\n')
            .to_string();
        trimmed.push('\n');
        trimmed
    }
}

/// Produces the final tfvars text by serializing the JSON block and rewriting it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyGenerator;

impl Generator for LegacyGenerator {
    fn generate(&self, data: &ResourceSet) -> Result<String> {
        Ok(reformat(&to_assignment_block(data)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reformat_line_scalar_entry() {
        assert_eq!(
            reformat_line("    \"compartment_id\": \"ocid1.compartment\",\n"),
            "    compartment_id = \"ocid1.compartment\"\n"
        );
        assert_eq!(
            reformat_line("        \"availability_domain\": \"Uocm:PHX-AD-1\"\n"),
            "        availability_domain = \"Uocm:PHX-AD-1\"\n"
        );
        assert_eq!(reformat_line("    \"ocpus\": 2,\n"), "    ocpus = 2\n");
    }

    #[test]
    fn test_reformat_line_keeps_comma_after_closing_object() {
        assert_eq!(reformat_line("        },\n"), "        },\n");
        assert_eq!(reformat_line("    \"defined_tags\": {},\n"), "    defined_tags = {},\n");
        assert_eq!(reformat_line("},\n"), "},\n");
    }

    #[test]
    fn test_reformat_line_strips_comma_after_closing_list() {
        assert_eq!(reformat_line("    ],\n"), "    ]\n");
        assert_eq!(reformat_line("    \"route_rules_ip\": [],\n"), "    route_rules_ip = []\n");
    }

    #[test]
    fn test_reformat_line_escaped_quotes() {
        assert_eq!(
            reformat_line("        \"\\\"10.0.0.0/16\\\"\",\n"),
            "        \"10.0.0.0/16\"\n"
        );
        assert_eq!(reformat_line("        \"\\\"\\\"\"\n"), "        \"\"\n");
    }

    #[test]
    fn test_reformat_line_plain_list_item() {
        assert_eq!(reformat_line("        \"ocid1.seclist\",\n"), "        ocid1.seclist\n");
    }

    #[test]
    fn test_reformat_line_without_newline() {
        assert_eq!(reformat_line("}"), "}\n");
        assert_eq!(reformat_line("    \"a\": \"b\","), "    a = \"b\"\n");
    }

    #[test]
    fn test_reformat_block() {
        let block = r#"route_tables = {
"rt1": {
    "display_name": "public-rt",
    "route_rules_igw": [
        {
            "destination": "0.0.0.0/0",
            "options": {
                "tcp": [
                    {
                        "80": "allow",
                        "443": "deny"
                    }
                ]
            }
        },
        {
            "destination": "10.0.0.0/8"
        }
    ],
    "route_rules_ip": [],
    "freeform_tags": {
        "env": "prod"
    },
    "defined_tags": {}
},
"rt2": {
    "display_name": "private-rt",
    "route_rules_igw": [],
    "route_rules_ip": [],
    "freeform_tags": {},
    "defined_tags": {}
},
}
"#;
        let expected = r#"route_tables = {
rt1 = {
    display_name = "public-rt"
    route_rules_igw = [
        {
            destination = "0.0.0.0/0"
            options = {
                tcp = [
                    {
                        80 = "allow"
                        443 = "deny"
                    }
                ]
            }
        },
        {
            destination = "10.0.0.0/8"
        }
    ]
    route_rules_ip = []
    freeform_tags = {
        env = "prod"
    },
    defined_tags = {}
},
rt2 = {
    display_name = "private-rt"
    route_rules_igw = []
    route_rules_ip = []
    freeform_tags = {},
    defined_tags = {}
},
}
"#;
        assert_eq!(reformat(block), expected);
    }
}
