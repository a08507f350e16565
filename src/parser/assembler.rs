use crate::parser::cell::{self, GrammarError};
use crate::parser::workbook::{Row, Sheet};
use crate::record::{FieldValue, ResourceRecord, ResourceSet, TagMap};
use std::num::ParseIntError;
use thiserror::Error;
use tracing::{debug, info, warn};
use Coercion::*;

/// How a column's raw cell text becomes a [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Copy the cell unchanged.
    Text,
    /// Copy the cell in lowercase.
    Lowercase,
    /// Parse as a signed integer; failure is fatal.
    Integer,
    /// Parse case-insensitive `true`/`false`.
    Boolean,
    /// Plain comma split.
    IdList,
    /// Comma split, every item quoted.
    CidrList,
    RuleList,
    Tags,
}

/// When a column's field is written into its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Written while scanning the row, in sheet column order.
    Inline,
    /// Written after all inline fields, in table order. The column must exist.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub coercion: Coercion,
    pub placement: Placement,
}

const fn inline(name: &'static str, coercion: Coercion) -> Column {
    Column {
        name,
        coercion,
        placement: Placement::Inline,
    }
}

const fn deferred(name: &'static str, coercion: Coercion) -> Column {
    Column {
        name,
        coercion,
        placement: Placement::Deferred,
    }
}

/// The column layout of one resource sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Sheet name, also the top-level variable name.
    pub sheet: &'static str,
    /// Column holding the unique record key.
    pub key_column: &'static str,
    pub columns: &'static [Column],
}

const ROUTE_TABLE_COLUMNS: &[Column] = &[
    inline("compartment_id", Text),
    inline("vcn_id", Text),
    inline("display_name", Text),
    deferred("route_rules_drg", RuleList),
    deferred("route_rules_igw", RuleList),
    deferred("route_rules_sgw", RuleList),
    deferred("route_rules_ngw", RuleList),
    deferred("route_rules_lpg", RuleList),
    deferred("route_rules_ip", RuleList),
    deferred("freeform_tags", Tags),
    deferred("defined_tags", Tags),
];

const VCN_COLUMNS: &[Column] = &[
    inline("compartment_id", Text),
    inline("display_name", Text),
    inline("dns_label", Text),
    deferred("cidr_blocks", CidrList),
];

const DRG_ATTACHMENT_COLUMNS: &[Column] = &[
    inline("drg_id", Text),
    inline("display_name", Text),
    inline("drg_route_table_id", Text),
    inline("vcn_id", Text),
    deferred("network_details", RuleList),
    deferred("freeform_tags", Tags),
    deferred("defined_tags", Tags),
];

const SECLIST_COLUMNS: &[Column] = &[
    inline("compartment_id", Text),
    inline("vcn_id", Text),
    inline("display_name", Text),
    deferred("ingress_sec_rules", RuleList),
    deferred("egress_sec_rules", RuleList),
    deferred("freeform_tags", Tags),
    deferred("defined_tags", Tags),
];

const SUBNET_COLUMNS: &[Column] = &[
    inline("availability_domain", Text),
    inline("cidr_block", Text),
    inline("compartment_id", Text),
    inline("vcn_id", Text),
    inline("display_name", Text),
    inline("prohibit_public_ip_on_vnic", Lowercase),
    inline("route_table_id", Text),
    inline("dns_label", Text),
    inline("dhcp_options_id", Text),
    inline("security_list_ids", IdList),
    deferred("freeform_tags", Tags),
    deferred("defined_tags", Tags),
];

const INSTANCE_COLUMNS: &[Column] = &[
    inline("availability_domain", Integer),
    inline("compartment_id", Text),
    inline("shape", Text),
    inline("display_name", Text),
    inline("boot_volume_size_in_gbs", Integer),
    inline("fault_domain", Text),
    inline("source_id", Text),
    inline("source_type", Text),
    inline("network_compartment_id", Text),
    inline("vcn_compartment_id", Text),
    inline("vcn_name", Text),
    inline("subnet_id", Text),
    inline("assign_public_ip", Boolean),
    inline("private_ip", Text),
    inline("ocpus", Text),
    inline("memory_in_gbs", Integer),
    inline("update_is_pv_encryption_in_transit_enabled", Boolean),
    deferred("freeform_tags", Tags),
    deferred("defined_tags", Tags),
];

/// Every sheet the converter knows how to assemble.
pub const CATEGORIES: &[Category] = &[
    Category {
        sheet: "route_tables",
        key_column: "route_table_name",
        columns: ROUTE_TABLE_COLUMNS,
    },
    Category {
        sheet: "vcns",
        key_column: "vcn_name",
        columns: VCN_COLUMNS,
    },
    Category {
        sheet: "drg_attachments",
        key_column: "drg_attachment_name",
        columns: DRG_ATTACHMENT_COLUMNS,
    },
    Category {
        sheet: "seclists",
        key_column: "seclist_name",
        columns: SECLIST_COLUMNS,
    },
    Category {
        sheet: "subnets",
        key_column: "subnet_name",
        columns: SUBNET_COLUMNS,
    },
    Category {
        sheet: "instances",
        key_column: "instance_name",
        columns: INSTANCE_COLUMNS,
    },
];

impl Category {
    /// Looks up the category registered for a sheet name.
    pub fn for_sheet(name: &str) -> Option<&'static Category> {
        CATEGORIES.iter().find(|c| c.sheet == name)
    }

    /// Looks up the column definition for a column name.
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// What to do with a boolean cell that is neither `true` nor `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolPolicy {
    /// Reject the literal.
    #[default]
    Strict,
    /// Reuse the last boolean coerced in the same sheet.
    CarryOver,
}

/// What to do with a cell the grammar cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellPolicy {
    /// Store an empty list or map and log a warning.
    #[default]
    Degrade,
    /// Fail the run.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssemblerOptions {
    pub bool_policy: BoolPolicy,
    pub cell_policy: CellPolicy,
}

/// Represents errors that stop the assembly of a sheet.
///
/// `row` is the 1-based worksheet row, counting the header row.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssembleError {
    #[error("sheet \"{sheet}\" has no key column \"{column}\"")]
    MissingKeyColumn { sheet: String, column: String },
    #[error("sheet \"{sheet}\" has no column \"{column}\"")]
    MissingColumn { sheet: String, column: String },
    #[error("sheet \"{sheet}\" row {row}: column \"{column}\" is not an integer: \"{value}\"")]
    InvalidInteger {
        sheet: String,
        row: usize,
        column: String,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("sheet \"{sheet}\" row {row}: column \"{column}\" is not a boolean: \"{value}\"")]
    InvalidBoolean {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },
    #[error(
        "sheet \"{sheet}\" row {row}: column \"{column}\" is not a boolean (\"{value}\") and no earlier value can be reused"
    )]
    NoPriorBoolean {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },
    #[error("sheet \"{sheet}\" row {row}: column \"{column}\" is malformed")]
    MalformedCell {
        sheet: String,
        row: usize,
        column: String,
        #[source]
        source: GrammarError,
    },
}

/// Builds the records of one sheet from its column table.
pub struct RowAssembler {
    category: &'static Category,
    options: AssemblerOptions,
    last_bool: Option<bool>,
}

impl RowAssembler {
    /// Creates a new `RowAssembler` for the given category.
    pub fn new(category: &'static Category, options: AssemblerOptions) -> Self {
        RowAssembler {
            category,
            options,
            last_bool: None,
        }
    }

    /// Scans the sheet top to bottom and returns its finished records.
    pub fn assemble(mut self, sheet: &Sheet) -> Result<ResourceSet, AssembleError> {
        info!("Processing sheet {}", sheet.name);
        let mut set = ResourceSet::new(&sheet.name);

        // Column checks only apply once there is data to assemble.
        if sheet.rows.iter().all(is_blank_row) {
            debug!("Sheet {} has no data rows", sheet.name);
            return Ok(set);
        }
        self.check_columns(sheet)?;

        for (index, row) in sheet.rows.iter().enumerate() {
            let row_number = index + 2;
            if is_blank_row(row) {
                debug!("Skipping empty row {} in sheet {}", row_number, sheet.name);
                continue;
            }
            let key = &row[self.category.key_column];
            if key.is_empty() {
                warn!(
                    "Skipping row {} in sheet {}: empty \"{}\"",
                    row_number, sheet.name, self.category.key_column
                );
                continue;
            }

            let mut record = ResourceRecord::new();
            self.assemble_row(sheet, row_number, row, &mut record)?;
            *set.reset(key) = record;
        }
        debug!("Assembled {} record(s) from sheet {}", set.len(), sheet.name);
        Ok(set)
    }

    fn check_columns(&self, sheet: &Sheet) -> Result<(), AssembleError> {
        if !sheet.has_column(self.category.key_column) {
            return Err(AssembleError::MissingKeyColumn {
                sheet: sheet.name.clone(),
                column: self.category.key_column.to_string(),
            });
        }
        let missing = self
            .category
            .columns
            .iter()
            .filter(|c| c.placement == Placement::Deferred)
            .find(|c| !sheet.has_column(c.name));
        if let Some(column) = missing {
            return Err(AssembleError::MissingColumn {
                sheet: sheet.name.clone(),
                column: column.name.to_string(),
            });
        }
        Ok(())
    }

    fn assemble_row(
        &mut self,
        sheet: &Sheet,
        row_number: usize,
        row: &Row,
        record: &mut ResourceRecord,
    ) -> Result<(), AssembleError> {
        let category = self.category;
        for (name, raw) in row {
            let Some(column) = category.column(name) else {
                continue;
            };
            if column.placement == Placement::Inline {
                let value = self.coerce(sheet, row_number, column, raw)?;
                record.set(column.name, value);
            }
        }
        for column in category
            .columns
            .iter()
            .filter(|c| c.placement == Placement::Deferred)
        {
            let value = self.coerce(sheet, row_number, column, &row[column.name])?;
            record.set(column.name, value);
        }
        Ok(())
    }

    fn coerce(
        &mut self,
        sheet: &Sheet,
        row_number: usize,
        column: &Column,
        raw: &str,
    ) -> Result<FieldValue, AssembleError> {
        let value = match column.coercion {
            Text => FieldValue::Text(raw.to_string()),
            Lowercase => FieldValue::Text(raw.to_lowercase()),
            Integer => {
                let parsed = raw.trim().parse::<i64>().map_err(|source| {
                    AssembleError::InvalidInteger {
                        sheet: sheet.name.clone(),
                        row: row_number,
                        column: column.name.to_string(),
                        value: raw.to_string(),
                        source,
                    }
                })?;
                FieldValue::Integer(parsed)
            }
            Boolean => FieldValue::Boolean(self.coerce_bool(sheet, row_number, column, raw)?),
            IdList => FieldValue::Ids(cell::parse_id_list(raw)),
            CidrList => FieldValue::Cidrs(cell::parse_cidr_list(raw)),
            RuleList => FieldValue::Rules(self.decode_or_degrade(
                sheet,
                row_number,
                column,
                cell::parse_rule_list(raw),
            )?),
            Tags => FieldValue::Tags(self.decode_or_degrade::<TagMap>(
                sheet,
                row_number,
                column,
                cell::parse_tag_map(raw),
            )?),
        };
        Ok(value)
    }

    fn coerce_bool(
        &mut self,
        sheet: &Sheet,
        row_number: usize,
        column: &Column,
        raw: &str,
    ) -> Result<bool, AssembleError> {
        let parsed = match raw.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        };
        if let Some(value) = parsed {
            self.last_bool = Some(value);
            return Ok(value);
        }

        match (self.options.bool_policy, self.last_bool) {
            (BoolPolicy::CarryOver, Some(previous)) => {
                warn!(
                    "Sheet {} row {}: \"{}\" is not a boolean in column {}, reusing {}",
                    sheet.name, row_number, raw, column.name, previous
                );
                Ok(previous)
            }
            (BoolPolicy::CarryOver, None) => Err(AssembleError::NoPriorBoolean {
                sheet: sheet.name.clone(),
                row: row_number,
                column: column.name.to_string(),
                value: raw.to_string(),
            }),
            (BoolPolicy::Strict, _) => Err(AssembleError::InvalidBoolean {
                sheet: sheet.name.clone(),
                row: row_number,
                column: column.name.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    fn decode_or_degrade<T: Default>(
        &self,
        sheet: &Sheet,
        row_number: usize,
        column: &Column,
        decoded: Result<T, GrammarError>,
    ) -> Result<T, AssembleError> {
        match decoded {
            Ok(value) => Ok(value),
            Err(source) => match self.options.cell_policy {
                CellPolicy::Degrade => {
                    warn!(
                        "Sheet {} row {}: column {} is malformed ({}), using an empty value",
                        sheet.name, row_number, column.name, source
                    );
                    Ok(T::default())
                }
                CellPolicy::Abort => Err(AssembleError::MalformedCell {
                    sheet: sheet.name.clone(),
                    row: row_number,
                    column: column.name.to_string(),
                    source,
                }),
            },
        }
    }
}

fn is_blank_row(row: &Row) -> bool {
    row.values().all(|v| v.is_empty())
}

/// Assembles a sheet with the category registered for its name.
///
/// Returns `Ok(None)` when no category is registered.
pub fn assemble_sheet(
    sheet: &Sheet,
    options: AssemblerOptions,
) -> Result<Option<ResourceSet>, AssembleError> {
    match Category::for_sheet(&sheet.name) {
        Some(category) => RowAssembler::new(category, options).assemble(sheet).map(Some),
        None => Ok(None),
    }
}
