//! Reference rules for the ClinVar `VariationArchive` release
//!
//! The same rule set ships as `config/clinvar_variation_release.json`.

use super::config::{ColumnConfig, RuleSetConfig};
use super::RuleSet;
use crate::error::RuleConfigError;

pub const RECORD_TAG: &str = "VariationArchive";
pub const ID_ATTRIBUTE: &str = "VariationID";

/// Configuration of the reference rule set
pub fn clinvar_config() -> RuleSetConfig {
    RuleSetConfig {
        record_tag: RECORD_TAG.to_string(),
        id_attribute: Some(ID_ATTRIBUTE.to_string()),
        columns: vec![
            ColumnConfig::attribute("variation_id", ".", ID_ATTRIBUTE),
            ColumnConfig::attribute("rs_id", ".//XRef", "ID").where_eq("DB", "dbSNP"),
            ColumnConfig::attribute("gene", ".//GeneList/Gene", "Symbol"),
            ColumnConfig::text("variant_type", ".//SimpleAllele/VariantType"),
            ColumnConfig::attribute("consequence", ".//MolecularConsequence", "Type"),
            ColumnConfig::attribute("chromosome", ".//SequenceLocation", "Chr")
                .where_eq("Assembly", "GRCh38"),
            ColumnConfig::attribute("position", ".//SequenceLocation", "start")
                .where_eq("Assembly", "GRCh38"),
            ColumnConfig::text(
                "clinical_sig",
                ".//Classifications/GermlineClassification/Description",
            ),
            ColumnConfig::text("disease_name", ".//Trait[@Type='Disease']//ElementValue")
                .where_eq("Type", "Preferred"),
            ColumnConfig::text("species", "Species"),
            ColumnConfig::text("mim_gene", ".//Gene/OMIM"),
            ColumnConfig::attribute("mim_disease", ".//XRef", "ID")
                .where_eq("DB", "OMIM")
                .where_eq("Type", "MIM"),
        ],
    }
}

/// Compiled reference rule set
pub fn clinvar_rules() -> Result<RuleSet, RuleConfigError> {
    RuleSet::compile(&clinvar_config())
}
