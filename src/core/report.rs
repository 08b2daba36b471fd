//! LaTeX rendering of taxonomy database statistics.
//!
//! Rows end in `\\`; genera are separated by an empty table row (`\\\\`).

use std::io::Write;

use crate::core::db::{GenusSummary, TaxonPhotoCount};
use crate::error::FeatureError;

/// `\PhotoCount` and `\SpeciesCount` macro definitions
pub fn write_db_stats<W: Write>(out: &mut W, photo_count: i64, species_count: usize) -> anyhow::Result<()> {
    writeln!(out, "\\newcommand{{\\PhotoCount}}{{{}}}", photo_count)?;
    writeln!(out, "\\newcommand{{\\SpeciesCount}}{{{}}}", species_count)?;
    Ok(())
}

/// Species table grouped by genus and section, `columns` species per table row.
///
/// `rows` must be ordered by genus, then section, as `taxa_photo_count` returns them.
pub fn write_taxa_table<W: Write>(out: &mut W, rows: &[TaxonPhotoCount], columns: usize) -> anyhow::Result<()> {
    if columns == 0 {
        return Err(FeatureError::InvalidColumns.into());
    }

    let mut current_genus: Option<&str> = None;
    let mut current_section: Option<&str> = None;
    let mut species_count = 0usize;

    for row in rows {
        let new_genus = current_genus != Some(row.genus.as_str());
        if new_genus {
            if current_genus.is_some() {
                write!(out, " \\\\\\\\\n")?;
            }
            write!(out, "\\textit{{{}}} \\\\\n", row.genus)?;
            write!(out, "\\midrule\n")?;
        }

        if new_genus || current_section != row.section.as_deref() {
            current_section = row.section.as_deref();
            species_count = 0;
            if !new_genus {
                write!(out, " \\\\\n")?;
            }
            if let Some(section) = current_section {
                write!(out, "Section \\textit{{{}}} \\\\\n", section)?;
            }
        }
        current_genus = Some(row.genus.as_str());

        if species_count > 0 {
            if species_count % columns == 0 {
                write!(out, " \\\\\n")?;
            } else {
                write!(out, " & ")?;
            }
        }

        let initial = row.genus.chars().next().unwrap_or('?');
        write!(out, "\\textit{{{}. {}}} & {}", initial, row.species, row.photos)?;
        species_count += 1;
    }

    if !rows.is_empty() {
        write!(out, " \\\\\n")?;
    }
    Ok(())
}

/// One row per genus: sections, species and photo counts
pub fn write_taxa_summary<W: Write>(out: &mut W, rows: &[GenusSummary]) -> anyhow::Result<()> {
    for row in rows {
        writeln!(
            out,
            "\\textit{{{}}} & {} & {} & {} \\\\",
            row.genus, row.sections, row.species, row.photos
        )?;
    }
    Ok(())
}
