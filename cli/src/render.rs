//! Plain-text and JSON output for CLI commands.

use std::fmt::Write;

use anyhow::Result;
use serde_json::json;

use recon_core::{compute_progress, is_ready_for_sale};
use recon_types::{Disposition, TeamNote, VehicleRecord, format_usd};

pub fn record_json(record: &VehicleRecord) -> Result<String> {
    let mut value = serde_json::to_value(record)?;
    if let Some(fields) = value.as_object_mut() {
        fields.insert("lifecycleState".into(), json!(record.state()));
        fields.insert("progress".into(), json!(compute_progress(record)));
        fields.insert("readyForSale".into(), json!(is_ready_for_sale(record)));
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn records_json(records: &[VehicleRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn note_json(note: &TeamNote) -> Result<String> {
    Ok(serde_json::to_string_pretty(note)?)
}

/// One line per vehicle: id, state, progress, name, location.
pub fn record_line(record: &VehicleRecord) -> String {
    let location = if record.location.is_empty() {
        "-"
    } else {
        record.location.as_str()
    };
    format!(
        "{:<8} {:<8} {:>4.0}%  {:<28} {}",
        record.id.as_str(),
        record.state().as_str(),
        compute_progress(record),
        record.display_name(),
        location,
    )
}

pub fn record_detail(record: &VehicleRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", record.display_name(), record.id);
    if let Some(trim) = &record.trim {
        let _ = writeln!(out, "  trim:      {trim}");
    }
    let _ = writeln!(out, "  vin:       {}", record.vin);
    let _ = writeln!(out, "  price:     {}", format_usd(record.price));
    let _ = writeln!(out, "  mileage:   {}", record.mileage);
    if !record.color.is_empty() {
        let _ = writeln!(out, "  color:     {}", record.color);
    }
    if !record.location.is_empty() {
        let _ = writeln!(out, "  location:  {}", record.location);
    }
    if let Some(date) = record.date_acquired {
        let _ = writeln!(out, "  acquired:  {date}");
    }
    let _ = writeln!(out, "  state:     {}", lifecycle_line(record));
    if let Some(reactivation) = &record.lifecycle.reactivation {
        let _ = writeln!(
            out,
            "  reactivated from {} by {} on {}",
            reactivation.from.as_str(),
            reactivation.by,
            reactivation.date.format("%Y-%m-%d")
        );
    }

    let _ = writeln!(
        out,
        "\nInspection ({:.0}%{})",
        compute_progress(record),
        if is_ready_for_sale(record) {
            ", ready for sale"
        } else {
            ""
        }
    );
    if record.status.is_empty() {
        let _ = writeln!(out, "  no sections tracked");
    }
    for (key, status) in record.status.iter() {
        let _ = writeln!(out, "  {:<14} {status}", key.label());
    }

    if !record.notes.is_empty() {
        let _ = writeln!(out, "\nNotes\n  {}", record.notes);
    }
    if !record.location_history.is_empty() {
        let _ = writeln!(out, "\nPrevious locations");
        for entry in &record.location_history {
            let _ = writeln!(
                out,
                "  {} {:<4} {}",
                entry.changed_at.format("%Y-%m-%d %H:%M"),
                entry.changed_by,
                entry.location
            );
        }
    }
    if !record.team_notes.is_empty() {
        let _ = writeln!(out, "\nTeam notes");
        for note in &record.team_notes {
            let _ = writeln!(out, "  {}", note_line(note));
        }
    }
    out
}

pub fn note_line(note: &TeamNote) -> String {
    format!(
        "{} {:<4} [{}]{} {}",
        note.timestamp.format("%Y-%m-%d %H:%M"),
        note.user_initials,
        note.category,
        if note.is_certified { " ✓" } else { "" },
        note.text
    )
}

fn lifecycle_line(record: &VehicleRecord) -> String {
    match &record.lifecycle.disposition {
        Disposition::Active => "active".to_string(),
        Disposition::Pending(info) => {
            let mut line = format!(
                "pending since {} ({})",
                info.date.format("%Y-%m-%d"),
                info.by
            );
            if let Some(notes) = &info.notes {
                let _ = write!(line, ": {notes}");
            }
            line
        }
        Disposition::Sold(info) => {
            let mut line = format!(
                "sold {} for {} ({})",
                info.date.format("%Y-%m-%d"),
                format_usd(info.price),
                info.by
            );
            if let Some(notes) = &info.notes {
                let _ = write!(line, ": {notes}");
            }
            line
        }
    }
}
