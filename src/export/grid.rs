use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Datelike;
use csv::WriterBuilder;

use crate::model::{City, Schedule, ShiftType};
use crate::stats::{build_assignments, compute_stats};

/// One-letter cell codes of the schedule grid.
fn code(shift: ShiftType) -> &'static str {
    match shift {
        ShiftType::Morning => "M",
        ShiftType::Evening => "E",
        ShiftType::Night => "N",
        ShiftType::Workday => "W",
        ShiftType::DayOff => "-",
        ShiftType::Vacation => "V",
    }
}

/// Write the three-sheet workbook as three CSV files: the schedule grid, the
/// per-employee statistics and the legend. Returns the created paths.
pub fn export_csv_workbook(schedule: &Schedule, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    Ok(vec![
        write_grid(schedule, output_dir)?,
        write_stats(schedule, output_dir)?,
        write_legend(output_dir)?,
    ])
}

fn write_grid(schedule: &Schedule, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("schedule.csv");
    let mut w = WriterBuilder::new().from_path(&path)?;

    let mut header = vec!["employee".to_string(), "city".to_string()];
    header.extend(schedule.days.iter().map(|d| {
        format!(
            "{:02}{}",
            d.date.day(),
            if d.is_holiday { "*" } else { "" }
        )
    }));
    w.write_record(&header)?;

    let assignments = build_assignments(schedule);
    for emp in &schedule.config.employees {
        let mut row = vec![
            emp.name.clone(),
            match emp.city {
                City::Moscow => "Moscow".to_string(),
                City::Khabarovsk => "Khabarovsk".to_string(),
            },
        ];
        let month = assignments.get(&emp.name);
        for day in &schedule.days {
            let shift = month
                .and_then(|m| m.get(&day.date))
                .copied()
                .unwrap_or(ShiftType::DayOff);
            row.push(code(shift).to_string());
        }
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(path)
}

fn write_stats(schedule: &Schedule, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("stats.csv");
    let mut w = WriterBuilder::new().from_path(&path)?;
    w.write_record([
        "employee",
        "city",
        "total_working",
        "target",
        "target_delta",
        "morning",
        "evening",
        "night",
        "workday",
        "day_off",
        "vacation",
        "weekend_work",
        "holiday_work",
        "max_streak_work",
        "max_streak_rest",
        "isolated_off",
        "paired_off",
    ])?;
    for s in compute_stats(schedule) {
        w.write_record([
            s.name.as_str(),
            match s.city {
                City::Moscow => "Moscow",
                City::Khabarovsk => "Khabarovsk",
            },
            &s.total_working.to_string(),
            &s.target.to_string(),
            &s.target_delta.to_string(),
            &s.morning.to_string(),
            &s.evening.to_string(),
            &s.night.to_string(),
            &s.workday.to_string(),
            &s.day_off.to_string(),
            &s.vacation.to_string(),
            &s.weekend_work.to_string(),
            &s.holiday_work.to_string(),
            &s.max_streak_work.to_string(),
            &s.max_streak_rest.to_string(),
            &s.isolated_off.to_string(),
            &s.paired_off.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(path)
}

fn write_legend(output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join("legend.csv");
    let mut w = WriterBuilder::new().from_path(&path)?;
    w.write_record(["code", "shift", "time"])?;
    w.write_record(["M", "morning", "08:00-17:00 MSK"])?;
    w.write_record(["E", "evening", "15:00-00:00 MSK"])?;
    w.write_record(["N", "night", "00:00-08:00 MSK"])?;
    w.write_record(["W", "workday", "09:00-18:00 local"])?;
    w.write_record(["-", "day off", ""])?;
    w.write_record(["V", "vacation", ""])?;
    w.flush()?;
    Ok(path)
}
