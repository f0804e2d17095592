use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

use crate::model::{City, Schedule, ShiftType};

const ICS_SHIFTS: [ShiftType; 4] = [
    ShiftType::Morning,
    ShiftType::Evening,
    ShiftType::Night,
    ShiftType::Workday,
];

const KHABAROVSK_TZ: &str = "Asia/Vladivostok";
const KHABAROVSK_WORKDAY_START: (u32, u32) = (9, 0);
const KHABAROVSK_WORKDAY_END: (u32, u32) = (18, 0);

/// Write one iCalendar file per working shift type into `output_dir`.
///
/// Khabarovsk workdays are local-time events in `Asia/Vladivostok`; all other
/// events carry the configured timezone. Returns the created paths.
pub fn export_ics(schedule: &Schedule, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let msk_tz = schedule.config.timezone.as_str();
    let mut paths = Vec::with_capacity(ICS_SHIFTS.len());

    for shift in ICS_SHIFTS {
        let mut body = String::new();
        push_line(&mut body, "BEGIN:VCALENDAR");
        push_line(&mut body, "PRODID:-//Duty Roster Generator//RU");
        push_line(&mut body, "VERSION:2.0");
        push_line(&mut body, &format!("X-WR-CALNAME:Duty: {}", shift.label()));
        push_line(&mut body, "CALSCALE:GREGORIAN");
        push_line(&mut body, "METHOD:PUBLISH");

        for day in &schedule.days {
            let names = day.bucket(shift);
            for name in names {
                let khabarovsk_local = shift == ShiftType::Workday
                    && schedule
                        .config
                        .find_employee(name)
                        .map(|e| e.city == City::Khabarovsk)
                        .unwrap_or(false);
                let (tz, start, end, end_date) = if khabarovsk_local {
                    (
                        KHABAROVSK_TZ,
                        KHABAROVSK_WORKDAY_START,
                        KHABAROVSK_WORKDAY_END,
                        day.date,
                    )
                } else {
                    let end_date = if shift == ShiftType::Evening {
                        day.date.succ_opt().unwrap_or(day.date)
                    } else {
                        day.date
                    };
                    (msk_tz, shift.start_time(), shift.end_time(), end_date)
                };

                push_line(&mut body, "BEGIN:VEVENT");
                push_line(
                    &mut body,
                    &format!("SUMMARY:Duty {} — {}", shift.label(), name),
                );
                push_line(&mut body, &dt_line("DTSTART", tz, day.date, start));
                push_line(&mut body, &dt_line("DTEND", tz, end_date, end));
                push_line(
                    &mut body,
                    &format!(
                        "DESCRIPTION:Shift: {}\\nTimezone: {}\\nOn shift: {}",
                        shift.label(),
                        tz,
                        names.join(", ")
                    ),
                );
                push_line(
                    &mut body,
                    &format!(
                        "UID:{:04}{:02}{:02}-{}-{}@duty-roster",
                        day.date.year(),
                        day.date.month(),
                        day.date.day(),
                        shift.label(),
                        name
                    ),
                );
                push_line(&mut body, "END:VEVENT");
            }
        }
        push_line(&mut body, "END:VCALENDAR");

        let path = output_dir.join(format!("{}.ics", shift.label()));
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        paths.push(path);
    }

    Ok(paths)
}

fn dt_line(prop: &str, tz: &str, date: NaiveDate, (hour, minute): (u32, u32)) -> String {
    format!(
        "{prop};TZID={tz}:{:04}{:02}{:02}T{:02}{:02}00",
        date.year(),
        date.month(),
        date.day(),
        hour,
        minute
    )
}

fn push_line(body: &mut String, line: &str) {
    // RFC 5545 mandates CRLF line endings.
    let _ = write!(body, "{line}\r\n");
}
