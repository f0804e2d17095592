use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::scheduler::ScheduleError;

/// Closed set of per-day assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Morning,
    Evening,
    Night,
    Workday,
    DayOff,
    Vacation,
}

impl ShiftType {
    /// True for the shifts that count as a working day.
    pub fn is_working(self) -> bool {
        matches!(
            self,
            ShiftType::Morning | ShiftType::Evening | ShiftType::Night | ShiftType::Workday
        )
    }

    /// The three shifts that must be covered every day.
    pub fn is_mandatory(self) -> bool {
        matches!(self, ShiftType::Morning | ShiftType::Evening | ShiftType::Night)
    }

    /// Start time `(hour, minute)`, MSK. Only meaningful for working shifts.
    pub fn start_time(self) -> (u32, u32) {
        match self {
            ShiftType::Morning => (8, 0),
            ShiftType::Evening => (15, 0),
            ShiftType::Night => (0, 0),
            _ => (9, 0),
        }
    }

    /// End time `(hour, minute)`, MSK. Evening ends at 00:00 the next day.
    pub fn end_time(self) -> (u32, u32) {
        match self {
            ShiftType::Morning => (17, 0),
            ShiftType::Evening => (0, 0),
            ShiftType::Night => (8, 0),
            _ => (18, 0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Evening => "evening",
            ShiftType::Night => "night",
            ShiftType::Workday => "workday",
            ShiftType::DayOff => "day_off",
            ShiftType::Vacation => "vacation",
        }
    }
}

impl std::fmt::Display for ShiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Flexible,
    #[serde(rename = "5/2")]
    FiveTwo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Moscow,
    Khabarovsk,
}

/// Inclusive vacation date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VacationPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl VacationPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if end < start {
            return Err("vacation end must not be before start".to_string());
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Roster member. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub city: City,
    pub schedule_type: ScheduleType,
    #[serde(default = "default_true")]
    pub on_duty: bool,
    #[serde(default)]
    pub always_on_duty: bool,
    #[serde(default)]
    pub morning_only: bool,
    #[serde(default)]
    pub evening_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vacations: Vec<VacationPeriod>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unavailable_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub max_morning_shifts: Option<u32>,
    #[serde(default)]
    pub max_evening_shifts: Option<u32>,
    #[serde(default)]
    pub max_night_shifts: Option<u32>,
    #[serde(default)]
    pub preferred_shift: Option<ShiftType>,
    #[serde(default = "default_workload")]
    pub workload_pct: u8,
    /// Weekday indices that are always off, 0 = Monday.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub days_off_weekly: BTreeSet<u8>,
    #[serde(default)]
    pub max_consecutive_working: Option<u32>,
    #[serde(default)]
    pub group: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_workload() -> u8 {
    100
}

impl Employee {
    pub fn is_on_vacation(&self, day: NaiveDate) -> bool {
        self.vacations.iter().any(|v| v.contains(day))
    }

    /// Unavailable: on vacation or manually blocked.
    pub fn is_blocked(&self, day: NaiveDate) -> bool {
        self.is_on_vacation(day) || self.unavailable_dates.contains(&day)
    }

    pub fn can_work_morning(&self) -> bool {
        !self.evening_only
    }

    pub fn can_work_evening(&self) -> bool {
        !self.morning_only
    }

    /// Duty employee that never takes a plain workday.
    pub fn duty_only(&self) -> bool {
        self.on_duty && (self.morning_only || self.evening_only || self.always_on_duty)
    }

    pub fn works_on_weekend(&self) -> bool {
        self.schedule_type == ScheduleType::Flexible
    }

    /// Per-shift monthly cap, if any.
    pub fn shift_cap(&self, shift: ShiftType) -> Option<u32> {
        match shift {
            ShiftType::Morning => self.max_morning_shifts,
            ShiftType::Evening => self.max_evening_shifts,
            ShiftType::Night => self.max_night_shifts,
            _ => None,
        }
    }

    /// True when the employee may ever hold the given duty shift.
    pub fn duty_shift_allowed(&self, shift: ShiftType) -> bool {
        if !self.on_duty {
            return false;
        }
        match shift {
            ShiftType::Morning => self.city == City::Moscow && self.can_work_morning(),
            ShiftType::Evening => self.city == City::Moscow && self.can_work_evening(),
            ShiftType::Night => self.city == City::Khabarovsk,
            _ => false,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("employee name cannot be empty".to_string());
        }
        if self.morning_only && self.evening_only {
            return Err(format!(
                "employee {:?}: morning_only and evening_only are mutually exclusive",
                self.name
            ));
        }
        if self.always_on_duty && self.city != City::Moscow {
            return Err(format!(
                "employee {:?}: always_on_duty is only valid for Moscow",
                self.name
            ));
        }
        if self.workload_pct == 0 || self.workload_pct > 100 {
            return Err(format!(
                "employee {:?}: workload_pct must be in 1..=100",
                self.name
            ));
        }
        for v in &self.vacations {
            if v.end < v.start {
                return Err(format!(
                    "employee {:?}: vacation end {} is before start {}",
                    self.name, v.end, v.start
                ));
            }
        }
        if let Some(d) = self.days_off_weekly.iter().find(|d| **d > 6) {
            return Err(format!(
                "employee {:?}: weekday index {} out of range 0..=6",
                self.name, d
            ));
        }
        if self.on_duty {
            let compatible = [ShiftType::Morning, ShiftType::Evening, ShiftType::Night]
                .into_iter()
                .any(|s| self.duty_shift_allowed(s));
            if !compatible {
                return Err(format!(
                    "employee {:?}: duty employee is not compatible with any mandatory shift",
                    self.name
                ));
            }
        }
        Ok(())
    }
}

/// Forced `(date, employee, shift)` assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedAssignment {
    pub date: NaiveDate,
    pub employee_name: String,
    pub shift: ShiftType,
}

/// Streak counters at the end of the previous month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryOverState {
    pub employee_name: String,
    #[serde(default)]
    pub consecutive_working: u32,
    #[serde(default)]
    pub consecutive_off: u32,
    #[serde(default)]
    pub last_shift: Option<ShiftType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub month: u32,
    pub year: i32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub employees: Vec<Employee>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pins: Vec<PinnedAssignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub carry_over: Vec<CarryOverState>,
}

fn default_seed() -> u64 {
    42
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

impl Config {
    pub fn find_employee(&self, name: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.name == name)
    }

    pub fn duty_count(&self, city: City) -> usize {
        self.employees
            .iter()
            .filter(|e| e.city == city && e.on_duty)
            .count()
    }

    /// Full pre-generation validation: roster coverage, employee flags, pins.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !(1..=12).contains(&self.month) {
            return Err(ScheduleError::InvalidRoster(
                "month must be in 1..=12".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for emp in &self.employees {
            emp.validate().map_err(ScheduleError::InvalidRoster)?;
            if !seen.insert(emp.name.as_str()) {
                return Err(ScheduleError::InvalidRoster(format!(
                    "duplicate employee name {:?}",
                    emp.name
                )));
            }
        }

        let moscow_duty: Vec<&Employee> = self
            .employees
            .iter()
            .filter(|e| e.city == City::Moscow && e.on_duty)
            .collect();
        let khabarovsk_duty = self.duty_count(City::Khabarovsk);

        if moscow_duty.len() < 4 {
            return Err(ScheduleError::InvalidRoster(format!(
                "not enough Moscow duty employees: {} (minimum 4)",
                moscow_duty.len()
            )));
        }
        if !moscow_duty.iter().any(|e| e.can_work_morning()) {
            return Err(ScheduleError::InvalidRoster(
                "no morning-capable Moscow duty employee".to_string(),
            ));
        }
        if !moscow_duty.iter().any(|e| e.can_work_evening()) {
            return Err(ScheduleError::InvalidRoster(
                "no evening-capable Moscow duty employee".to_string(),
            ));
        }
        if khabarovsk_duty < 2 {
            return Err(ScheduleError::InvalidRoster(format!(
                "not enough Khabarovsk duty employees: {khabarovsk_duty} (minimum 2)"
            )));
        }

        self.validate_pins()?;
        Ok(())
    }

    fn validate_pins(&self) -> Result<(), ScheduleError> {
        let mut per_day: BTreeMap<(NaiveDate, &str), ShiftType> = BTreeMap::new();
        for pin in &self.pins {
            let Some(emp) = self.find_employee(&pin.employee_name) else {
                return Err(ScheduleError::InvalidPin(format!(
                    "unknown employee {:?}",
                    pin.employee_name
                )));
            };
            if pin.date.year() != self.year || pin.date.month() != self.month {
                return Err(ScheduleError::InvalidPin(format!(
                    "pin for {} on {} is outside {:02}.{}",
                    pin.employee_name, pin.date, self.month, self.year
                )));
            }
            if per_day.insert((pin.date, emp.name.as_str()), pin.shift).is_some() {
                return Err(ScheduleError::InvalidPin(format!(
                    "employee {:?} has two pins on {}",
                    pin.employee_name, pin.date
                )));
            }
            if emp.is_blocked(pin.date) && pin.shift != ShiftType::Vacation {
                return Err(ScheduleError::InvalidPin(format!(
                    "employee {:?} is blocked on {} but pinned to {}",
                    pin.employee_name,
                    pin.date,
                    pin.shift.label()
                )));
            }
            let ok = match pin.shift {
                ShiftType::Morning | ShiftType::Evening | ShiftType::Night => {
                    emp.duty_shift_allowed(pin.shift)
                }
                ShiftType::Workday => !emp.duty_only(),
                ShiftType::DayOff | ShiftType::Vacation => true,
            };
            if !ok {
                return Err(ScheduleError::InvalidPin(format!(
                    "employee {:?} cannot hold {} (city or restriction mismatch)",
                    pin.employee_name,
                    pin.shift.label()
                )));
            }
        }
        Ok(())
    }
}

/// Non-fatal configuration review: hard errors plus advisory warnings.
pub fn collect_config_issues(config: &Config) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Err(err) = config.validate() {
        errors.push(err.to_string());
    }

    let month_days = crate::calendar::month_days(config.year, config.month);
    for emp in &config.employees {
        if emp.on_duty && !month_days.is_empty() && month_days.iter().all(|d| emp.is_blocked(*d)) {
            warnings.push(format!(
                "duty employee {:?} is blocked for the whole month",
                emp.name
            ));
        }
        if emp.workload_pct < 50 {
            warnings.push(format!(
                "employee {:?} has workload {}%, below half time",
                emp.name, emp.workload_pct
            ));
        }
    }

    let mut group_sizes: BTreeMap<&str, usize> = BTreeMap::new();
    for emp in &config.employees {
        if let Some(g) = emp.group.as_deref() {
            *group_sizes.entry(g).or_default() += 1;
        }
    }
    for (group, size) in group_sizes {
        if size == 1 {
            warnings.push(format!("group {group:?} has a single member"));
        }
    }

    (errors, warnings)
}

/// One calendar day of the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub morning: Vec<String>,
    #[serde(default)]
    pub evening: Vec<String>,
    #[serde(default)]
    pub night: Vec<String>,
    #[serde(default)]
    pub workday: Vec<String>,
    #[serde(default)]
    pub day_off: Vec<String>,
    #[serde(default)]
    pub vacation: Vec<String>,
}

impl DaySchedule {
    pub fn new(date: NaiveDate, is_holiday: bool) -> Self {
        Self {
            date,
            is_holiday,
            morning: Vec::new(),
            evening: Vec::new(),
            night: Vec::new(),
            workday: Vec::new(),
            day_off: Vec::new(),
            vacation: Vec::new(),
        }
    }

    pub fn all_assigned(&self) -> Vec<&str> {
        self.morning
            .iter()
            .chain(&self.evening)
            .chain(&self.night)
            .chain(&self.workday)
            .map(String::as_str)
            .collect()
    }

    /// All three mandatory shifts are covered.
    pub fn is_covered(&self) -> bool {
        !self.morning.is_empty() && !self.evening.is_empty() && !self.night.is_empty()
    }

    pub fn bucket(&self, shift: ShiftType) -> &[String] {
        match shift {
            ShiftType::Morning => &self.morning,
            ShiftType::Evening => &self.evening,
            ShiftType::Night => &self.night,
            ShiftType::Workday => &self.workday,
            ShiftType::DayOff => &self.day_off,
            ShiftType::Vacation => &self.vacation,
        }
    }

    pub fn bucket_mut(&mut self, shift: ShiftType) -> &mut Vec<String> {
        match shift {
            ShiftType::Morning => &mut self.morning,
            ShiftType::Evening => &mut self.evening,
            ShiftType::Night => &mut self.night,
            ShiftType::Workday => &mut self.workday,
            ShiftType::DayOff => &mut self.day_off,
            ShiftType::Vacation => &mut self.vacation,
        }
    }

    /// Shift held by `name` on this day, if any.
    pub fn shift_of(&self, name: &str) -> Option<ShiftType> {
        for shift in [
            ShiftType::Morning,
            ShiftType::Evening,
            ShiftType::Night,
            ShiftType::Workday,
            ShiftType::DayOff,
            ShiftType::Vacation,
        ] {
            if self.bucket(shift).iter().any(|n| n == name) {
                return Some(shift);
            }
        }
        None
    }
}

/// Complete monthly roster: the input echo plus one entry per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub config: Config,
    pub holidays: BTreeSet<NaiveDate>,
    pub days: Vec<DaySchedule>,
}
