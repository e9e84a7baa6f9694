// The Course -> Department -> Batch containment chain, each level optionally
// overriding fee fields. Resolution walks Batch -> Department -> Course and
// the first configured value wins; absence at every level means the fee is
// zero by design (nothing is due, not an error).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::student::{FeeTier, Mode};

/// Per-level fee overrides, one field per (mode, tier) axis so the
/// resolution matrix is exhaustive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub monthly_online: Option<Decimal>,
    pub monthly_offline: Option<Decimal>,
    pub sadka_online: Option<Decimal>,
    pub sadka_offline: Option<Decimal>,
    pub admission_online: Option<Decimal>,
    pub admission_offline: Option<Decimal>,
}

impl FeeSchedule {
    /// Monthly fee override for one (mode, tier) cell, if configured at
    /// this level.
    pub fn monthly(&self, mode: Mode, tier: FeeTier) -> Option<Decimal> {
        match (mode, tier) {
            (Mode::Online, FeeTier::General) => self.monthly_online,
            (Mode::Offline, FeeTier::General) => self.monthly_offline,
            (Mode::Online, FeeTier::Sadka) => self.sadka_online,
            (Mode::Offline, FeeTier::Sadka) => self.sadka_offline,
        }
    }

    /// Admission fee override. Tier does not affect the admission fee.
    pub fn admission(&self, mode: Mode) -> Option<Decimal> {
        match mode {
            Mode::Online => self.admission_online,
            Mode::Offline => self.admission_offline,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    /// Course length; bounds how far ahead a batch can be billed.
    pub duration_months: Option<u32>,
    pub fees: FeeSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub fees: FeeSchedule,
    /// None when the parent course has been removed; resolution then simply
    /// runs out of levels and degrades to zero.
    pub course: Option<Course>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub fees: FeeSchedule,
    pub department: Option<Department>,
}

impl Batch {
    pub fn course(&self) -> Option<&Course> {
        self.department.as_ref().and_then(|d| d.course.as_ref())
    }
}
