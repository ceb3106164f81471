use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::DateKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "KZN")]
    Kzn,
    #[serde(rename = "Gauteng")]
    Gauteng,
}

impl Region {
    /// Indicator order: KZN dots are drawn before Gauteng dots.
    pub const ALL: [Region; 2] = [Region::Kzn, Region::Gauteng];

    pub fn as_key(self) -> &'static str {
        match self {
            Region::Kzn => "KZN",
            Region::Gauteng => "Gauteng",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "KZN" => Some(Region::Kzn),
            "Gauteng" => Some(Region::Gauteng),
            _ => None,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::from_key(s.trim())
            .ok_or_else(|| anyhow!("unknown region: {s} (expected KZN or Gauteng)"))
    }
}

/// Region selector for views. `All` only exists here and is never stored on
/// an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Only(Region),
}

impl RegionFilter {
    pub fn as_key(self) -> &'static str {
        match self {
            RegionFilter::All => "All",
            RegionFilter::Only(region) => region.as_key(),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        if key == "All" {
            return Some(RegionFilter::All);
        }
        Region::from_key(key).map(RegionFilter::Only)
    }

    pub fn admits(self, region: Region) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Only(wanted) => wanted == region,
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for RegionFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RegionFilter::from_key(s.trim())
            .ok_or_else(|| anyhow!("unknown region filter: {s} (expected All, KZN or Gauteng)"))
    }
}

impl Serialize for RegionFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_key())
    }
}

impl<'de> Deserialize<'de> for RegionFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        RegionFilter::from_key(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown region filter: {raw}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,

    pub club: String,

    pub date: DateKey,

    pub region: Region,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(club: String, date: DateKey, region: Region) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            club,
            date,
            region,
            owner_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }

    pub fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) -> anyhow::Result<()> {
        if let Some(club) = patch.club {
            self.club = normalize_club(&club)?;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(region) = patch.region {
            self.region = region;
        }
        self.updated_at = Some(now);
        Ok(())
    }
}

/// What the event form hands over before an id is assigned.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub club: String,
    pub date: DateKey,
    pub region: Region,
    pub owner_id: Option<String>,
}

impl EventDraft {
    pub fn into_event(self, now: DateTime<Utc>) -> anyhow::Result<Event> {
        let club = normalize_club(&self.club)?;
        let mut event = Event::new(club, self.date, self.region);
        event.owner_id = self.owner_id;
        event.created_at = Some(now);
        event.updated_at = Some(now);
        Ok(event)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub club: Option<String>,
    pub date: Option<DateKey>,
    pub region: Option<Region>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.club.is_none() && self.date.is_none() && self.region.is_none()
    }
}

fn normalize_club(raw: &str) -> anyhow::Result<String> {
    let club = raw.trim();
    if club.is_empty() {
        bail!("club name must not be empty");
    }
    Ok(club.to_string())
}
